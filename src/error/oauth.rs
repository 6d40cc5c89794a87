//! OAuth error bodies shared by the code and token endpoints.

use serde::Deserialize;
use serde_json::Value;

/// `{error, error_description}` as returned by OAuth endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl OAuthErrorBody {
    /// Extract the error fields from a response body. Non-object bodies and
    /// fields of the wrong type yield an empty error.
    pub fn from_value(data: &Value) -> Self {
        Self {
            error: string_field(data, "error"),
            error_description: string_field(data, "error_description"),
        }
    }

    /// Human-readable description: `error_description`, else `error`, else
    /// the HTTP status.
    pub fn describe(&self, status: u16) -> String {
        self.error_description
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| format!("request failed with status {status}"))
    }
}

fn string_field(data: &Value, name: &str) -> Option<String> {
    data.get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
