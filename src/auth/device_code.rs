use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::connection::Connection;
use crate::error::{DeviceFlowError, OAuthErrorBody};
use crate::transport::{BodyEncoding, RequestBody, Transport};

/// Device and user codes issued by the device-code endpoint.
///
/// `device_code` is a bearer capability; the `Debug` impl redacts it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceCodeRecord {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

/// Polling interval when the server omits one (RFC 8628, section 3.2).
fn default_interval() -> u64 {
    5
}

impl DeviceCodeRecord {
    /// The one line shown to the user.
    pub fn instruction(&self) -> String {
        match &self.verification_uri_complete {
            Some(complete) => format!("Please visit {complete} and confirm the request."),
            None => format!(
                "Please visit {} and enter the code {}",
                self.verification_uri, self.user_code
            ),
        }
    }

    /// Time between polls; never zero.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }

    /// When the device code stops being valid, counted from `issued_at`.
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        i64::try_from(self.expires_in)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl fmt::Debug for DeviceCodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCodeRecord")
            .field("device_code", &"[redacted]")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("verification_uri_complete", &self.verification_uri_complete)
            .field("expires_in", &self.expires_in)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Requests device codes from the authorization server.
#[derive(Clone)]
pub struct DeviceCodeAcquirer {
    transport: Arc<dyn Transport>,
    connection: Arc<Connection>,
    encoding: BodyEncoding,
}

impl DeviceCodeAcquirer {
    pub fn new(
        transport: Arc<dyn Transport>,
        connection: Arc<Connection>,
        encoding: BodyEncoding,
    ) -> Self {
        Self {
            transport,
            connection,
            encoding,
        }
    }

    pub fn request_body(&self, refresh_token: bool) -> RequestBody {
        RequestBody::new()
            .field("client_id", self.connection.client_id.as_str())
            .field("scope", self.connection.scope_param(refresh_token))
            .field("audience", self.connection.audience.as_str())
    }

    /// Issue one request to the code endpoint.
    ///
    /// Transport failures are returned as [`DeviceFlowError::Transport`];
    /// anything the server answered with is a
    /// [`DeviceFlowError::CodeRequestFailed`].
    pub async fn request(&self, refresh_token: bool) -> Result<DeviceCodeRecord, DeviceFlowError> {
        let body = self.request_body(refresh_token);
        let resp = self
            .transport
            .post(&self.connection.code_url, &body, self.encoding)
            .await?;

        if !resp.is_success() {
            let error = OAuthErrorBody::from_value(&resp.data);
            tracing::warn!(
                status = resp.status,
                error = error.error.as_deref().unwrap_or("unknown"),
                "Device code request rejected"
            );
            return Err(DeviceFlowError::CodeRequestFailed {
                description: error.describe(resp.status),
                status_code: resp.status,
            });
        }

        let record: DeviceCodeRecord =
            serde_json::from_value(resp.data).map_err(|e| DeviceFlowError::CodeRequestFailed {
                description: format!("malformed device code response: {e}"),
                status_code: resp.status,
            })?;
        tracing::debug!(
            user_code = %record.user_code,
            interval = record.interval,
            expires_in = record.expires_in,
            "Device code issued"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(complete: Option<&str>) -> DeviceCodeRecord {
        DeviceCodeRecord {
            device_code: "secret-device-code".to_string(),
            user_code: "WDJB-MJHT".to_string(),
            verification_uri: "https://example.com/device".to_string(),
            verification_uri_complete: complete.map(str::to_string),
            expires_in: 600,
            interval: 5,
        }
    }

    #[test]
    fn instruction_prefers_complete_uri() {
        let message = record(Some("https://example.com/device?user_code=WDJB-MJHT")).instruction();
        assert_eq!(
            message,
            "Please visit https://example.com/device?user_code=WDJB-MJHT and confirm the request."
        );
    }

    #[test]
    fn instruction_composes_uri_and_user_code() {
        assert_eq!(
            record(None).instruction(),
            "Please visit https://example.com/device and enter the code WDJB-MJHT"
        );
    }

    #[test]
    fn debug_never_prints_device_code() {
        let rendered = format!("{:?}", record(None));
        assert!(!rendered.contains("secret-device-code"));
        assert!(rendered.contains("WDJB-MJHT"));
    }

    #[test]
    fn expires_at_counts_from_issue_time() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let expires = record(None).expires_at(issued);
        assert_eq!(expires, Utc.with_ymd_and_hms(2024, 1, 1, 0, 10, 0).unwrap());
        assert_eq!(record(None).poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn missing_interval_defaults_and_zero_is_clamped() {
        let parsed: DeviceCodeRecord = serde_json::from_value(serde_json::json!({
            "device_code": "D1",
            "user_code": "U1",
            "verification_uri": "https://x/d",
            "expires_in": 600
        }))
        .unwrap();
        assert_eq!(parsed.interval, 5);

        let zero = DeviceCodeRecord {
            interval: 0,
            ..record(None)
        };
        assert_eq!(zero.poll_interval(), Duration::from_secs(1));
    }
}
