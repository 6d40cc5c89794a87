use std::sync::Arc;

use super::connection::Connection;
use super::token::TokenBundle;
use crate::error::{DeviceFlowError, OAuthErrorBody};
use crate::transport::{BodyEncoding, RequestBody, Transport, TransportResponse};

pub const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
pub const REFRESH_TOKEN_GRANT: &str = "refresh_token";
const AUTHORIZATION_PENDING: &str = "authorization_pending";

/// Result of a single non-fatal poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The user has not finished yet; poll again on the next tick.
    Pending,
    Authorized(TokenBundle),
}

/// Token endpoint client: device-code polls and refresh exchanges.
#[derive(Clone)]
pub struct TokenPoller {
    transport: Arc<dyn Transport>,
    connection: Arc<Connection>,
    encoding: BodyEncoding,
}

impl TokenPoller {
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

    pub fn poll_body(&self, device_code: &str) -> RequestBody {
        RequestBody::new()
            .field("client_id", self.connection.client_id.as_str())
            .field("device_code", device_code)
            .field("grant_type", DEVICE_CODE_GRANT)
    }

    pub fn refresh_body(&self, refresh_token: &str) -> RequestBody {
        RequestBody::new()
            .field("client_id", self.connection.client_id.as_str())
            .field("grant_type", REFRESH_TOKEN_GRANT)
            .field("refresh_token", refresh_token)
    }

    /// Issue one device-code token request.
    ///
    /// `authorization_pending`, and a 2xx body with neither token nor error,
    /// are [`PollOutcome::Pending`]; every other server error is
    /// [`DeviceFlowError::TokenRequestFailed`].
    pub async fn poll(&self, device_code: &str) -> Result<PollOutcome, DeviceFlowError> {
        let body = self.poll_body(device_code);
        let resp = self
            .transport
            .post(&self.connection.token_url, &body, self.encoding)
            .await?;

        match classify(resp) {
            Ok(Some(token)) => Ok(PollOutcome::Authorized(token)),
            Ok(None) => {
                tracing::debug!("Token response carried no result yet");
                Ok(PollOutcome::Pending)
            }
            Err(rejection) if rejection.code == AUTHORIZATION_PENDING => {
                tracing::debug!(status = rejection.status_code, "Authorization pending");
                Ok(PollOutcome::Pending)
            }
            Err(rejection) => {
                tracing::warn!(
                    status = rejection.status_code,
                    code = %rejection.code,
                    "Device token request failed"
                );
                Err(rejection.into_token_error())
            }
        }
    }

    /// Exchange a refresh token for a new bundle.
    ///
    /// All failures, transport ones included, come back as
    /// [`DeviceFlowError::RefreshFailed`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenBundle, DeviceFlowError> {
        let body = self.refresh_body(refresh_token);
        let resp = self
            .transport
            .post(&self.connection.token_url, &body, self.encoding)
            .await
            .map_err(|e| DeviceFlowError::RefreshFailed {
                description: e.to_string(),
            })?;

        match classify(resp) {
            Ok(Some(token)) => Ok(token),
            Ok(None) => Err(DeviceFlowError::RefreshFailed {
                description: "token response missing access_token".to_string(),
            }),
            Err(rejection) => Err(DeviceFlowError::RefreshFailed {
                description: format!("{} ({})", rejection.description, rejection.code),
            }),
        }
    }
}

/// A token endpoint answer that carried no usable token.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rejection {
    description: String,
    status_code: u16,
    code: String,
}

impl Rejection {
    fn into_token_error(self) -> DeviceFlowError {
        DeviceFlowError::TokenRequestFailed {
            description: self.description,
            status_code: self.status_code,
            code: self.code,
        }
    }
}

/// Split a token endpoint response into a bundle, no result, or a rejection.
///
/// A body with `access_token` wins regardless of status; otherwise the
/// `error` field decides. A 2xx body with neither carries no result.
fn classify(resp: TransportResponse) -> Result<Option<TokenBundle>, Rejection> {
    let status = resp.status;
    if resp.data.get("access_token").is_some() {
        return serde_json::from_value::<TokenBundle>(resp.data)
            .map(Some)
            .map_err(|e| Rejection {
                description: format!("malformed token response: {e}"),
                status_code: status,
                code: "invalid_response".to_string(),
            });
    }

    let error = OAuthErrorBody::from_value(&resp.data);
    let description = error.describe(status);
    let code = match error.error {
        Some(code) => code,
        None if resp.is_success() => return Ok(None),
        None => "unknown_error".to_string(),
    };
    Err(Rejection {
        description,
        status_code: status,
        code,
    })
}
