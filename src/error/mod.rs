//! Error types for devflow.

pub mod oauth;

pub use oauth::OAuthErrorBody;

use thiserror::Error;

use crate::transport::TransportError;

/// Primary error type for all device-flow operations.
#[derive(Debug, Error)]
pub enum DeviceFlowError {
    /// The device-code endpoint rejected the request or returned a malformed body.
    #[error("Device code request failed (status {status_code}): {description}")]
    CodeRequestFailed { description: String, status_code: u16 },

    /// The interactive flow could not obtain a device code.
    #[error("Could not get code response: {0}")]
    CouldNotGetCode(#[source] Box<DeviceFlowError>),

    /// The token endpoint returned a non-pending error while polling.
    #[error("Token request failed (status {status_code}, code {code}): {description}")]
    TokenRequestFailed {
        description: String,
        status_code: u16,
        code: String,
    },

    /// The refresh-token exchange failed. Recovered internally by re-running
    /// the interactive flow.
    #[error("Refresh failed: {description}")]
    RefreshFailed { description: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Device flow cancelled")]
    Cancelled,

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Broad error category, so callers can tell expired codes, denied access
/// and transport problems apart without matching on raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    AccessDenied,
    ExpiredCode,
    SlowDown,
    Rejected,
    Cancelled,
    Cache,
    Configuration,
}

impl DeviceFlowError {
    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CouldNotGetCode(inner) => inner.category(),
            Self::Transport(_) => ErrorCategory::Transport,
            Self::TokenRequestFailed { code, .. } => match code.as_str() {
                "access_denied" => ErrorCategory::AccessDenied,
                "expired_token" => ErrorCategory::ExpiredCode,
                "slow_down" => ErrorCategory::SlowDown,
                _ => ErrorCategory::Rejected,
            },
            Self::CodeRequestFailed { .. } | Self::RefreshFailed { .. } => {
                ErrorCategory::Rejected
            }
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Cache(_) | Self::Io(_) | Self::Serialization(_) => ErrorCategory::Cache,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    /// HTTP status reported by the server, when the failure came from one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::CouldNotGetCode(inner) => inner.status_code(),
            Self::CodeRequestFailed { status_code, .. }
            | Self::TokenRequestFailed { status_code, .. } => Some(*status_code),
            Self::Transport(TransportError::InvalidBody { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Raw OAuth error code string (`access_denied`, `expired_token`, ...).
    pub fn oauth_code(&self) -> Option<&str> {
        match self {
            Self::CouldNotGetCode(inner) => inner.oauth_code(),
            Self::TokenRequestFailed { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }
}

impl From<std::io::Error> for DeviceFlowError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for DeviceFlowError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for DeviceFlowError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for DeviceFlowError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DeviceFlowError>;
