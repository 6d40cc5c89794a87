use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Tokens returned by a successful device-code poll or refresh exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds, relative to the moment of acquisition.
    pub expires_in: u64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl fmt::Debug for TokenBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBundle")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("id_token", &self.id_token.as_ref().map(|_| "[redacted]"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// A token bundle plus its absolute expiration, as held by the cache.
///
/// `expiration` is Unix epoch milliseconds, derived once when the entry is
/// written.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub token: TokenBundle,
    pub expiration: i64,
}

impl CacheEntry {
    /// Derive an entry acquired at `acquired_at_ms`.
    pub fn from_bundle(token: TokenBundle, acquired_at_ms: i64) -> Self {
        let lifetime_ms = lifetime_ms(token.expires_in);
        Self {
            expiration: acquired_at_ms.saturating_add(lifetime_ms),
            token,
        }
    }

    /// Derive an entry acquired now.
    pub fn acquired_now(token: TokenBundle) -> Self {
        Self::from_bundle(token, Utc::now().timestamp_millis())
    }

    pub fn access_token(&self) -> &str {
        &self.token.access_token
    }

    /// Whether a silent caller should refresh before using this entry.
    ///
    /// Compares against `now + expires_in`, not `now`: the token is treated
    /// as stale one full token lifetime before it actually expires. An entry
    /// written right after acquisition is therefore already stale, and the
    /// next silent call refreshes it.
    pub fn needs_refresh(&self, now_ms: i64) -> bool {
        self.expiration <= now_ms.saturating_add(lifetime_ms(self.token.expires_in))
    }

    /// Whether the access token has actually expired.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expiration <= now_ms
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.expiration).single()
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("token", &self.token)
            .field("expiration", &self.expiration)
            .finish()
    }
}

fn lifetime_ms(expires_in: u64) -> i64 {
    i64::try_from(expires_in)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000)
}
