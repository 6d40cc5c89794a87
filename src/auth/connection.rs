/// Scope appended when the caller asks for a refresh token.
pub const OFFLINE_ACCESS: &str = "offline_access";

/// Endpoints and client identity for one authorization server.
///
/// # Example
/// ```no_run
/// use devflow::auth::Connection;
///
/// let connection = Connection {
///     token_url: "https://tenant.eu.auth0.com/oauth/token".to_string(),
///     code_url: "https://tenant.eu.auth0.com/oauth/device/code".to_string(),
///     client_id: "my-client".to_string(),
///     scopes: vec!["openid".to_string(), "profile".to_string()],
///     audience: "https://api.example.com".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub token_url: String,
    pub code_url: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub audience: String,
}

impl Connection {
    /// Cache key for this client.
    pub fn cache_key(&self) -> &str {
        &self.client_id
    }

    /// Space-joined `scope` parameter, with `offline_access` added (once)
    /// when `refresh_token` is set. The descriptor itself is left untouched.
    pub fn scope_param(&self, refresh_token: bool) -> String {
        let mut scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        if refresh_token && !scopes.contains(&OFFLINE_ACCESS) {
            scopes.push(OFFLINE_ACCESS);
        }
        scopes.join(" ")
    }
}
