use std::fmt;
use std::sync::Arc;

use crate::auth::store::CacheHooks;
use crate::transport::BodyEncoding;

/// Receives the one-time user instruction.
pub type OutputHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Runtime behaviour of a [`DeviceFlowClient`](crate::auth::DeviceFlowClient).
///
/// Defaults: no refresh token requested, JSON bodies, instruction written to
/// stdout, cache kept in process memory only.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use devflow::auth::FileCache;
/// use devflow::config::ClientOptions;
/// use devflow::transport::BodyEncoding;
///
/// let options = ClientOptions::new()
///     .with_refresh_token(true)
///     .with_encoding(BodyEncoding::Form)
///     .with_output(|message| eprintln!("{message}"))
///     .with_cache(Arc::new(FileCache::new_default()));
/// ```
#[derive(Clone, Default)]
pub struct ClientOptions {
    pub refresh_token: bool,
    pub encoding: BodyEncoding,
    output: Option<OutputHook>,
    cache: Option<Arc<dyn CacheHooks>>,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("refresh_token", &self.refresh_token)
            .field("encoding", &self.encoding)
            .field("output", &self.output.as_ref().map(|_| ".."))
            .field("cache", &self.cache.as_ref().map(|_| ".."))
            .finish()
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for `offline_access` so the server issues a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: bool) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    pub fn with_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_output(mut self, output: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.output = Some(Arc::new(output));
        self
    }

    pub fn with_cache(mut self, hooks: Arc<dyn CacheHooks>) -> Self {
        self.cache = Some(hooks);
        self
    }

    pub fn cache_hooks(&self) -> Option<Arc<dyn CacheHooks>> {
        self.cache.clone()
    }

    /// Deliver a message to the output hook, or stdout without one.
    pub fn emit(&self, message: &str) {
        match &self.output {
            Some(output) => output(message),
            None => println!("{message}"),
        }
    }
}
