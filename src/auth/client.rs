use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connection::Connection;
use super::device_code::{DeviceCodeAcquirer, DeviceCodeRecord};
use super::poller::{PollOutcome, TokenPoller};
use super::state::{FlowState, FlowTracker};
use super::store::CacheStore;
use super::token::{CacheEntry, TokenBundle};
use crate::config::ClientOptions;
use crate::error::DeviceFlowError;
use crate::transport::{ReqwestTransport, Transport, TransportError};

/// Device Authorization Grant client for one client identity.
///
/// Runs the interactive flow ([`acquire_token`](Self::acquire_token)) and
/// the cache/refresh shortcut ([`acquire_token_silently`](Self::acquire_token_silently)).
///
/// # Example
/// ```no_run
/// use devflow::auth::{Connection, DeviceFlowClient};
/// use devflow::config::ClientOptions;
///
/// # async fn example() -> devflow::error::Result<()> {
/// let client = DeviceFlowClient::new(
///     Connection {
///         token_url: "https://tenant.eu.auth0.com/oauth/token".to_string(),
///         code_url: "https://tenant.eu.auth0.com/oauth/device/code".to_string(),
///         client_id: "my-client".to_string(),
///         scopes: vec!["openid".to_string()],
///         audience: "https://api.example.com".to_string(),
///     },
///     ClientOptions::new().with_refresh_token(true),
/// );
/// let token = client.acquire_token().await?;
/// let again = client.acquire_token_silently().await?;
/// # Ok(())
/// # }
/// ```
pub struct DeviceFlowClient {
    connection: Arc<Connection>,
    options: ClientOptions,
    cache: CacheStore,
    acquirer: DeviceCodeAcquirer,
    poller: TokenPoller,
}

impl DeviceFlowClient {
    /// Client using the default reqwest transport.
    pub fn new(connection: Connection, options: ClientOptions) -> Self {
        Self::with_transport(connection, options, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(
        connection: Connection,
        options: ClientOptions,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let connection = Arc::new(connection);
        let cache = match options.cache_hooks() {
            Some(hooks) => CacheStore::with_hooks(hooks),
            None => CacheStore::new(),
        };
        let acquirer =
            DeviceCodeAcquirer::new(transport.clone(), connection.clone(), options.encoding);
        let poller = TokenPoller::new(transport, connection.clone(), options.encoding);
        Self {
            connection,
            options,
            cache,
            acquirer,
            poller,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn cache_store(&self) -> &CacheStore {
        &self.cache
    }

    /// Cache entry for this client, reloaded through the cache hooks.
    pub fn cached_entry(&self) -> Result<Option<CacheEntry>, DeviceFlowError> {
        self.cache.get(self.connection.cache_key())
    }

    /// Replace this client's cache entry and hand the mapping to the hooks.
    pub fn store_entry(&self, entry: CacheEntry) -> Result<(), DeviceFlowError> {
        self.cache.set(self.connection.cache_key(), entry)
    }

    /// Run the interactive device flow and return the access token.
    pub async fn acquire_token(&self) -> Result<String, DeviceFlowError> {
        self.acquire_token_with_cancel(CancellationToken::new()).await
    }

    /// Like [`acquire_token`](Self::acquire_token), abandoning the flow as
    /// soon as `cancel` fires.
    pub async fn acquire_token_with_cancel(
        &self,
        cancel: CancellationToken,
    ) -> Result<String, DeviceFlowError> {
        let mut flow = FlowTracker::new(self.connection.client_id.as_str());

        let requested = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DeviceFlowError::Cancelled),
            result = self.acquirer.request(self.options.refresh_token) => result,
        };
        let code = match requested {
            Ok(code) => code,
            Err(DeviceFlowError::Cancelled) => {
                flow.advance(FlowState::Failed);
                return Err(DeviceFlowError::Cancelled);
            }
            Err(error) => {
                flow.advance(FlowState::Failed);
                return Err(DeviceFlowError::CouldNotGetCode(Box::new(error)));
            }
        };

        flow.advance(FlowState::AwaitingUser);
        self.options.emit(&code.instruction());

        flow.advance(FlowState::Polling);
        self.poll_until_settled(&mut flow, &code, &cancel).await
    }

    /// Issue one poll per interval until a poll settles the flow.
    ///
    /// Each tick's request runs as its own task, so a slow request can still
    /// be in flight when the next tick fires. The first terminal outcome
    /// latches `flow`; everything still in flight is aborted and any later
    /// outcome is dropped.
    async fn poll_until_settled(
        &self,
        flow: &mut FlowTracker,
        code: &DeviceCodeRecord,
        cancel: &CancellationToken,
    ) -> Result<String, DeviceFlowError> {
        let period = code.poll_interval();
        let code_expires_at = code.expires_at(Utc::now());
        let mut ticker = interval_at(Instant::now() + period, period);
        let mut in_flight: JoinSet<Result<PollOutcome, DeviceFlowError>> = JoinSet::new();
        let mut attempts: u32 = 0;
        let mut expiry_logged = false;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    in_flight.abort_all();
                    flow.advance(FlowState::Failed);
                    info!(client_id = %self.connection.client_id, attempts, "Device flow cancelled");
                    return Err(DeviceFlowError::Cancelled);
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    let outcome = match joined {
                        Ok(outcome) => outcome,
                        Err(e) if e.is_cancelled() => continue,
                        Err(e) => Err(DeviceFlowError::Transport(TransportError::Request(
                            format!("poll task failed: {e}"),
                        ))),
                    };
                    match outcome {
                        Ok(PollOutcome::Pending) => continue,
                        Ok(PollOutcome::Authorized(token)) => {
                            if !flow.advance(FlowState::Succeeded) {
                                continue;
                            }
                            in_flight.abort_all();
                            info!(client_id = %self.connection.client_id, attempts, "Device flow authorized");
                            return self.store_bundle(token);
                        }
                        Err(error) => {
                            if !flow.advance(FlowState::Failed) {
                                continue;
                            }
                            in_flight.abort_all();
                            warn!(client_id = %self.connection.client_id, attempts, error = %error, "Device flow failed");
                            return Err(error);
                        }
                    }
                }
                _ = ticker.tick() => {
                    attempts += 1;
                    if !expiry_logged && Utc::now() >= code_expires_at {
                        expiry_logged = true;
                        warn!(
                            client_id = %self.connection.client_id,
                            "Device code lifetime elapsed; polling continues until the server rejects it"
                        );
                    }
                    debug!(client_id = %self.connection.client_id, attempt = attempts, "Polling token endpoint");
                    let poller = self.poller.clone();
                    let device_code = code.device_code.clone();
                    in_flight.spawn(async move { poller.poll(&device_code).await });
                }
            }
        }
    }

    /// Return a usable access token without prompting when possible.
    ///
    /// A cached token whose expiration lies more than one token lifetime
    /// ahead is returned as is. Otherwise the refresh token is exchanged;
    /// if that fails (or there is nothing cached) the interactive flow runs.
    pub async fn acquire_token_silently(&self) -> Result<String, DeviceFlowError> {
        self.acquire_token_silently_with_cancel(CancellationToken::new())
            .await
    }

    /// Like [`acquire_token_silently`](Self::acquire_token_silently); a fired
    /// `cancel` returns [`DeviceFlowError::Cancelled`] even mid-refresh.
    pub async fn acquire_token_silently_with_cancel(
        &self,
        cancel: CancellationToken,
    ) -> Result<String, DeviceFlowError> {
        if cancel.is_cancelled() {
            return Err(DeviceFlowError::Cancelled);
        }
        let now = Utc::now().timestamp_millis();
        let entry = self.cached_entry()?;
        match &entry {
            Some(entry) if !entry.needs_refresh(now) => {
                debug!(client_id = %self.connection.client_id, "Using cached access token");
                return Ok(entry.access_token().to_string());
            }
            Some(_) => debug!(client_id = %self.connection.client_id, "Cached token is stale"),
            None => debug!(client_id = %self.connection.client_id, "No cached token"),
        }

        let refreshed = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DeviceFlowError::Cancelled),
            result = self.refresh(entry.as_ref()) => result,
        };
        match refreshed {
            Ok(token) => self.store_bundle(token),
            Err(DeviceFlowError::Cancelled) => {
                info!(client_id = %self.connection.client_id, "Silent refresh cancelled");
                Err(DeviceFlowError::Cancelled)
            }
            Err(error) => {
                warn!(
                    client_id = %self.connection.client_id,
                    error = %error,
                    "Silent refresh failed; starting interactive device flow"
                );
                self.acquire_token_with_cancel(cancel).await
            }
        }
    }

    async fn refresh(&self, entry: Option<&CacheEntry>) -> Result<TokenBundle, DeviceFlowError> {
        let refresh_token = entry
            .and_then(|entry| entry.token.refresh_token.as_deref())
            .ok_or_else(|| DeviceFlowError::RefreshFailed {
                description: "no refresh token cached".to_string(),
            })?;
        let mut token = self.poller.refresh(refresh_token).await?;
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        Ok(token)
    }

    fn store_bundle(&self, token: TokenBundle) -> Result<String, DeviceFlowError> {
        let entry = CacheEntry::acquired_now(token);
        let access_token = entry.access_token().to_string();
        self.store_entry(entry)?;
        Ok(access_token)
    }
}
