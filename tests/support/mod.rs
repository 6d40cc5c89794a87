#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use devflow::auth::{CacheEntry, CacheHooks, ClientCache, Connection, DeviceFlowClient, TokenBundle};
use devflow::config::ClientOptions;
use devflow::error::DeviceFlowError;
use devflow::transport::{BodyEncoding, RequestBody, Transport, TransportError, TransportResponse};
use serde_json::{json, Value};

pub const CODE_URL: &str = "https://auth.test/oauth/device/code";
pub const TOKEN_URL: &str = "https://auth.test/oauth/token";
pub const CLIENT_ID: &str = "cli-client";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub body: RequestBody,
    pub encoding: BodyEncoding,
}

struct Scripted {
    response: Result<TransportResponse, TransportError>,
    delay: Duration,
}

/// Transport answering from per-URL queues, in the order requests are issued.
#[derive(Default)]
pub struct ScriptedTransport {
    queues: Mutex<HashMap<String, VecDeque<Scripted>>>,
    fallbacks: Mutex<HashMap<String, TransportResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn enqueue(&self, url: &str, scripted: Scripted) -> &Self {
        self.queues
            .lock()
            .expect("queue lock poisoned")
            .entry(url.to_string())
            .or_default()
            .push_back(scripted);
        self
    }

    pub fn push(&self, url: &str, status: u16, data: Value) -> &Self {
        self.push_delayed(url, status, data, Duration::ZERO)
    }

    pub fn push_delayed(&self, url: &str, status: u16, data: Value, delay: Duration) -> &Self {
        self.enqueue(
            url,
            Scripted {
                response: Ok(TransportResponse::new(status, data)),
                delay,
            },
        )
    }

    pub fn push_error(&self, url: &str, error: TransportError) -> &Self {
        self.enqueue(
            url,
            Scripted {
                response: Err(error),
                delay: Duration::ZERO,
            },
        )
    }

    /// Response used once the queue for `url` is empty.
    pub fn fallback(&self, url: &str, status: u16, data: Value) -> &Self {
        self.fallbacks
            .lock()
            .expect("fallback lock poisoned")
            .insert(url.to_string(), TransportResponse::new(status, data));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request lock poisoned").clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url == url)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(
        &self,
        url: &str,
        body: &RequestBody,
        encoding: BodyEncoding,
    ) -> Result<TransportResponse, TransportError> {
        self.requests
            .lock()
            .expect("request lock poisoned")
            .push(RecordedRequest {
                url: url.to_string(),
                body: body.clone(),
                encoding,
            });

        let scripted = self
            .queues
            .lock()
            .expect("queue lock poisoned")
            .get_mut(url)
            .and_then(VecDeque::pop_front);
        let scripted = match scripted {
            Some(scripted) => scripted,
            None => match self.fallbacks.lock().expect("fallback lock poisoned").get(url) {
                Some(response) => Scripted {
                    response: Ok(response.clone()),
                    delay: Duration::ZERO,
                },
                None => {
                    return Err(TransportError::Request(format!(
                        "no scripted response for {url}"
                    )))
                }
            },
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.response
    }
}

/// Externalized cache kept in memory, counting hook calls.
#[derive(Default)]
pub struct MemoryCacheHooks {
    cache: Mutex<ClientCache>,
    reads: Mutex<usize>,
    writes: Mutex<Vec<ClientCache>>,
}

impl MemoryCacheHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, client_id: &str, entry: CacheEntry) {
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .insert(client_id.to_string(), entry);
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock().expect("cache lock poisoned")
    }

    pub fn writes(&self) -> Vec<ClientCache> {
        self.writes.lock().expect("cache lock poisoned").clone()
    }
}

impl CacheHooks for MemoryCacheHooks {
    fn before_cache_access(&self) -> Result<ClientCache, DeviceFlowError> {
        *self.reads.lock().expect("cache lock poisoned") += 1;
        Ok(self.cache.lock().expect("cache lock poisoned").clone())
    }

    fn after_cache_access(&self, cache: &ClientCache) -> Result<(), DeviceFlowError> {
        self.writes
            .lock()
            .expect("cache lock poisoned")
            .push(cache.clone());
        *self.cache.lock().expect("cache lock poisoned") = cache.clone();
        Ok(())
    }
}

/// Collects everything sent to the output hook.
#[derive(Clone, Default)]
pub struct OutputSink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl OutputSink {
    pub fn attach(&self, options: ClientOptions) -> ClientOptions {
        let messages = self.messages.clone();
        options.with_output(move |message| {
            messages
                .lock()
                .expect("output lock poisoned")
                .push(message.to_string())
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("output lock poisoned").clone()
    }
}

pub fn connection() -> Connection {
    Connection {
        token_url: TOKEN_URL.to_string(),
        code_url: CODE_URL.to_string(),
        client_id: CLIENT_ID.to_string(),
        scopes: vec!["openid".to_string(), "profile".to_string()],
        audience: "https://api.test".to_string(),
    }
}

pub fn client(transport: &Arc<ScriptedTransport>, options: ClientOptions) -> DeviceFlowClient {
    DeviceFlowClient::with_transport(connection(), options, transport.clone())
}

pub fn device_code_body(interval: u64) -> Value {
    json!({
        "device_code": "D1",
        "user_code": "U1",
        "verification_uri": "https://x/d",
        "expires_in": 600,
        "interval": interval
    })
}

pub fn token_body(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "expires_in": 3600,
        "id_token": "I1",
        "token_type": "Bearer"
    })
}

pub fn error_body(code: &str) -> Value {
    json!({ "error": code, "error_description": format!("{code} reported by server") })
}

pub fn pending_body() -> Value {
    json!({ "error": "authorization_pending" })
}

pub fn bundle(access_token: &str, refresh_token: Option<&str>) -> TokenBundle {
    TokenBundle {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(str::to_string),
        id_token: Some("I0".to_string()),
        token_type: "Bearer".to_string(),
        expires_in: 3600,
    }
}
