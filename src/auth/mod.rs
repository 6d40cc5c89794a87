//! OAuth device authorization flow, token cache, and silent refresh.

pub mod client;
pub mod connection;
pub mod device_code;
pub mod file;
pub mod poller;
pub mod state;
pub mod store;
pub mod token;

pub use client::DeviceFlowClient;
pub use connection::Connection;
pub use device_code::{DeviceCodeAcquirer, DeviceCodeRecord};
pub use file::FileCache;
pub use poller::{PollOutcome, TokenPoller};
pub use state::{FlowState, FlowTracker};
pub use store::{CacheHooks, CacheStore, ClientCache};
pub use token::{CacheEntry, TokenBundle};
