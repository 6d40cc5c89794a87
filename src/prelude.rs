//! Convenience re-exports for common use.

pub use crate::auth::{CacheEntry, CacheHooks, Connection, DeviceFlowClient, FileCache, TokenBundle};
pub use crate::config::{ClientOptions, DeviceFlowConfig};
pub use crate::error::{DeviceFlowError, ErrorCategory, Result};
pub use crate::transport::{BodyEncoding, Transport};
