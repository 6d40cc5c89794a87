use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::token::CacheEntry;
use crate::error::DeviceFlowError;

/// Full cache mapping: client identifier → cache entry.
pub type ClientCache = HashMap<String, CacheEntry>;

/// Externalization hooks for the cache.
///
/// `before_cache_access` supplies a full fresh copy before every read and
/// before every write; `after_cache_access` receives the full mapping after
/// every write.
pub trait CacheHooks: Send + Sync {
    fn before_cache_access(&self) -> Result<ClientCache, DeviceFlowError>;
    fn after_cache_access(&self, cache: &ClientCache) -> Result<(), DeviceFlowError>;
}

/// Per-client token cache, in memory unless hooks are attached.
#[derive(Default)]
pub struct CacheStore {
    entries: Mutex<ClientCache>,
    hooks: Option<Arc<dyn CacheHooks>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hooks(hooks: Arc<dyn CacheHooks>) -> Self {
        Self {
            entries: Mutex::new(ClientCache::new()),
            hooks: Some(hooks),
        }
    }

    pub fn is_externalized(&self) -> bool {
        self.hooks.is_some()
    }

    pub fn get(&self, client_id: &str) -> Result<Option<CacheEntry>, DeviceFlowError> {
        let mut entries = self.lock()?;
        self.reload(&mut entries)?;
        Ok(entries.get(client_id).cloned())
    }

    pub fn set(&self, client_id: &str, entry: CacheEntry) -> Result<(), DeviceFlowError> {
        let mut entries = self.lock()?;
        self.reload(&mut entries)?;
        entries.insert(client_id.to_string(), entry);
        self.persist(&entries)
    }

    /// Drop the entry for `client_id`. Returns whether one existed.
    pub fn remove(&self, client_id: &str) -> Result<bool, DeviceFlowError> {
        let mut entries = self.lock()?;
        self.reload(&mut entries)?;
        let removed = entries.remove(client_id).is_some();
        if removed {
            self.persist(&entries)?;
        }
        Ok(removed)
    }

    /// Copy of the full mapping.
    pub fn snapshot(&self) -> Result<ClientCache, DeviceFlowError> {
        let mut entries = self.lock()?;
        self.reload(&mut entries)?;
        Ok(entries.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ClientCache>, DeviceFlowError> {
        self.entries
            .lock()
            .map_err(|_| DeviceFlowError::Cache("cache lock poisoned".to_string()))
    }

    fn reload(&self, entries: &mut ClientCache) -> Result<(), DeviceFlowError> {
        if let Some(hooks) = &self.hooks {
            *entries = hooks.before_cache_access()?;
        }
        Ok(())
    }

    fn persist(&self, entries: &ClientCache) -> Result<(), DeviceFlowError> {
        if let Some(hooks) = &self.hooks {
            hooks.after_cache_access(entries)?;
        }
        Ok(())
    }
}
