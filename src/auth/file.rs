use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::{CacheHooks, ClientCache};
use crate::error::DeviceFlowError;

const CACHE_FILE_NAME: &str = "token-cache.toml";
const CACHE_FILE_VERSION: u32 = 1;

/// Cache hooks backed by a TOML file.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use devflow::auth::{CacheStore, FileCache};
///
/// let store = CacheStore::with_hooks(Arc::new(FileCache::new_default()));
/// let cached = store.get("my-client")?;
/// # Ok::<(), devflow::error::DeviceFlowError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.devflow/token-cache.toml`.
    pub fn new_default() -> Self {
        Self::new(crate::config::default_dir().join(CACHE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(path: &Path) -> Result<(), DeviceFlowError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl CacheHooks for FileCache {
    fn before_cache_access(&self) -> Result<ClientCache, DeviceFlowError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ClientCache::new())
            }
            Err(err) => return Err(DeviceFlowError::Io(err.to_string())),
        };
        let file: CacheFile = toml::from_str(&raw)?;
        if file.version != CACHE_FILE_VERSION {
            return Err(DeviceFlowError::Cache(format!(
                "unsupported cache file version {} in {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(file.clients)
    }

    fn after_cache_access(&self, cache: &ClientCache) -> Result<(), DeviceFlowError> {
        Self::ensure_parent(&self.path)?;
        let file = CacheFile {
            version: CACHE_FILE_VERSION,
            saved_at: Utc::now(),
            clients: cache.clone(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&self.path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        tracing::debug!(path = %self.path.display(), clients = cache.len(), "Token cache written");
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    clients: ClientCache,
}
