//! Configuration system (layered: code > env > config file).

pub mod options;

pub use options::{ClientOptions, OutputHook};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::connection::Connection;
use crate::auth::file::FileCache;
use crate::error::DeviceFlowError;
use crate::transport::BodyEncoding;

const CONFIG_FILE_NAME: &str = "config.toml";

/// File and environment configuration for one authorization server.
///
/// Resolution order:
/// 1. Explicit setters in code
/// 2. `DEVFLOW_*` environment variables (a `.env` file is loaded first)
/// 3. The TOML config file (`~/.devflow/config.toml` by default)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceFlowConfig {
    pub token_url: Option<String>,
    pub code_url: Option<String>,
    pub client_id: Option<String>,
    pub scopes: Vec<String>,
    pub audience: Option<String>,
    pub refresh_token: bool,
    pub encoding: BodyEncoding,
    pub cache_path: Option<PathBuf>,
}

impl DeviceFlowConfig {
    /// Read a TOML config file. A missing file yields the empty config.
    pub fn from_path(path: &Path) -> Result<Self, DeviceFlowError> {
        let raw = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(DeviceFlowError::Io(err.to_string())),
        };
        toml::from_str(&raw).map_err(|e| {
            DeviceFlowError::Configuration(format!("{}: {e}", path.display()))
        })
    }

    /// Config file (explicit path or the default one) overlaid with the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, DeviceFlowError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_dir().join(CONFIG_FILE_NAME));
        let mut config = Self::from_path(&path)?;
        config.apply_env(|key: &str| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), DeviceFlowError> {
        if let Some(url) = lookup("DEVFLOW_TOKEN_URL") {
            self.token_url = Some(url);
        }
        if let Some(url) = lookup("DEVFLOW_CODE_URL") {
            self.code_url = Some(url);
        }
        if let Some(client_id) = lookup("DEVFLOW_CLIENT_ID") {
            self.client_id = Some(client_id);
        }
        if let Some(scopes) = lookup("DEVFLOW_SCOPES") {
            self.scopes = split_scopes(&scopes);
        }
        if let Some(audience) = lookup("DEVFLOW_AUDIENCE") {
            self.audience = Some(audience);
        }
        if let Some(flag) = lookup("DEVFLOW_REFRESH_TOKEN") {
            self.refresh_token = parse_flag(&flag)?;
        }
        if let Some(encoding) = lookup("DEVFLOW_ENCODING") {
            self.encoding = parse_encoding(&encoding)?;
        }
        if let Some(path) = lookup("DEVFLOW_CACHE_PATH") {
            self.cache_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn set_client_id(&mut self, client_id: impl Into<String>) {
        self.client_id = Some(client_id.into());
    }

    pub fn set_scopes(&mut self, scopes: Vec<String>) {
        self.scopes = scopes;
    }

    /// Build the connection descriptor, failing on missing required values.
    pub fn connection(&self) -> Result<Connection, DeviceFlowError> {
        Ok(Connection {
            token_url: required(&self.token_url, "token_url")?,
            code_url: required(&self.code_url, "code_url")?,
            client_id: required(&self.client_id, "client_id")?,
            scopes: self.scopes.clone(),
            audience: self.audience.clone().unwrap_or_default(),
        })
    }

    pub fn cache(&self) -> FileCache {
        match &self.cache_path {
            Some(path) => FileCache::new(path.clone()),
            None => FileCache::new_default(),
        }
    }

    /// Client options carrying this config's flags and a file-backed cache.
    pub fn options(&self) -> ClientOptions {
        ClientOptions::new()
            .with_refresh_token(self.refresh_token)
            .with_encoding(self.encoding)
            .with_cache(Arc::new(self.cache()))
    }
}

/// `~/.devflow`, or `.devflow` when no home directory is known.
pub fn default_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".devflow"))
        .unwrap_or_else(|| PathBuf::from(".devflow"))
}

fn required(value: &Option<String>, name: &str) -> Result<String, DeviceFlowError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DeviceFlowError::Configuration(format!("missing {name}")))
}

fn split_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> Result<bool, DeviceFlowError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(DeviceFlowError::Configuration(format!(
            "DEVFLOW_REFRESH_TOKEN: expected a boolean, got {other}"
        ))),
    }
}

fn parse_encoding(raw: &str) -> Result<BodyEncoding, DeviceFlowError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(BodyEncoding::Json),
        "form" | "params" => Ok(BodyEncoding::Form),
        other => Err(DeviceFlowError::Configuration(format!(
            "DEVFLOW_ENCODING: expected json or form, got {other}"
        ))),
    }
}
