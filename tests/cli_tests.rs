#![cfg(feature = "cli")]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use devflow::auth::{CacheEntry, CacheStore, FileCache, TokenBundle};
use devflow::cli::auth::{handle_logout, handle_status};
use tempfile::TempDir;

fn write_config(dir: &Path, client_id: Option<&str>) -> (PathBuf, PathBuf) {
    let cache_path = dir.join("token-cache.toml");
    let config_path = dir.join("config.toml");
    let mut raw = format!(
        "token_url = \"https://auth.test/oauth/token\"\n\
         code_url = \"https://auth.test/oauth/device/code\"\n\
         cache_path = '{}'\n",
        cache_path.display()
    );
    if let Some(client_id) = client_id {
        raw.push_str(&format!("client_id = \"{client_id}\"\n"));
    }
    fs::write(&config_path, raw).unwrap();
    (config_path, cache_path)
}

fn file_store(cache_path: &Path) -> CacheStore {
    CacheStore::with_hooks(Arc::new(FileCache::new(cache_path)))
}

fn entry(access_token: &str) -> CacheEntry {
    CacheEntry::acquired_now(TokenBundle {
        access_token: access_token.to_string(),
        refresh_token: Some("R1".to_string()),
        id_token: None,
        token_type: "Bearer".to_string(),
        expires_in: 3600,
    })
}

#[tokio::test]
async fn status_without_cached_token() {
    let dir = TempDir::new().unwrap();
    let (config_path, cache_path) = write_config(dir.path(), Some("cli-client"));

    handle_status(Some(&config_path)).await.expect("status");

    assert!(!cache_path.exists());
}

#[tokio::test]
async fn status_reads_file_cache() {
    let dir = TempDir::new().unwrap();
    let (config_path, cache_path) = write_config(dir.path(), Some("cli-client"));
    file_store(&cache_path).set("cli-client", entry("A1")).unwrap();

    handle_status(Some(&config_path)).await.expect("status");

    let cached = file_store(&cache_path).get("cli-client").unwrap();
    assert_eq!(cached.expect("entry").access_token(), "A1");
}

#[tokio::test]
async fn status_requires_client_id() {
    let dir = TempDir::new().unwrap();
    let (config_path, _) = write_config(dir.path(), None);

    let err = handle_status(Some(&config_path))
        .await
        .expect_err("missing client id");

    assert!(err.to_string().contains("client_id"));
}

#[tokio::test]
async fn logout_drops_only_the_configured_client() {
    let dir = TempDir::new().unwrap();
    let (config_path, cache_path) = write_config(dir.path(), Some("cli-client"));
    let store = file_store(&cache_path);
    store.set("cli-client", entry("A1")).unwrap();
    store.set("other-client", entry("B1")).unwrap();

    handle_logout(Some(&config_path)).await.expect("logout");

    let remaining = file_store(&cache_path).snapshot().unwrap();
    assert!(!remaining.contains_key("cli-client"));
    assert_eq!(remaining["other-client"].access_token(), "B1");
    assert!(remaining["other-client"].expiration > Utc::now().timestamp_millis());

    // Logging out again is a no-op.
    handle_logout(Some(&config_path)).await.expect("second logout");
    assert_eq!(file_store(&cache_path).snapshot().unwrap().len(), 1);
}
