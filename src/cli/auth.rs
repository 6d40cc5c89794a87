//! CLI handlers for login, token, status, and logout.

use std::path::Path;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::auth::DeviceFlowClient;
use crate::config::DeviceFlowConfig;

fn build_client(config_path: Option<&Path>) -> Result<DeviceFlowClient, Box<dyn std::error::Error>> {
    let config = DeviceFlowConfig::load(config_path)?;
    let options = config
        .options()
        .with_output(|message| eprintln!("🔗 {message}"));
    Ok(DeviceFlowClient::new(config.connection()?, options))
}

/// Cancel the returned token on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    cancel
}

/// Handle `devflow login`.
pub async fn handle_login(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(config_path)?;
    eprintln!("⏳ Waiting for authorization...");
    client.acquire_token_with_cancel(cancel_on_ctrl_c()).await?;
    eprintln!("✅ Login successful for {}", client.connection().client_id);
    Ok(())
}

/// Handle `devflow token`.
pub async fn handle_token(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(config_path)?;
    let token = client
        .acquire_token_silently_with_cancel(cancel_on_ctrl_c())
        .await?;
    println!("{token}");
    Ok(())
}

/// Handle `devflow status`.
pub async fn handle_status(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(config_path)?;
    let client_id = &client.connection().client_id;

    match client.cached_entry()? {
        Some(entry) => {
            let now = Utc::now().timestamp_millis();
            let expires = entry
                .expires_at()
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let status = if entry.is_expired(now) {
                format!("⚠️  Token expired at {expires}")
            } else {
                format!("✅ Logged in (expires {expires})")
            };
            let refresh = if entry.token.refresh_token.is_some() {
                "available"
            } else {
                "none"
            };
            println!("  {client_id}: {status}");
            println!("  refresh token: {refresh}");
        }
        None => println!("  {client_id}: ❌ Not logged in"),
    }
    Ok(())
}

/// Handle `devflow logout`.
pub async fn handle_logout(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(config_path)?;
    let client_id = client.connection().client_id.clone();
    if client.cache_store().remove(&client_id)? {
        println!("✅ Removed cached token for {client_id}");
    } else {
        println!("ℹ️  No cached token for {client_id}");
    }
    Ok(())
}
