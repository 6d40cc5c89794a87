//! devflow: OAuth 2.0 Device Authorization Grant client
//!
//! Obtains access tokens for clients without a browser: the user is shown a
//! URL and a short code to enter on another device while the client polls
//! the token endpoint. Tokens are cached per client identity and refreshed
//! silently when possible.
//!
//! # Quick Start
//!
//! ```no_run
//! use devflow::prelude::*;
//!
//! # async fn example() -> devflow::error::Result<()> {
//! let config = DeviceFlowConfig::load(None)?;
//! let client = DeviceFlowClient::new(config.connection()?, config.options());
//! let token = client.acquire_token_silently().await?;
//! println!("{token}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;
pub mod transport;

#[cfg(feature = "cli")]
pub mod cli;
