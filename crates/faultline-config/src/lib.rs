#![allow(clippy::must_use_candidate)]

pub mod auth;
pub mod cors;
mod env;
pub mod health;
mod loader;
pub mod server;
pub mod storage;
pub mod telemetry;
pub mod upload;

use serde::Deserialize;

pub use auth::*;
pub use cors::*;
pub use health::*;
pub use server::*;
pub use storage::*;
pub use telemetry::*;
pub use upload::*;

/// Top-level Faultline configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Listener, run mode and HTTP surface
    #[serde(default)]
    pub server: ServerConfig,
    /// Access token verification
    pub auth: AuthConfig,
    /// Local staging and acceptance limits for uploads
    #[serde(default)]
    pub upload: UploadConfig,
    /// Remote object store
    pub storage: StorageConfig,
    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
