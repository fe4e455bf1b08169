use std::net::SocketAddr;
use std::time::Duration;

use faultline_core::RunMode;
use serde::Deserialize;

use crate::{cors::CorsConfig, health::HealthConfig};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    /// `development` exposes traces to clients and silences failure logs
    #[serde(default)]
    pub mode: RunMode,
    /// Seconds to wait for in-flight requests after a shutdown signal
    #[serde(default = "default_grace")]
    pub shutdown_grace_seconds: u64,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub cors: Option<CorsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            mode: RunMode::default(),
            shutdown_grace_seconds: default_grace(),
            health: HealthConfig::default(),
            cors: None,
        }
    }
}

impl ServerConfig {
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

const fn default_grace() -> u64 {
    10
}
