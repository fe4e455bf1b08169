//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;

use faultline_config::{
    AuthConfig, Config, CorsConfig, HealthConfig, ServerConfig, StorageConfig, TelemetryConfig, UploadConfig,
};
use faultline_core::RunMode;
use secrecy::SecretString;

/// Secret shared by the test server and [`super::tokens`]
pub const TOKEN_SECRET: &str = "integration-secret";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal configuration staging into `staging` and storing at `storage_url`
    pub fn new(staging: &Path, storage_url: &str) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                    ..ServerConfig::default()
                },
                auth: AuthConfig {
                    access_token_secret: SecretString::from(TOKEN_SECRET.to_owned()),
                    leeway_seconds: 0,
                    token_ttl_seconds: 900,
                },
                upload: UploadConfig {
                    directory: staging.to_path_buf(),
                    ..UploadConfig::default()
                },
                storage: StorageConfig {
                    cloud_name: "demo".to_owned(),
                    api_key: "key-123".to_owned(),
                    api_secret: SecretString::from("storage-secret".to_owned()),
                    folder: "uploads".to_owned(),
                    base_url: Some(storage_url.parse().expect("valid URL")),
                },
                telemetry: TelemetryConfig::default(),
            },
        }
    }

    /// Expose traces in failure envelopes
    pub fn development(mut self) -> Self {
        self.config.server.mode = RunMode::Development;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config.validate().expect("test config is valid");
        self.config
    }
}
