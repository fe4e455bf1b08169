use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// Access token verification settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// HMAC secret the access tokens are signed with
    pub access_token_secret: SecretString,
    /// Clock skew tolerated when checking expiry, in seconds
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// Lifetime of tokens issued by the server, in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
}

impl AuthConfig {
    pub const fn leeway(&self) -> Duration {
        Duration::from_secs(self.leeway_seconds)
    }

    pub const fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }
}

const fn default_leeway() -> u64 {
    60
}

const fn default_token_ttl() -> u64 {
    15 * 60
}
