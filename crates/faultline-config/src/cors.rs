use std::time::Duration;

use serde::Deserialize;

/// Cross-origin access for browser clients
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// `"*"`, a single origin, or a list of origins
    #[serde(default)]
    pub origins: Origins,
    /// Send `Access-Control-Allow-Credentials: true`
    #[serde(default)]
    pub credentials: bool,
    /// Preflight cache lifetime in seconds
    #[serde(default)]
    pub max_age: Option<u64>,
}

impl CorsConfig {
    pub fn max_age_duration(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }
}

/// Allowed request origins
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawOrigins")]
pub enum Origins {
    #[default]
    Any,
    List(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOrigins {
    One(String),
    Many(Vec<String>),
}

impl From<RawOrigins> for Origins {
    fn from(raw: RawOrigins) -> Self {
        let values = match raw {
            RawOrigins::One(value) => vec![value],
            RawOrigins::Many(values) => values,
        };

        if values.iter().any(|value| value == "*") {
            Self::Any
        } else {
            Self::List(values)
        }
    }
}
