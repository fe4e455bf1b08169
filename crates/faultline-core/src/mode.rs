use serde::Deserialize;

/// Deployment mode of the running server
///
/// Traces are only ever sent to clients in development mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

impl RunMode {
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn exposes_traces(self) -> bool {
        self.is_development()
    }
}
