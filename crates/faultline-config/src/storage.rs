use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use url::Url;

/// Remote object store credentials
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
    /// Logical folder every asset is placed in
    #[serde(default = "default_folder")]
    pub folder: String,
    /// API root override; an empty string means the public endpoint
    #[serde(default, deserialize_with = "blank_as_none")]
    pub base_url: Option<Url>,
}

fn default_folder() -> String {
    "uploads".to_owned()
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Url::parse(text).map(Some).map_err(serde::de::Error::custom),
    }
}
