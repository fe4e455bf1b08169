use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Remote object store failures
#[derive(Debug, thiserror::Error)]
pub enum RemoteStoreError {
    /// Could not reach the store
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Store answered with an error
    #[error("store rejected the request ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Message reported by the store
        message: String,
    },

    /// Local file could not be read
    #[error("failed to read staged file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid store url: {0}")]
    Url(#[from] url::ParseError),
}

/// Where and how an asset is stored
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub folder: String,
    /// Name reported to the store
    pub file_name: String,
}

/// Descriptor of a stored asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAsset {
    pub public_id: String,
    pub url: String,
    pub bytes: u64,
    pub format: Option<String>,
}

/// Remote object storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `path`
    async fn upload(&self, path: &Path, options: &UploadOptions) -> Result<RemoteAsset, RemoteStoreError>;

    /// Destroy an asset; an asset that is already gone is not an error
    async fn destroy(&self, public_id: &str) -> Result<(), RemoteStoreError>;
}
