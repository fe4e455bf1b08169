use std::path::PathBuf;

use serde::Deserialize;

/// Largest file accepted by default (5 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Local staging and acceptance limits
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    /// Directory files are staged in before remote transfer
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Multipart field carrying the file
    #[serde(default = "default_field")]
    pub field: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            field: default_field(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("uploads")
}

const fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

fn default_field() -> String {
    "image".to_owned()
}
