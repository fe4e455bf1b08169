use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::File;

use crate::policy::sanitize_file_name;

/// Directory incoming files are written to before remote transfer
#[derive(Debug, Clone)]
pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    /// Create the directory if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created
    pub async fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Open a fresh file named `<millis>-<random>-<original name>`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created
    pub fn open(&self, original_name: &str) -> io::Result<(File, TempPath)> {
        let millis = chrono::Utc::now().timestamp_millis();

        let (file, path) = tempfile::Builder::new()
            .prefix(&format!("{millis}-"))
            .rand_bytes(9)
            .suffix(&format!("-{}", sanitize_file_name(original_name)))
            .tempfile_in(&self.dir)?
            .into_parts();

        Ok((File::from_std(file), path))
    }
}

/// File held in the staging directory
///
/// Owns its path: the file is removed when the value is dropped, so a staged
/// upload can never outlive the request that created it.
#[derive(Debug)]
pub struct StagedUpload {
    original_name: String,
    mime_type: String,
    size_bytes: u64,
    path: TempPath,
}

impl StagedUpload {
    pub(crate) const fn new(original_name: String, mime_type: String, size_bytes: u64, path: TempPath) -> Self {
        Self {
            original_name,
            mime_type,
            size_bytes,
            path,
        }
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn stored_path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Remove the local copy now
    ///
    /// Removal failures are logged; they never replace the outcome of the
    /// operation that triggered the cleanup.
    pub fn discard(self) {
        let path_display = self.path.display().to_string();
        if let Err(e) = self.path.close()
            && e.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!(path = %path_display, error = %e, "failed to remove staged upload");
        }
    }
}
