use std::sync::Arc;

use axum::extract::Multipart;
use faultline_config::{StorageConfig, UploadConfig};
use faultline_core::{ApiError, Failure, Unclassified};

use crate::multipart::stage_file;
use crate::policy::AcceptancePolicy;
use crate::staging::{StagedUpload, Staging};
use crate::store::{ObjectStore, RemoteAsset, UploadOptions};

/// Staging, remote transfer and cleanup of uploaded images
///
/// Cheap to clone; the staging directory and store client are shared by all
/// requests, each request only touching the file it created.
#[derive(Clone)]
pub struct UploadPipeline {
    policy: AcceptancePolicy,
    staging: Staging,
    store: Arc<dyn ObjectStore>,
    folder: String,
}

impl UploadPipeline {
    /// Prepare the pipeline, creating the staging directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the staging directory cannot be created
    pub async fn new(
        policy: AcceptancePolicy,
        staging_dir: impl Into<std::path::PathBuf>,
        folder: impl Into<String>,
        store: Arc<dyn ObjectStore>,
    ) -> anyhow::Result<Self> {
        let staging_dir = staging_dir.into();
        let staging = Staging::create(&staging_dir)
            .await
            .map_err(|e| anyhow::anyhow!("failed to create staging directory {}: {e}", staging_dir.display()))?;

        tracing::debug!(dir = %staging.dir().display(), "staging directory ready");

        Ok(Self {
            policy,
            staging,
            store,
            folder: folder.into(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the staging directory cannot be created
    pub async fn from_config(
        upload: &UploadConfig,
        storage: &StorageConfig,
        store: Arc<dyn ObjectStore>,
    ) -> anyhow::Result<Self> {
        Self::new(
            AcceptancePolicy::from_config(upload),
            upload.directory.clone(),
            storage.folder.clone(),
            store,
        )
        .await
    }

    pub const fn policy(&self) -> &AcceptancePolicy {
        &self.policy
    }

    pub const fn staging(&self) -> &Staging {
        &self.staging
    }

    /// Stage the request's file and transfer it
    ///
    /// # Errors
    ///
    /// Upload failures for rejected files, 500 when the transfer fails
    pub async fn upload(&self, multipart: Multipart) -> Result<RemoteAsset, Failure> {
        let staged = self.stage(multipart).await?;
        self.transfer(staged).await
    }

    /// Accept and stage the single file of a multipart body
    ///
    /// # Errors
    ///
    /// Upload failures for missing, unexpected, oversized or disallowed files
    pub async fn stage(&self, multipart: Multipart) -> Result<StagedUpload, Failure> {
        stage_file(&self.policy, &self.staging, multipart).await
    }

    /// Send a staged file to the remote store
    ///
    /// The local copy is removed before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// 500 naming the transfer failure
    pub async fn transfer(&self, staged: StagedUpload) -> Result<RemoteAsset, Failure> {
        let options = UploadOptions {
            folder: self.folder.clone(),
            file_name: staged.original_name().to_owned(),
        };

        let outcome = self.store.upload(staged.stored_path(), &options).await;
        staged.discard();

        match outcome {
            Ok(asset) => {
                tracing::info!(public_id = %asset.public_id, bytes = asset.bytes, "upload transferred");
                Ok(asset)
            }
            Err(e) => Err(ApiError::internal(format!("Remote upload failed: {e}")).into()),
        }
    }

    /// Remove a remote asset
    ///
    /// # Errors
    ///
    /// A generic 500 when the store refuses
    pub async fn delete(&self, public_id: &str) -> Result<(), Failure> {
        self.store.destroy(public_id).await.map_err(|e| {
            tracing::warn!(public_id, error = %e, "remote deletion failed");
            Unclassified::new()
                .with_message("Image deletion failed from remote storage.")
                .into()
        })
    }
}
