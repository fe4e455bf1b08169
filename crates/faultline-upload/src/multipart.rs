use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use faultline_core::{Failure, UploadError};
use http::StatusCode;
use tokio::io::AsyncWriteExt;

use crate::policy::AcceptancePolicy;
use crate::staging::{StagedUpload, Staging};

/// Read the single file part of a multipart body into staging
///
/// Text parts are skipped. A file under any other field, or a second file,
/// is an unexpected field. Any failure drops the partially written file.
pub(crate) async fn stage_file(
    policy: &AcceptancePolicy,
    staging: &Staging,
    mut multipart: Multipart,
) -> Result<StagedUpload, Failure> {
    let mut staged: Option<StagedUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(policy, &e))?
    {
        let name = field.name().unwrap_or_default().to_owned();

        if field.file_name().is_none() {
            continue;
        }

        if name != policy.field() || staged.is_some() {
            return Err(UploadError::unexpected_field(name).into());
        }

        staged = Some(write_field(policy, staging, field).await?);
    }

    staged.ok_or_else(|| {
        UploadError::other(
            Some(policy.field().to_owned()),
            format!("No file uploaded. Attach an image under the `{}` field.", policy.field()),
        )
        .into()
    })
}

async fn write_field(policy: &AcceptancePolicy, staging: &Staging, mut field: Field<'_>) -> Result<StagedUpload, Failure> {
    let original_name = field.file_name().unwrap_or_default().to_owned();
    let mime_type = field.content_type().map(str::to_owned);

    policy.check_type(&original_name, mime_type.as_deref())?;

    let (mut file, path) = staging.open(&original_name).map_err(|e| {
        tracing::error!(dir = %staging.dir().display(), error = %e, "failed to open staging file");
        UploadError::other(Some(policy.field().to_owned()), "Failed to store uploaded file.")
    })?;

    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(policy, &e))? {
        size += chunk.len() as u64;
        policy.check_size(size)?;

        file.write_all(&chunk).await.map_err(|e| write_error(policy, &e))?;
    }
    file.flush().await.map_err(|e| write_error(policy, &e))?;

    tracing::debug!(file = %original_name, bytes = size, "upload staged");

    Ok(StagedUpload::new(
        original_name,
        mime_type.unwrap_or_default(),
        size,
        path,
    ))
}

fn write_error(policy: &AcceptancePolicy, err: &std::io::Error) -> UploadError {
    tracing::error!(error = %err, "failed to write staging file");
    UploadError::other(Some(policy.field().to_owned()), "Failed to store uploaded file.")
}

/// Body-level limits surface as multipart errors with a 413 status
fn multipart_error(policy: &AcceptancePolicy, err: &MultipartError) -> Failure {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::file_too_large(policy.field(), policy.max_file_bytes()).into()
    } else {
        UploadError::other(Some(policy.field().to_owned()), err.body_text()).into()
    }
}
