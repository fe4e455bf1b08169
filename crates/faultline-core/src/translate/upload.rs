use thiserror::Error;

use crate::carrier::{ErrorCarrier, Problem};

/// Reason a multipart upload was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorCode {
    /// File exceeded the size cap
    FileTooLarge,
    /// File arrived under a field the route does not accept
    UnexpectedField,
    /// Rejected type, unreadable part, missing file
    Other,
}

impl UploadErrorCode {
    /// Wire code used by multipart middleware
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileTooLarge => "LIMIT_FILE_SIZE",
            Self::UnexpectedField => "LIMIT_UNEXPECTED_FILE",
            Self::Other => "UPLOAD_REJECTED",
        }
    }
}

/// Multipart upload failure
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UploadError {
    code: UploadErrorCode,
    field: Option<String>,
    message: String,
}

impl UploadError {
    pub fn new(code: UploadErrorCode, field: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            field,
            message: message.into(),
        }
    }

    pub fn file_too_large(field: impl Into<String>, limit_bytes: u64) -> Self {
        Self::new(
            UploadErrorCode::FileTooLarge,
            Some(field.into()),
            format!("File too large (limit {limit_bytes} bytes)"),
        )
    }

    pub fn unexpected_field(field: impl Into<String>) -> Self {
        Self::new(UploadErrorCode::UnexpectedField, Some(field.into()), "Unexpected field")
    }

    pub fn other(field: Option<String>, message: impl Into<String>) -> Self {
        Self::new(UploadErrorCode::Other, field, message)
    }

    pub const fn code(&self) -> UploadErrorCode {
        self.code
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Translate an upload failure; every kind is 400 and points at the field
pub fn translate(err: &UploadError) -> ErrorCarrier {
    let message = match err.code {
        UploadErrorCode::FileTooLarge => "File too large. Max size is 5MB.",
        UploadErrorCode::UnexpectedField => "Unexpected file field.",
        UploadErrorCode::Other => err.message.as_str(),
    };

    ErrorCarrier::new(400, message)
        .with_problem(Problem::new(err.field.clone().unwrap_or_default(), message))
        .with_trace(Some(format!("{err:?}")))
}
