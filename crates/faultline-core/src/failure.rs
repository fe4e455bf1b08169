use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};

use http::StatusCode;
use thiserror::Error;

use crate::carrier::Problem;
use crate::translate::{
    schema::SchemaViolation, store::StoreError, token::TokenError, upload::UploadError,
};

/// Message used when a failure carries none of its own
pub const GENERIC_MESSAGE: &str = "Something went wrong";

/// Every failure that can reach the dispatcher
///
/// Collaborator errors are converted into one of these variants where they
/// are produced, so classification is a plain `match`.
#[derive(Debug, Error)]
pub enum Failure {
    /// Raised explicitly by application code, already normalized
    #[error(transparent)]
    Application(#[from] ApiError),

    /// Request body or parameters rejected by the schema validator
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    /// Persistence engine failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Bearer token could not be verified
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Multipart upload rejected
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Anything else, including panics
    #[error(transparent)]
    Unclassified(#[from] Unclassified),
}

impl From<sqlx::Error> for Failure {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.into())
    }
}

/// Error raised deliberately by application code
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
    trace: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            trace: capture_trace(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }
}

/// Failure outside every known family
///
/// Status, message and problems are all optional; the classifier fills in
/// 500 and [`GENERIC_MESSAGE`] for whatever is missing.
#[derive(Debug, Default, Error)]
#[error("{}", .message.as_deref().unwrap_or(GENERIC_MESSAGE))]
pub struct Unclassified {
    status: Option<u16>,
    message: Option<String>,
    problems: Vec<Problem>,
    trace: Option<String>,
}

impl Unclassified {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap any error, keeping its display text as the message
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self {
            message: Some(err.to_string()),
            trace: Some(format!("{err:?}")),
            ..Self::default()
        }
    }

    /// Build from a caught panic payload
    ///
    /// The panic text only ever goes into the trace so it is never shown to
    /// clients outside development mode.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let text = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with non-string payload".to_owned());

        Self {
            trace: Some(format!("panicked: {text}")),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_problems(mut self, problems: Vec<Problem>) -> Self {
        self.problems = problems;
        self
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub(crate) fn into_parts(self) -> (Option<u16>, Option<String>, Vec<Problem>, Option<String>) {
        (self.status, self.message, self.problems, self.trace)
    }
}

fn capture_trace() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}
