use http::StatusCode;
use serde::{Deserialize, Serialize};

/// A single field-level problem reported to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Field the problem refers to, empty when it concerns the whole request
    pub path: String,
    /// Human-readable description
    pub message: String,
}

impl Problem {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Problem that is not tied to any field
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(String::new(), message)
    }
}

/// Normalized representation of a request failure
///
/// The status is always a 4xx or 5xx code; anything else handed to the
/// constructor is replaced by 500. Instances are built once by the classifier
/// and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCarrier {
    status: StatusCode,
    message: String,
    problems: Vec<Problem>,
    trace: Option<String>,
}

impl ErrorCarrier {
    /// Build a carrier with no problems and no trace
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: error_status(status),
            message: message.into(),
            problems: Vec::new(),
            trace: None,
        }
    }

    #[must_use]
    pub fn with_problems(mut self, problems: Vec<Problem>) -> Self {
        self.problems = problems;
        self
    }

    #[must_use]
    pub fn with_problem(self, problem: Problem) -> Self {
        self.with_problems(vec![problem])
    }

    #[must_use]
    pub fn with_trace(mut self, trace: Option<String>) -> Self {
        self.trace = trace;
        self
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }
}

/// Clamp an arbitrary code to a client or server error status
pub(crate) fn error_status(code: u16) -> StatusCode {
    match StatusCode::from_u16(code) {
        Ok(status) if status.is_client_error() || status.is_server_error() => status,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
