use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::carrier::{ErrorCarrier, Problem};

/// Uniform wire shape of every response, successful or not
///
/// `success` is derived from the status code and cannot disagree with it.
/// `trace` is only serialized when present, which the dispatcher allows in
/// development mode only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    status_code: u16,
    success: bool,
    data: Option<T>,
    message: String,
    problems: Vec<Problem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Envelope carrying a payload
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            success: status.as_u16() < 400,
            data: Some(data),
            message: message.into(),
            problems: Vec::new(),
            trace: None,
        }
    }

    /// `200 OK` envelope carrying a payload
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    /// `201 Created` envelope carrying a payload
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }

    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    pub const fn success(&self) -> bool {
        self.success
    }

    pub const fn data(&self) -> Option<&T> {
        self.data.as_ref()
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

    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl ApiResponse<()> {
    /// Failure envelope for a classified carrier
    ///
    /// The trace is copied only when `expose_trace` is set.
    pub fn failure(carrier: &ErrorCarrier, expose_trace: bool) -> Self {
        Self {
            status_code: carrier.status().as_u16(),
            success: false,
            data: None,
            message: carrier.message().to_owned(),
            problems: carrier.problems().to_vec(),
            trace: if expose_trace {
                carrier.trace().map(str::to_owned)
            } else {
                None
            },
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
