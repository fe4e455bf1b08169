use axum::response::{IntoResponse, Response};
use http::header::CONTENT_LENGTH;

use crate::boundary::CaughtFailure;
use crate::carrier::ErrorCarrier;
use crate::classify::classify;
use crate::envelope::ApiResponse;
use crate::failure::Failure;
use crate::mode::RunMode;

/// Mode-aware front of the classifier
///
/// Classification itself is pure; the dispatcher adds the two effects that
/// depend on the deployment mode: logging and trace exposure.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    mode: RunMode,
}

impl Dispatcher {
    pub const fn new(mode: RunMode) -> Self {
        Self { mode }
    }

    pub const fn mode(&self) -> RunMode {
        self.mode
    }

    /// Classify a failure and report it
    pub fn dispatch(&self, failure: Failure) -> ErrorCarrier {
        let carrier = classify(failure);
        self.report(&carrier);
        carrier
    }

    /// Log a classified failure outside development mode
    pub fn report(&self, carrier: &ErrorCarrier) {
        if self.mode.is_development() {
            return;
        }

        let status = carrier.status().as_u16();
        if carrier.status().is_server_error() {
            tracing::error!(status_code = status, error = carrier.message(), "request failed");
        } else {
            tracing::warn!(status_code = status, error = carrier.message(), "request rejected");
        }
    }

    /// Failure envelope with the trace exposed only in development mode
    pub fn envelope(&self, carrier: &ErrorCarrier) -> ApiResponse<()> {
        ApiResponse::failure(carrier, self.mode.exposes_traces())
    }

    /// Final response for a classified failure
    pub fn respond(&self, carrier: &ErrorCarrier) -> Response {
        self.envelope(carrier).into_response()
    }

    /// Complete a response produced downstream
    ///
    /// Responses rendered from a failure carry a [`CaughtFailure`] marker;
    /// the marker is consumed here, the failure reported and the envelope
    /// re-rendered for the current mode. Headers added on the way out (CORS,
    /// tracing) are kept. Other responses pass untouched.
    pub fn finish(&self, mut response: Response) -> Response {
        let Some(CaughtFailure(carrier)) = response.extensions_mut().remove::<CaughtFailure>() else {
            return response;
        };
        self.report(&carrier);

        let (mut parts, _) = response.into_parts();
        let (rendered, body) = self.respond(&carrier).into_parts();

        parts.status = rendered.status;
        parts.headers.remove(CONTENT_LENGTH);
        for (name, value) in &rendered.headers {
            parts.headers.insert(name.clone(), value.clone());
        }

        Response::from_parts(parts, body)
    }
}
