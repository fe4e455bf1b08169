//! Async boundary between request work and the failure channel
//!
//! Request work is a future returning `Result<T, Failure>`. [`capture`] turns
//! a panic inside that future into an `Err`, and [`settle`] turns the outcome
//! into exactly one response: the value's own, or the envelope of a single
//! dispatched failure.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;

use crate::carrier::ErrorCarrier;
use crate::classify::classify;
use crate::dispatch::Dispatcher;
use crate::envelope::ApiResponse;
use crate::failure::{Failure, Unclassified};

/// Marker attached to responses rendered straight from a failure
///
/// Handlers returning `Err(Failure)` are rendered by axum through
/// [`IntoResponse`], which has no access to the dispatcher. The rendered
/// response is safe on its own (no trace) and carries the carrier so the
/// dispatcher can report it and re-render it for the current mode.
#[derive(Debug, Clone)]
pub struct CaughtFailure(pub ErrorCarrier);

impl IntoResponse for ErrorCarrier {
    fn into_response(self) -> Response {
        let mut response = ApiResponse::failure(&self, false).into_response();
        response.extensions_mut().insert(CaughtFailure(self));
        response
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        classify(self).into_response()
    }
}

/// Run request work, converting a panic into an unclassified failure
pub async fn capture<T, F>(work: F) -> Result<T, Failure>
where
    F: Future<Output = Result<T, Failure>>,
{
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(Unclassified::from_panic(payload.as_ref()).into()),
    }
}

/// Run request work and produce its single response
pub async fn settle<T, F>(dispatcher: &Dispatcher, work: F) -> Response
where
    F: Future<Output = Result<T, Failure>>,
    T: IntoResponse,
{
    match capture(work).await {
        Ok(value) => dispatcher.finish(value.into_response()),
        Err(failure) => {
            let carrier = dispatcher.dispatch(failure);
            dispatcher.respond(&carrier)
        }
    }
}
