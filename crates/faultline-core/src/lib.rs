//! Failure normalization for Faultline
//!
//! Every failure raised while handling a request is expressed as a [`Failure`],
//! classified into an [`ErrorCarrier`] and rendered as an [`ApiResponse`]
//! envelope. Collaborator errors (database, schema validator, token library,
//! multipart layer) are converted into [`Failure`] once, at the call site.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

pub mod boundary;
mod carrier;
mod classify;
mod dispatch;
mod envelope;
mod failure;
mod mode;
pub mod translate;

pub use boundary::{CaughtFailure, capture, settle};
pub use carrier::{ErrorCarrier, Problem};
pub use classify::classify;
pub use dispatch::Dispatcher;
pub use envelope::ApiResponse;
pub use failure::{ApiError, Failure, GENERIC_MESSAGE, Unclassified};
pub use mode::RunMode;
pub use translate::schema::{PathSegment, SchemaIssue, SchemaViolation};
pub use translate::store::{RequestErrorKind, StoreError, StoreMeta};
pub use translate::token::TokenError;
pub use translate::upload::{UploadError, UploadErrorCode};

/// Result alias for request-path operations
pub type Result<T, E = Failure> = std::result::Result<T, E>;
