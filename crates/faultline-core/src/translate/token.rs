use thiserror::Error;

use crate::carrier::{ErrorCarrier, Problem};

/// Bearer token verification failures
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature was fine but the token is past its expiry
    #[error("token expired")]
    Expired,

    /// Malformed token, bad signature or unreadable claims
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Translate a token failure; both kinds are 401
pub fn translate(err: &TokenError) -> ErrorCarrier {
    let message = match err {
        TokenError::Expired => "Token expired. Please log in again.",
        TokenError::Invalid(_) => "Invalid token. Authentication failed.",
    };

    ErrorCarrier::new(401, message)
        .with_problem(Problem::general(message))
        .with_trace(Some(format!("{err:?}")))
}
