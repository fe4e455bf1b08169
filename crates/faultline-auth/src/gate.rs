use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use faultline_core::{ApiError, Failure};
use http::HeaderMap;

use crate::identity::{Identity, Role};
use crate::resolver::IdentityResolver;
use crate::token::TokenVerifier;

/// Shared state of the authentication middleware
#[derive(Clone)]
pub struct Gate {
    verifier: Arc<TokenVerifier>,
    resolver: Arc<dyn IdentityResolver>,
}

impl Gate {
    pub fn new(verifier: Arc<TokenVerifier>, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { verifier, resolver }
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Authenticate a request from its headers
    ///
    /// # Errors
    ///
    /// 401 when no bearer token is present, a token failure when it does not
    /// verify, or whatever the resolver refuses with
    pub async fn identify(&self, headers: &HeaderMap) -> Result<Identity, Failure> {
        let token = bearer_token(headers).ok_or_else(|| ApiError::unauthorized("Unauthorized request."))?;
        let claims = self.verifier.verify(token)?;
        self.resolver.resolve(claims).await
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware attaching the request's [`Identity`]
///
/// # Errors
///
/// Refuses the request with the failure from [`Gate::identify`]
pub async fn authenticate(State(gate): State<Gate>, mut request: Request, next: Next) -> Result<Response, Failure> {
    let identity = gate.identify(request.headers()).await?;
    tracing::debug!(subject = %identity.id, role = %identity.role, "request authenticated");

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Check that an identity holds one of `allowed`
///
/// Missing identity is always 401, never 403.
///
/// # Errors
///
/// 401 "Authentication required" without identity, 403 "Unauthorized User"
/// for a role outside `allowed`
pub fn authorize(identity: Option<&Identity>, allowed: &[Role]) -> Result<(), ApiError> {
    let Some(identity) = identity else {
        return Err(ApiError::unauthorized("Authentication required"));
    };

    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Unauthorized User"))
    }
}
