use async_trait::async_trait;
use faultline_core::{ApiError, Failure};

use crate::identity::{AccessClaims, Identity};

/// Turns verified token claims into the request's identity
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns a failure if the claims do not map to a usable principal
    async fn resolve(&self, claims: AccessClaims) -> Result<Identity, Failure>;
}

/// Trusts the claims as-is
///
/// Role changes and deletions take effect when the token expires.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsResolver;

#[async_trait]
impl IdentityResolver for ClaimsResolver {
    async fn resolve(&self, claims: AccessClaims) -> Result<Identity, Failure> {
        Ok(claims.into())
    }
}

/// Source of truth for principals, usually a database table
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// # Errors
    ///
    /// Returns a failure if the lookup itself fails
    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, Failure>;
}

/// Re-fetches the principal on every request
///
/// A token whose subject no longer exists is refused with 403.
#[derive(Debug, Clone)]
pub struct StoreResolver<L> {
    lookup: L,
}

impl<L> StoreResolver<L> {
    pub const fn new(lookup: L) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl<L: IdentityLookup> IdentityResolver for StoreResolver<L> {
    async fn resolve(&self, claims: AccessClaims) -> Result<Identity, Failure> {
        match self.lookup.find_by_id(&claims.id).await? {
            Some(identity) => Ok(identity),
            None => {
                tracing::debug!(subject = %claims.id, "token subject no longer exists");
                Err(ApiError::forbidden("Forbidden").into())
            }
        }
    }
}
