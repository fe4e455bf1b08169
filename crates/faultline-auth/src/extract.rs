use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use faultline_core::{ApiError, Failure};
use http::request::Parts;

use crate::gate::authorize;
use crate::identity::{Identity, Role};

/// Identity of an authenticated request
///
/// Rejects with 401 when the authentication middleware did not run or did not
/// attach an identity.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Self)
            .ok_or_else(|| ApiError::unauthorized("Authentication required").into())
    }
}

/// Roles a route admits
pub trait RoleSet {
    const ROLES: &'static [Role];
}

/// `super_admin` and `admin`
#[derive(Debug)]
pub struct Admins;

impl RoleSet for Admins {
    const ROLES: &'static [Role] = &[Role::SuperAdmin, Role::Admin];
}

/// Any authenticated principal
#[derive(Debug)]
pub struct Everyone;

impl RoleSet for Everyone {
    const ROLES: &'static [Role] = &[Role::SuperAdmin, Role::Admin, Role::Agent, Role::Member];
}

/// Identity whose role is in `P::ROLES`
pub struct Authorized<P> {
    pub identity: Identity,
    policy: PhantomData<fn() -> P>,
}

impl<P> Authorized<P> {
    pub fn into_inner(self) -> Identity {
        self.identity
    }
}

impl<S: Send + Sync, P: RoleSet> FromRequestParts<S> for Authorized<P> {
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>();
        authorize(identity, P::ROLES)?;

        Ok(Self {
            identity: identity.cloned().ok_or_else(|| ApiError::unauthorized("Authentication required"))?,
            policy: PhantomData,
        })
    }
}
