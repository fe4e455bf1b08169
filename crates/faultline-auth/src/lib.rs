//! Access control for Faultline
//!
//! Authentication turns a bearer token into an [`Identity`]; authorization
//! checks that identity's [`Role`] against an allow-list. Both failure modes
//! are ordinary [`faultline_core::Failure`] values.

mod extract;
mod gate;
mod identity;
mod resolver;
mod token;

pub use extract::{Admins, Authenticated, Authorized, Everyone, RoleSet};
pub use gate::{Gate, authenticate, authorize, bearer_token};
pub use identity::{AccessClaims, Identity, Role};
pub use resolver::{ClaimsResolver, IdentityLookup, IdentityResolver, StoreResolver};
pub use token::TokenVerifier;
