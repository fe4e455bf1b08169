//! Access tokens signed with the test server's secret

use std::time::Duration;

use faultline_auth::{AccessClaims, Role, TokenVerifier};
use jwt_compact::Claims;
use secrecy::SecretString;

use super::config::TOKEN_SECRET;

fn verifier() -> TokenVerifier {
    TokenVerifier::new(
        &SecretString::from(TOKEN_SECRET.to_owned()),
        Duration::from_secs(0),
        Duration::from_secs(900),
    )
    .expect("valid verifier")
}

fn claims(role: Role) -> AccessClaims {
    AccessClaims {
        id: format!("{role}-1"),
        role,
        email: Some(format!("{role}@example.com")),
        name: None,
    }
}

/// Valid token for a principal with `role`
pub fn token(role: Role) -> String {
    verifier().issue(claims(role)).expect("token signs")
}

/// Correctly signed token that expired an hour ago
pub fn expired_token(role: Role) -> String {
    let mut expired = Claims::new(claims(role));
    expired.expiration = Some(chrono::Utc::now() - chrono::Duration::hours(1));
    verifier().sign(&expired).expect("token signs")
}

/// Token signed with a different secret
pub fn foreign_token(role: Role) -> String {
    TokenVerifier::new(
        &SecretString::from("someone-else".to_owned()),
        Duration::from_secs(0),
        Duration::from_secs(900),
    )
    .expect("valid verifier")
    .issue(claims(role))
    .expect("token signs")
}
