use std::time::Duration;

use chrono::{DateTime, Utc};
use faultline_core::TokenError;
use jwt_compact::{
    AlgorithmExt, Claims, Header, TimeOptions, UntrustedToken, ValidationError,
    alg::{Hs256, Hs256Key},
};
use secrecy::{ExposeSecret, SecretString};

use crate::identity::AccessClaims;

type Clock = fn() -> DateTime<Utc>;

/// Verifies and issues HS256 access tokens
pub struct TokenVerifier {
    key: Hs256Key,
    time: TimeOptions<Clock>,
    ttl: chrono::Duration,
}

impl TokenVerifier {
    /// # Errors
    ///
    /// Returns an error if `leeway` or `ttl` do not fit a signed duration
    pub fn new(secret: &SecretString, leeway: Duration, ttl: Duration) -> anyhow::Result<Self> {
        let leeway = chrono::Duration::from_std(leeway).map_err(|e| anyhow::anyhow!("invalid token leeway: {e}"))?;
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| anyhow::anyhow!("invalid token lifetime: {e}"))?;

        Ok(Self {
            key: Hs256Key::new(secret.expose_secret().as_bytes()),
            time: TimeOptions::new(leeway, Utc::now as Clock),
            ttl,
        })
    }

    /// Check signature and expiry and return the token's claims
    ///
    /// A token without an expiry never expires.
    ///
    /// # Errors
    ///
    /// [`TokenError::Expired`] for a correctly signed token past its expiry,
    /// [`TokenError::Invalid`] for everything else
    pub fn verify(&self, raw: &str) -> Result<AccessClaims, TokenError> {
        let untrusted = UntrustedToken::new(raw).map_err(|e| TokenError::Invalid(e.to_string()))?;

        let token = Hs256
            .validator::<AccessClaims>(&self.key)
            .validate(&untrusted)
            .map_err(validation_error)?;

        let claims = token.claims();
        if claims.expiration.is_some() {
            claims.validate_expiration(&self.time).map_err(validation_error)?;
        }

        Ok(claims.custom.clone())
    }

    /// Sign a token for `claims` valid for the configured lifetime
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be serialized
    pub fn issue(&self, claims: AccessClaims) -> anyhow::Result<String> {
        let claims = Claims::new(claims).set_duration_and_issuance(&self.time, self.ttl);
        self.sign(&claims)
    }

    /// Sign arbitrary claims, including already-expired ones
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be serialized
    pub fn sign(&self, claims: &Claims<AccessClaims>) -> anyhow::Result<String> {
        Hs256
            .token(&Header::empty(), claims, &self.key)
            .map_err(|e| anyhow::anyhow!("failed to sign access token: {e}"))
    }
}

fn validation_error(err: ValidationError) -> TokenError {
    match err {
        ValidationError::Expired => TokenError::Expired,
        other => TokenError::Invalid(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    fn verifier(secret: &str) -> TokenVerifier {
        TokenVerifier::new(
            &SecretString::from(secret.to_owned()),
            Duration::from_secs(0),
            Duration::from_secs(900),
        )
        .unwrap()
    }

    fn claims() -> AccessClaims {
        AccessClaims {
            id: "u-1".to_owned(),
            role: Role::Member,
            email: Some("member@example.com".to_owned()),
            name: None,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let verifier = verifier("secret");
        let token = verifier.issue(claims()).unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), claims());
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let verifier = verifier("secret");
        let mut expired = Claims::new(claims());
        expired.expiration = Some(Utc::now() - chrono::Duration::hours(1));

        let token = verifier.sign(&expired).unwrap();
        assert!(matches!(verifier.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_without_expiry_is_accepted() {
        let verifier = verifier("secret");
        let token = verifier.sign(&Claims::new(claims())).unwrap();
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = verifier("secret").issue(claims()).unwrap();
        assert!(matches!(verifier("other").verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(verifier("secret").verify("not-a-jwt"), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn legacy_id_claim_is_read() {
        let claims: AccessClaims = serde_json::from_str(r#"{"_id":"abc","role":"admin"}"#).unwrap();
        assert_eq!(claims.id, "abc");
        assert_eq!(claims.role, Role::Admin);
    }
}
