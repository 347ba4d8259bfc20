//! Signature verification for bearer tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use thiserror::Error;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed or wrongly signed token: {0}")]
    Decode(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies a raw bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError>;
}

/// HS256 shared-secret validator.
///
/// Time-based checks are done by [`validate_claims`] against the caller's clock,
/// not by `jsonwebtoken`'s wall-clock validation. Issuer and audience are only
/// checked once configured through [`Hs256JwtValidator::with_issuer`] and
/// [`Hs256JwtValidator::with_audience`]; a configured claim becomes mandatory.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }

    pub fn with_issuer(mut self, iss: &str) -> Self {
        self.validation.set_issuer(&[iss]);
        self.validation.required_spec_claims.insert("iss".to_string());
        self
    }

    pub fn with_audience(mut self, aud: &str) -> Self {
        self.validation.set_audience(&[aud]);
        self.validation.validate_aud = true;
        self.validation.required_spec_claims.insert("aud".to_string());
        self
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn mint(secret: &str, claims: &JwtClaims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("failed to encode jwt")
    }

    #[test]
    fn round_trips_valid_token() {
        let now = Utc::now();
        let claims = JwtClaims::new("user-1", now, now + Duration::minutes(10)).with_username("jana");
        let token = mint("s3cret", &claims);

        let validator = Hs256JwtValidator::new("s3cret");
        assert_eq!(validator.validate(&token, now), Ok(claims));
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let now = Utc::now();
        let claims = JwtClaims::new("user-1", now, now + Duration::minutes(10));
        let token = mint("other", &claims);

        let validator = Hs256JwtValidator::new("s3cret");
        assert!(matches!(validator.validate(&token, now), Err(AuthError::Decode(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc::now();
        let claims = JwtClaims::new("user-1", now - Duration::hours(2), now - Duration::hours(1));
        let token = mint("s3cret", &claims);

        let validator = Hs256JwtValidator::new("s3cret");
        assert_eq!(
            validator.validate(&token, now),
            Err(AuthError::Claims(TokenValidationError::Expired))
        );
    }

    #[test]
    fn configured_issuer_must_match() {
        let now = Utc::now();
        let base = JwtClaims::new("user-1", now, now + Duration::minutes(10));
        let validator = Hs256JwtValidator::new("s3cret").with_issuer("https://auth.example");

        let good = base.clone().with_issuer("https://auth.example");
        assert_eq!(validator.validate(&mint("s3cret", &good), now), Ok(good));

        let wrong = base.clone().with_issuer("https://evil.example");
        assert!(matches!(
            validator.validate(&mint("s3cret", &wrong), now),
            Err(AuthError::Decode(_))
        ));

        assert!(matches!(
            validator.validate(&mint("s3cret", &base), now),
            Err(AuthError::Decode(_))
        ));
    }

    #[test]
    fn configured_audience_must_match() {
        let now = Utc::now();
        let base = JwtClaims::new("user-1", now, now + Duration::minutes(10));
        let validator = Hs256JwtValidator::new("s3cret").with_audience("stockroom");

        let good = base.clone().with_audience("stockroom");
        assert_eq!(validator.validate(&mint("s3cret", &good), now), Ok(good));

        let wrong = base.clone().with_audience("billing");
        assert!(matches!(
            validator.validate(&mint("s3cret", &wrong), now),
            Err(AuthError::Decode(_))
        ));

        assert!(matches!(
            validator.validate(&mint("s3cret", &base), now),
            Err(AuthError::Decode(_))
        ));
    }

    #[test]
    fn audience_is_ignored_when_not_configured() {
        let now = Utc::now();
        let claims = JwtClaims::new("user-1", now, now + Duration::minutes(10))
            .with_issuer("https://auth.example")
            .with_audience("anything");
        let token = mint("s3cret", &claims);

        let validator = Hs256JwtValidator::new("s3cret");
        assert_eq!(validator.validate(&token, now), Ok(claims));
    }

    #[test]
    fn rejects_garbage() {
        let validator = Hs256JwtValidator::new("s3cret");
        assert!(validator.validate("not-a-jwt", Utc::now()).is_err());
    }
}
