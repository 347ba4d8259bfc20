//! `stockroom-auth`: bearer-token authentication boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it decodes a token
//! and validates its claims against an injected clock.

pub mod claims;
pub mod validator;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use validator::{AuthError, Hs256JwtValidator, JwtValidator};
