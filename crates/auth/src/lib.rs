//! Bearer-token authentication for the upload API.
//!
//! [`TokenIssuer`] trades a username/password pair for an HS256-signed
//! token and later verifies it through the [`Authenticator`] trait, which is
//! all the HTTP layer depends on. Tokens carry their own subject and expiry,
//! so any issuer holding the same secret accepts them.

mod issuer;
pub mod token;

pub use issuer::{IssuedToken, TokenIssuer};

/// Errors produced while authenticating a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// The identity behind an accepted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
}

/// Decides whether a request may proceed.
pub trait Authenticator: Send + Sync + 'static {
    /// Checks the bearer token taken from the request, if any.
    fn authenticate(&self, bearer: Option<&str>) -> Result<Principal, AuthError>;
}
