use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::token::{Claims, constant_time_eq, decode, encode};
use crate::{AuthError, Authenticator, Principal};

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime in seconds at issue time.
    pub expires_in: u64,
}

/// Issues and verifies signed bearer tokens for a single configured account.
///
/// Nothing is stored per token: a token stays valid until its `exp` claim
/// passes, across restarts, as long as the secret is unchanged.
pub struct TokenIssuer {
    username: String,
    password: String,
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        secret: impl AsRef<[u8]>,
        ttl: Duration,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            secret: secret.as_ref().to_vec(),
            ttl,
        }
    }

    /// Checks credentials and issues a token valid for the configured TTL.
    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        self.login_at(username, password, Utc::now())
    }

    fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        // Compare both before branching.
        let user_ok = constant_time_eq(username, &self.username);
        let pass_ok = constant_time_eq(password, &self.password);
        if !(user_ok && pass_ok) {
            tracing::warn!(username, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let access_token = encode(
            &Claims {
                sub: username.to_string(),
                exp: expires_at.timestamp(),
            },
            &self.secret,
        )?;

        tracing::info!(username, %expires_at, "token issued");
        Ok(IssuedToken {
            access_token,
            expires_in: self.ttl.as_secs(),
        })
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        let claims = decode(token, &self.secret, now.timestamp())?;
        Ok(Principal { subject: claims.sub })
    }
}

impl Authenticator for TokenIssuer {
    fn authenticate(&self, bearer: Option<&str>) -> Result<Principal, AuthError> {
        let token = bearer
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.verify_at(token, Utc::now()).inspect_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
        })
    }
}
