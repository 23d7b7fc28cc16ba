//! HS256 token encoding and comparison helpers.
//!
//! Tokens are compact JWS strings (`header.claims.signature`, base64url
//! without padding) signed with HMAC-SHA256. Only the fixed HS256 header is
//! accepted, so a token cannot pick its own algorithm.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// `{"alg":"HS256","typ":"JWT"}`, base64url encoded.
const HEADER: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";

/// Secret length in bytes for [`generate_secret`] (64 hex characters).
const SECRET_BYTES: usize = 32;

/// Claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account the token was issued to.
    pub sub: String,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

/// Generates a CSPRNG signing secret as a lowercase hex string.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

fn mac(key: &[u8]) -> Result<HmacSha256, AuthError> {
    HmacSha256::new_from_slice(key).map_err(|e| AuthError::Signing(e.to_string()))
}

/// Signs `claims` with `key`.
pub fn encode(claims: &Claims, key: &[u8]) -> Result<String, AuthError> {
    let payload = serde_json::to_vec(claims).map_err(|e| AuthError::Signing(e.to_string()))?;
    let signing_input = format!("{HEADER}.{}", URL_SAFE_NO_PAD.encode(payload));

    let mut mac = mac(key)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

/// Checks the signature and expiry of `token`, returning its claims.
///
/// The signature is checked before the claims are parsed.
pub fn decode(token: &str, key: &[u8], now_secs: i64) -> Result<Claims, AuthError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::InvalidToken);
    };
    if header != HEADER {
        return Err(AuthError::InvalidToken);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| AuthError::InvalidToken)?;
    let mut mac = mac(key)?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AuthError::InvalidToken)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthError::InvalidToken)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidToken)?;
    if claims.exp <= now_secs {
        return Err(AuthError::Expired);
    }
    Ok(claims)
}

/// Compares two strings in time independent of where they differ.
pub fn constant_time_eq(received: &str, expected: &str) -> bool {
    if received.len() != expected.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in received.bytes().zip(expected.bytes()) {
        diff |= a ^ b;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-secret";

    fn claims(exp: i64) -> Claims {
        Claims {
            sub: "admin".into(),
            exp,
        }
    }

    #[test]
    fn header_constant_matches_json() {
        let json = URL_SAFE_NO_PAD.decode(HEADER).unwrap();
        assert_eq!(json, br#"{"alg":"HS256","typ":"JWT"}"#);
    }

    #[test]
    fn signed_token_decodes() {
        let token = encode(&claims(2_000), KEY).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(decode(&token, KEY, 1_000).unwrap(), claims(2_000));
    }

    #[test]
    fn wrong_key_rejected() {
        let token = encode(&claims(2_000), KEY).unwrap();
        assert_eq!(
            decode(&token, b"other", 1_000).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn tampered_claims_rejected() {
        let token = encode(&claims(2_000), KEY).unwrap();
        let forged = encode(&claims(9_000), b"attacker").unwrap();

        // Graft the forged claims onto the genuine signature.
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged.split('.').nth(1).unwrap();
        assert_eq!(
            decode(&parts.join("."), KEY, 1_000).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn unsigned_header_rejected() {
        // {"alg":"none"}
        let token = encode(&claims(2_000), KEY).unwrap();
        let rest = token.split_once('.').unwrap().1;
        let none = format!("eyJhbGciOiJub25lIn0.{rest}");
        assert_eq!(decode(&none, KEY, 1_000).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn malformed_tokens_rejected() {
        let bad_encoding = format!("{HEADER}.!!.??");
        for token in ["", "deadbeef", "a.b", "a.b.c.d", bad_encoding.as_str()] {
            assert_eq!(decode(token, KEY, 0).unwrap_err(), AuthError::InvalidToken);
        }
    }

    #[test]
    fn expiry_is_exclusive() {
        let token = encode(&claims(2_000), KEY).unwrap();
        assert!(decode(&token, KEY, 1_999).is_ok());
        assert_eq!(decode(&token, KEY, 2_000).unwrap_err(), AuthError::Expired);
    }

    #[test]
    fn secrets_are_unique_hex() {
        let secret = generate_secret();
        assert_eq!(secret.len(), SECRET_BYTES * 2);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(secret, generate_secret());
    }

    #[test]
    fn constant_time_eq_cases() {
        assert!(constant_time_eq("admin", "admin"));
        assert!(!constant_time_eq("admin", "admiN"));
        assert!(!constant_time_eq("short", "this_is_longer"));
    }
}
