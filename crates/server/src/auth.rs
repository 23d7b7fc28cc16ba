//! Bearer authentication middleware.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Extract bearer token from the Authorization header.
/// The scheme is matched case-insensitively.
fn extract_bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(&v[7..])
            } else {
                None
            }
        })
}

/// Rejects requests without a valid bearer token and stores the
/// [`Principal`](rangedrop_auth::Principal) in request extensions.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = state
        .authenticator
        .authenticate(extract_bearer_token(&req))?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;

    fn request(auth: &str) -> Request {
        http::Request::builder()
            .header(AUTHORIZATION, auth)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(extract_bearer_token(&request("Bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&request("bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&request("BEARER abc")), Some("abc"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        assert_eq!(extract_bearer_token(&request("Basic YWRtaW4=")), None);
        assert_eq!(extract_bearer_token(&request("Bearer")), None);
    }
}
