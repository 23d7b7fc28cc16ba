//! Route configuration.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ServerError;
use crate::auth::require_bearer;
use crate::handlers;
use crate::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Result<Router, ServerError> {
    let cors = cors_layer(&state.config.allowed_origin)?;
    let body_limit = usize::try_from(state.config.max_request_bytes).unwrap_or(usize::MAX);

    let protected = Router::new()
        .route("/init_upload", post(handlers::init_upload))
        .route("/upload_chunk", post(handlers::upload_chunk))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/login", post(handlers::login))
        .route("/status/{file_id}", get(handlers::status))
        .route("/download/{file_id}", get(handlers::download))
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(router)
}

fn cors_layer(origin: &str) -> Result<CorsLayer, ServerError> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|_| ServerError::InvalidOrigin(origin.to_string()))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::CONTENT_RANGE,
            header::RANGE,
        ])
        .allow_credentials(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparsable_origin() {
        assert!(matches!(
            cors_layer("http://bad\norigin"),
            Err(ServerError::InvalidOrigin(_))
        ));
    }

    #[test]
    fn accepts_plain_origin() {
        assert!(cors_layer("http://localhost:3000").is_ok());
    }
}
