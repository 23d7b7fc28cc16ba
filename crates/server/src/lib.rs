//! HTTP server for the Rangedrop upload service.
//!
//! Exposes the upload engine from `rangedrop-transfer` over axum: login,
//! init, chunk upload, status and range-aware download, with CORS and
//! bearer authentication on the mutating routes.

mod auth;
pub mod error;
mod handlers;
mod routes;
mod server;
mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::{DEFAULT_MAX_REQUEST_BYTES, ServerConfig, UploadServer};
pub use state::AppState;

/// Errors produced while setting up or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid allowed origin {0:?}")]
    InvalidOrigin(String),
}
