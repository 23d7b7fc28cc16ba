//! Server lifecycle.

use std::net::SocketAddr;

use rangedrop_protocol::constants::DEFAULT_CHUNK_SIZE;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::routes::create_router;
use crate::state::AppState;

/// Default request body cap: 32 MiB.
pub const DEFAULT_MAX_REQUEST_BYTES: u64 = 32 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind (port 0 = OS-assigned).
    pub listen_addr: SocketAddr,
    /// Chunk size advertised to clients at init.
    pub chunk_size: u64,
    /// Largest request body accepted.
    pub max_request_bytes: u64,
    /// Single origin allowed by CORS.
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: ([127, 0, 0, 1], 8080).into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            allowed_origin: "http://localhost:3000".into(),
        }
    }
}

/// The upload HTTP server.
pub struct UploadServer {
    state: AppState,
}

impl UploadServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Runs the server until `cancel` fires.
    ///
    /// In-flight requests are allowed to finish before this returns.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        let router = create_router(self.state.clone())?;
        let listener = TcpListener::bind(self.state.config.listen_addr).await?;

        let local_addr = listener.local_addr()?;
        tracing::info!("upload server listening on {local_addr}");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("server shutting down");
            })
            .await?;

        Ok(())
    }
}
