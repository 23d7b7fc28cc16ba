//! Application orchestrator: wires the upload engine, token issuer, janitor
//! and HTTP server together.

use std::sync::Arc;

use rangedrop_auth::TokenIssuer;
use rangedrop_auth::token::generate_secret;
use rangedrop_server::{AppState, UploadServer};
use rangedrop_transfer::{FILES_DIR, Janitor, JsonFileStore, SESSIONS_DIR, SessionManager};
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Runs the service until Ctrl-C or a server failure.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // -- Upload engine --
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let store = Arc::new(JsonFileStore::new(config.upload_dir.join(SESSIONS_DIR)));
    let manager = Arc::new(SessionManager::new(
        store,
        &config.upload_dir.join(FILES_DIR),
    ));

    // -- Auth --
    let secret = match &config.token_secret {
        Some(secret) => secret.clone(),
        None => {
            tracing::warn!("no token_secret configured; issued tokens will not survive a restart");
            generate_secret()
        }
    };
    let issuer = Arc::new(TokenIssuer::new(
        config.username.clone(),
        config.password.clone(),
        secret,
        config.token_ttl(),
    ));

    // -- Janitor --
    let janitor = Arc::new(Janitor::new(
        Arc::clone(&manager),
        config.retention(),
        config.cleanup_interval(),
    ));
    let janitor_task = janitor.spawn(cancel.child_token());
    tracing::info!(
        interval_secs = config.cleanup_interval_secs,
        retention_secs = config.retention_secs,
        "cleanup scheduled"
    );

    // -- HTTP server --
    let state = AppState::new(manager, issuer, config.server_config());
    let server = UploadServer::new(state);
    let mut server_task = tokio::spawn(server.run(cancel.child_token()));

    // -- Main loop: wait for shutdown --
    let server_result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, shutting down");
            None
        }
        result = &mut server_task => Some(result),
    };

    // -- Graceful shutdown --
    cancel.cancel();
    let server_result = match server_result {
        Some(result) => result,
        None => server_task.await,
    };
    if let Err(e) = janitor_task.await {
        tracing::warn!("janitor task ended abnormally: {e}");
    }

    server_result??;
    Ok(())
}
