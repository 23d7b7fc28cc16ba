//! Application state.

use std::sync::Arc;

use rangedrop_auth::{Authenticator, TokenIssuer};
use rangedrop_transfer::SessionManager;

use crate::server::ServerConfig;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
    /// Issues tokens at `/login`.
    pub issuer: Arc<TokenIssuer>,
    /// Checks tokens on protected routes.
    pub authenticator: Arc<dyn Authenticator>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Builds state where the issuer also verifies its own tokens.
    pub fn new(manager: Arc<SessionManager>, issuer: Arc<TokenIssuer>, config: ServerConfig) -> Self {
        Self {
            manager,
            authenticator: Arc::clone(&issuer) as Arc<dyn Authenticator>,
            issuer,
            config: Arc::new(config),
        }
    }
}
