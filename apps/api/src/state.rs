use std::sync::Arc;

use crate::config::Config;
use crate::session::Session;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The one user session. Owns the extractor, readiness gate, classifier and history.
    pub session: Arc<Session>,
    pub config: Config,
}
