use std::sync::Arc;

use crate::config::Config;
use crate::form::FormRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// One form per visitor session.
    pub forms: Arc<FormRegistry>,
    pub config: Config,
}
