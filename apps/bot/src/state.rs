use std::sync::Arc;

use crate::bot::InspirationBot;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<InspirationBot>,
}
