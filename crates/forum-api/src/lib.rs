//! HTTP surface of the forum's AI answer proxy.

pub mod ai;
pub mod completion;
pub mod middleware;

use std::sync::Arc;

use axum::{Router, middleware::from_fn_with_state, routing::post};

use crate::completion::CompletionClient;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub jwt_secret: String,
    pub completion: CompletionClient,
    /// Base URL of the forum backend. When set, generated answers are
    /// stored there before the proxy replies.
    pub backend_url: Option<String>,
    pub http: reqwest::Client,
}

/// Routes relative to the API prefix; the caller nests them.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ai/answer", post(ai::generate_answer))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state)
}
