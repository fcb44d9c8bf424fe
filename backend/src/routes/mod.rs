pub mod card;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{routing::post, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::card_service::CardComposer;
use card::{generate_card, method_not_allowed};

pub fn routes(composer: Arc<CardComposer>) -> Router {
    Router::new()
        .route(
            "/generate-card",
            post(generate_card).fallback(method_not_allowed),
        )
        .with_state(composer)
}

/// Router lengkap: `/api/*` plus layer CORS, batas body, dan tracing.
pub fn app(composer: Arc<CardComposer>, body_limit: usize) -> Router {
    Router::new()
        .nest("/api", routes(composer))
        .layer(CorsLayer::very_permissive())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}
