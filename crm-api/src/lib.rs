//! crm-api library - HTTP API service
//!
//! CRUD routes for contacts, deals, activities and AI research, a dashboard
//! aggregation endpoint, and AI-agent proxy endpoints backed by an external
//! completion API.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

use crate::services::LlmClient;

pub mod api;
pub mod error;
pub mod query;
pub mod services;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Completion API client (None when no API key is configured)
    pub llm: Option<Arc<LlmClient>>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, llm: Option<Arc<LlmClient>>) -> Self {
        Self { db, llm }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/contacts", get(api::list_contacts).post(api::create_contact))
        .route("/api/contacts/:id", get(api::get_contact).put(api::update_contact))
        .route("/api/deals", get(api::list_deals).post(api::create_deal))
        .route(
            "/api/activities",
            get(api::list_activities).post(api::create_activity),
        )
        .route("/api/dashboard", get(api::dashboard_stats))
        .route("/api/ai-agents/personalize", post(api::personalize_outreach))
        .route("/api/ai-agents/analyze-parallels", post(api::analyze_parallels))
        .route(
            "/api/ai-agents/research",
            get(api::list_research).post(api::submit_research),
        )
        .merge(api::health_routes())
        .with_state(state)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}
