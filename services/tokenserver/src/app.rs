//! Token server HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
use crate::api;
use crate::auth::Authorizer;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const TOKEN_PATH: &str = "/api/auth";

#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<Authorizer>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            // The query string carries the scope; credentials stay in headers.
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    Router::new()
        .route(TOKEN_PATH, axum::routing::get(api::token::issue_token))
        .layer(trace_layer)
        .with_state(state)
}
