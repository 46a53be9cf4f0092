//! HTTP front end for the chained ledger

pub mod error;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use ledger_core::{Config, Ledger};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::GatewayError;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub service: String,
    pub version: String,
}

impl AppState {
    pub fn new(ledger: Ledger, config: &Config) -> Self {
        Self {
            ledger: Arc::new(ledger),
            service: config.service_name.clone(),
            version: config.service_version.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route(
            "/transactions",
            post(handlers::submit_transfer).get(handlers::list_transfers),
        )
        .route("/transactions/:person", get(handlers::transfers_for))
        .route("/balance/:person", get(handlers::balance))
        .route("/verify", get(handlers::verify))
        .route(
            "/keys/:person",
            post(handlers::register_key).get(handlers::get_key),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
