//! StockTrack API Library
//!
//! Inventory core service: an append-only movement ledger, purchase order
//! receiving, manual outbound issues, and stock balances derived from the
//! ledger.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), event_sender.clone());
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// All v1 API routes, to be nested under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/purchase-orders",
            handlers::purchase_orders::purchase_order_routes(),
        )
        .nest("/movements", handlers::movements::movement_routes())
        .nest("/stock", handlers::stock::stock_routes())
}

/// Full application router with health, OpenAPI, and request tracing.
/// Outer layers (CORS, timeouts, compression) are applied in main.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "stocktrack-api up" }))
        .nest("/api/v1", api_v1_routes())
        .with_state(state.clone())
        .nest("/health", health::health_routes(state.db.clone()))
        .merge(openapi::openapi_routes())
        .layer(TraceLayer::new_for_http())
}
