//! Vehicle Allocation Service
//!
//! Asignación de vehículos a empleados por fecha, sin doble reserva de un
//! vehículo en el mismo día.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use middleware::cors::cors_middleware;
use state::AppState;

/// Crear el router completo de la API
pub fn create_app(state: AppState) -> Router {
    let cors = cors_middleware(&state.config.cors_origins);
    let timeout = TimeoutLayer::new(state.config.request_timeout);

    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/allocations",
            routes::allocation_routes::create_allocation_router(),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(timeout)
                .layer(cors),
        )
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "vehicle-allocation",
        "status": "ok",
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
