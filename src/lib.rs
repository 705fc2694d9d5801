//! Remisage
//!
//! Backend de gestión de la flota de vehículos de empresa: asignación a
//! empleados, historial de ubicaciones, mensajería interna, solicitudes y
//! notificaciones sobre un almacén de documentos.

pub mod cache;
pub mod client;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

use axum::{middleware::from_fn, middleware::from_fn_with_state, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::{auth_middleware, cors_middleware_with_origins};
use crate::routes::{
    auth_routes::auth_routes, health_routes::health_routes, message_routes::message_routes,
    notification_routes::notification_routes, request_routes::request_routes,
    user_routes::user_routes, vehicle_routes::vehicle_routes,
};
use crate::state::AppState;

/// Router completo de la API
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/users", user_routes())
        .nest("/vehicles", vehicle_routes())
        .nest("/messages", message_routes())
        .nest("/requests", request_routes())
        .nest("/notifications", notification_routes())
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .nest("/auth", auth_routes())
        .nest("/health", health_routes())
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(metrics::metrics_handler))
        .layer(from_fn(metrics::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors_middleware_with_origins(&state.config.cors_origins))
        .with_state(state)
}
