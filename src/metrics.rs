//! Métricas Prometheus
//!
//! Registro propio del proceso, expuesto en `GET /metrics`.

use axum::{
    extract::{MatchedPath, Request},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    static ref HTTP_REQUESTS: IntCounterVec = register_counter_vec(
        "remisage_http_requests_total",
        "Requêtes HTTP traitées",
        &["method", "route", "status"],
    );

    static ref STORE_COMMITS: IntCounterVec = register_counter_vec(
        "remisage_store_commits_total",
        "Transactions du magasin de documents",
        &["outcome"],
    );

    static ref NOTIFICATIONS: IntCounterVec = register_counter_vec(
        "remisage_notifications_total",
        "Notifications par résultat (delivered, failed, dropped)",
        &["outcome"],
    );

    static ref CORRUPT_DOCUMENTS: IntCounterVec = register_counter_vec(
        "remisage_corrupt_documents_total",
        "Documents illisibles ignorés lors d'un listage",
        &["doc_type"],
    );

    static ref NORMALIZER_DROPPED: IntCounter = {
        let counter = IntCounter::new(
            "remisage_normalizer_dropped_total",
            "Véhicules écartés faute d'identifiant numérique",
        )
        .expect("valid metric definition");
        REGISTRY
            .register(Box::new(counter.clone()))
            .expect("metric registered once");
        counter
    };
}

fn register_counter_vec(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    let counter = IntCounterVec::new(Opts::new(name, help), labels).expect("valid metric definition");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("metric registered once");
    counter
}

pub fn record_store_commit(success: bool) {
    let outcome = if success { "ok" } else { "error" };
    STORE_COMMITS.with_label_values(&[outcome]).inc();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    Delivered,
    Failed,
    Dropped,
}

pub fn record_notification(outcome: NotificationOutcome) {
    let label = match outcome {
        NotificationOutcome::Delivered => "delivered",
        NotificationOutcome::Failed => "failed",
        NotificationOutcome::Dropped => "dropped",
    };
    NOTIFICATIONS.with_label_values(&[label]).inc();
}

pub fn record_corrupt_document(doc_type: &str) {
    CORRUPT_DOCUMENTS.with_label_values(&[doc_type]).inc();
}

pub fn record_normalizer_drop() {
    NORMALIZER_DROPPED.inc();
}

/// Middleware que cuenta las peticiones por ruta y código
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS
        .with_label_values(&[method.as_str(), route.as_str(), status.as_str()])
        .inc();
    response
}

/// Render del registro en formato texto
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub async fn metrics_handler() -> Response {
    match render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("❌ Error generando métricas: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
