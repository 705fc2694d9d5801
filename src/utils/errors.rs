//! Sistema de manejo de errores
//!
//! Este módulo define los errores de la API y su conversión a respuestas HTTP.
//! El sobre de error es siempre `{ "error": { "type", "message", "details"? } }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ids::IdError;
use crate::store::StoreError;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),
}

/// Cuerpo interno del sobre de error
#[derive(Debug, serde::Serialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            // Las violaciones de unicidad llegan ya formateadas para el usuario
            StoreError::UniqueViolation { field, value } => AppError::Conflict(format!(
                "La valeur '{}' du champ '{}' est déjà utilisée",
                value, field
            )),
            StoreError::AlreadyExists(id) => {
                AppError::Conflict(format!("Le document '{}' existe déjà", id))
            }
            StoreError::NotFound(id) => {
                AppError::NotFound(format!("Le document '{}' est introuvable", id))
            }
            StoreError::RevisionMismatch(id) => AppError::Conflict(format!(
                "Le document '{}' a été modifié entre-temps, veuillez réessayer",
                id
            )),
            other => AppError::Store(other),
        }
    }
}

impl From<IdError> for AppError {
    fn from(e: IdError) -> Self {
        AppError::BadRequest(format!("Identifiant invalide: {}", e))
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::Jwt(_) => (StatusCode::UNAUTHORIZED, "JWT_ERROR"),
            AppError::Hash(_) => (StatusCode::INTERNAL_SERVER_ERROR, "HASH_ERROR"),
        }
    }

    /// Código HTTP asociado al error
    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.parts();

        if status.is_server_error() {
            error!("❌ {}", self);
        } else {
            warn!("⚠️ {}", self);
        }

        let (message, details) = match self {
            AppError::Store(e) => (
                "Une erreur est survenue lors de l'accès aux données".to_string(),
                Some(json!({ "store_error": e.to_string() })),
            ),
            AppError::Validation(e) => (
                "Les données fournies sont invalides".to_string(),
                Some(json!(e)),
            ),
            AppError::Internal(msg) => (
                "Une erreur inattendue est survenue".to_string(),
                Some(json!({ "internal_error": msg })),
            ),
            AppError::Hash(msg) => (
                "Erreur lors du traitement des identifiants".to_string(),
                Some(json!({ "hash_error": msg })),
            ),
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::BadRequest(msg)
            | AppError::Jwt(msg) => (msg, None),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                error_type,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: i64) -> AppError {
    AppError::NotFound(format!("{} {} introuvable", resource, id))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(reason: &str) -> AppError {
    AppError::Forbidden(reason.to_string())
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_http_taxonomy() {
        let conflict: AppError = StoreError::UniqueViolation {
            field: "licensePlate".to_string(),
            value: "AB-123-CD".to_string(),
        }
        .into();
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let missing: AppError = StoreError::NotFound("vehicle-1".to_string()).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let backend: AppError = StoreError::Backend("connection reset".to_string()).into();
        assert_eq!(backend.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_id_errors_are_bad_requests() {
        let err: AppError = IdError::NotNumeric("abc".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
