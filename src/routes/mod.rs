pub mod auth_routes;
pub mod health_routes;
pub mod message_routes;
pub mod notification_routes;
pub mod request_routes;
pub mod user_routes;
pub mod vehicle_routes;

use crate::models::ids::{DocumentId, DocumentKind};
use crate::utils::errors::AppError;

/// Acepta `"vehicle-7"` o `"7"`; cualquier otra cosa es un 400
pub(crate) fn path_id(kind: DocumentKind, raw: &str) -> Result<i64, AppError> {
    Ok(DocumentId::parse(kind, raw)?.number())
}
