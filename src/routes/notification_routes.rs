use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};

use super::path_id;
use crate::controllers::NotificationController;
use crate::dto::common_dto::{ApiResponse, CountResponse};
use crate::dto::notification_dto::{MarkAllReadResponse, NotificationListQuery, NotificationResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ids::DocumentKind;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread/count", get(unread_count))
        .route("/read-all", put(mark_all_as_read))
        .route("/:id", get(get_notification).delete(delete_notification))
        .route("/:id/read", put(mark_as_read))
}

async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationResponse>>>, AppError> {
    let controller = NotificationController::new(&state);
    Ok(Json(controller.list(&user, query).await?))
}

async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<CountResponse>>, AppError> {
    let controller = NotificationController::new(&state);
    Ok(Json(controller.unread_count(&user).await?))
}

async fn mark_all_as_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<MarkAllReadResponse>>, AppError> {
    let controller = NotificationController::new(&state);
    Ok(Json(controller.mark_all_as_read(&user).await?))
}

async fn get_notification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<NotificationResponse>>, AppError> {
    let id = path_id(DocumentKind::Notification, &id)?;
    let controller = NotificationController::new(&state);
    Ok(Json(controller.get(&user, id).await?))
}

async fn mark_as_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<NotificationResponse>>, AppError> {
    let id = path_id(DocumentKind::Notification, &id)?;
    let controller = NotificationController::new(&state);
    Ok(Json(controller.mark_as_read(&user, id).await?))
}

async fn delete_notification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = path_id(DocumentKind::Notification, &id)?;
    let controller = NotificationController::new(&state);
    Ok(Json(controller.delete(&user, id).await?))
}
