use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};

use super::path_id;
use crate::controllers::MessageController;
use crate::dto::common_dto::{ApiResponse, CountResponse};
use crate::dto::message_dto::{MessageListQuery, MessageResponse, SendMessageRequest, UpdateMessageRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ids::DocumentKind;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(send_message).get(list_messages))
        .route("/unread/count", get(unread_count))
        .route("/:id", get(get_message).put(update_message).delete(delete_message))
}

async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let controller = MessageController::new(&state);
    Ok(Json(controller.send(&user, request).await?))
}

async fn list_messages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<MessageResponse>>>, AppError> {
    let controller = MessageController::new(&state);
    Ok(Json(controller.list(&user, query).await?))
}

async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<CountResponse>>, AppError> {
    let controller = MessageController::new(&state);
    Ok(Json(controller.unread_count(&user).await?))
}

async fn get_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let id = path_id(DocumentKind::Message, &id)?;
    let controller = MessageController::new(&state);
    Ok(Json(controller.get(&user, id).await?))
}

async fn update_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMessageRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let id = path_id(DocumentKind::Message, &id)?;
    let controller = MessageController::new(&state);
    Ok(Json(controller.update(&user, id, request).await?))
}

async fn delete_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = path_id(DocumentKind::Message, &id)?;
    let controller = MessageController::new(&state);
    Ok(Json(controller.delete(&user, id).await?))
}
