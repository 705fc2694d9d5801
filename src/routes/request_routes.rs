use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};

use super::path_id;
use crate::controllers::RequestController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::request_dto::{
    CreateRequestRequest, RequestListQuery, RequestResponse, UpdateRequestRequest,
    UpdateRequestStatusRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ids::DocumentKind;
use crate::repositories::RequestStats;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_request).get(list_requests))
        .route("/stats", get(request_stats))
        .route("/:id", get(get_request).put(update_request).delete(delete_request))
        .route("/:id/status", put(update_request_status))
}

async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateRequestRequest>,
) -> Result<Json<ApiResponse<RequestResponse>>, AppError> {
    let controller = RequestController::new(&state);
    Ok(Json(controller.create(&user, request).await?))
}

async fn list_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<ApiResponse<Vec<RequestResponse>>>, AppError> {
    let controller = RequestController::new(&state);
    Ok(Json(controller.list(&user, query).await?))
}

async fn request_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<RequestStats>>, AppError> {
    let controller = RequestController::new(&state);
    Ok(Json(controller.stats(&user).await?))
}

async fn get_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RequestResponse>>, AppError> {
    let id = path_id(DocumentKind::Request, &id)?;
    let controller = RequestController::new(&state);
    Ok(Json(controller.get(&user, id).await?))
}

async fn update_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRequestRequest>,
) -> Result<Json<ApiResponse<RequestResponse>>, AppError> {
    let id = path_id(DocumentKind::Request, &id)?;
    let controller = RequestController::new(&state);
    Ok(Json(controller.update(&user, id, request).await?))
}

async fn update_request_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRequestStatusRequest>,
) -> Result<Json<ApiResponse<RequestResponse>>, AppError> {
    let id = path_id(DocumentKind::Request, &id)?;
    let controller = RequestController::new(&state);
    Ok(Json(controller.update_status(&user, id, request).await?))
}

async fn delete_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = path_id(DocumentKind::Request, &id)?;
    let controller = RequestController::new(&state);
    Ok(Json(controller.delete(&user, id).await?))
}
