use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, put},
    Extension, Json, Router,
};

use super::path_id;
use crate::controllers::UserController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::user_dto::{UpdateProfileRequest, UserListQuery, UserResponse, VehicleEligibilityRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ids::DocumentKind;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/:id", delete(delete_user))
        .route("/:id/vehicle-assignment", put(set_vehicle_eligibility))
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = UserController::new(&state);
    Ok(Json(controller.profile(&user).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = UserController::new(&state);
    Ok(Json(controller.update_profile(&user, request).await?))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, AppError> {
    let controller = UserController::new(&state);
    Ok(Json(controller.list(&user, query).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = path_id(DocumentKind::User, &id)?;
    let controller = UserController::new(&state);
    Ok(Json(controller.delete(&user, id).await?))
}

async fn set_vehicle_eligibility(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<VehicleEligibilityRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let id = path_id(DocumentKind::User, &id)?;
    let controller = UserController::new(&state);
    Ok(Json(controller.set_vehicle_eligibility(&user, id, request).await?))
}
