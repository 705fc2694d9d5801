use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};

use super::path_id;
use crate::controllers::VehicleController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::vehicle_dto::{
    AssignVehicleRequest, CreateVehicleRequest, LocationHistoryResponse, UpdateLocationRequest,
    UpdateVehicleRequest, VehicleListQuery, VehicleResponse,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ids::DocumentKind;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn vehicle_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_vehicle).get(list_vehicles))
        .route("/:id", get(get_vehicle).put(update_vehicle).delete(delete_vehicle))
        .route("/:id/assign", post(assign_vehicle))
        .route("/:id/location", put(update_location))
        .route("/:id/location-history", get(location_history))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.create(&user, request).await?;
    Ok(Json(response))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<VehicleListQuery>,
) -> Result<Json<ApiResponse<Vec<VehicleResponse>>>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.list(&user, query).await?;
    Ok(Json(response))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let id = path_id(DocumentKind::Vehicle, &id)?;
    let controller = VehicleController::new(&state);
    let response = controller.get(&user, id).await?;
    Ok(Json(response))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let id = path_id(DocumentKind::Vehicle, &id)?;
    let controller = VehicleController::new(&state);
    let response = controller.update(&user, id, request).await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = path_id(DocumentKind::Vehicle, &id)?;
    let controller = VehicleController::new(&state);
    let response = controller.delete(&user, id).await?;
    Ok(Json(response))
}

async fn assign_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<AssignVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let id = path_id(DocumentKind::Vehicle, &id)?;
    let controller = VehicleController::new(&state);
    let response = controller.assign(&user, id, request).await?;
    Ok(Json(response))
}

async fn update_location(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let id = path_id(DocumentKind::Vehicle, &id)?;
    let controller = VehicleController::new(&state);
    let response = controller.update_location(&user, id, request).await?;
    Ok(Json(response))
}

async fn location_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<LocationHistoryResponse>>>, AppError> {
    let id = path_id(DocumentKind::Vehicle, &id)?;
    let controller = VehicleController::new(&state);
    let response = controller.location_history(&user, id).await?;
    Ok(Json(response))
}
