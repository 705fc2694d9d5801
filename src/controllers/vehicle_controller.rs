use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::vehicle_dto::{
    AssignVehicleRequest, CreateVehicleRequest, LocationHistoryResponse, UpdateLocationRequest,
    UpdateVehicleRequest, VehicleListQuery, VehicleResponse,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::notification::NotificationType;
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::repositories::{
    NewNotification, NewVehicle, UserRepository, VehicleChanges, VehicleFilters, VehicleRepository,
};
use crate::services::NotificationDispatcher;
use crate::state::{AppState, VehicleListCache};
use crate::utils::errors::{bad_request_error, forbidden_error, not_found_error, AppError};
use crate::utils::validation::normalize_license_plate;

pub struct VehicleController {
    vehicles: Arc<VehicleRepository>,
    users: Arc<UserRepository>,
    notifier: NotificationDispatcher,
    cache: Arc<VehicleListCache>,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            vehicles: state.vehicles.clone(),
            users: state.users.clone(),
            notifier: state.notifier.clone(),
            cache: state.vehicle_cache.clone(),
        }
    }

    async fn find(&self, id: i64) -> Result<Vehicle, AppError> {
        self.vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Véhicule", id))
    }

    /// Admin o empleado al que está asignado el vehículo
    fn ensure_admin_or_assignee(user: &AuthenticatedUser, vehicle: &Vehicle) -> Result<(), AppError> {
        if user.is_admin() || vehicle.assigned_to == Some(user.user_id) {
            Ok(())
        } else {
            Err(forbidden_error("Ce véhicule ne vous est pas attribué"))
        }
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        request: CreateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        user.require_admin()?;
        request.validate()?;

        let license_plate = normalize_license_plate(&request.license_plate);
        if self.vehicles.license_plate_exists(&license_plate).await? {
            return Err(AppError::Conflict(format!(
                "Un véhicule avec la plaque {} existe déjà",
                license_plate
            )));
        }

        let vehicle = self
            .vehicles
            .create(NewVehicle {
                location: request.location(),
                model: request.model.trim().to_string(),
                license_plate,
                address: request.address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            })
            .await?;
        self.cache.invalidate_all().await;

        info!("🚗 Vehículo {} creado por {}", vehicle.id, user.user_id);
        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Véhicule créé avec succès",
        ))
    }

    pub async fn list(
        &self,
        _user: &AuthenticatedUser,
        query: VehicleListQuery,
    ) -> Result<ApiResponse<Vec<VehicleResponse>>, AppError> {
        let status = match query.status.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                VehicleStatus::parse(raw)
                    .ok_or_else(|| bad_request_error(&format!("Statut de véhicule inconnu: {}", raw)))?,
            ),
        };
        let filters = VehicleFilters {
            status,
            assigned_to: query.user_id,
        };

        if let Some(cached) = self.cache.get(&filters).await {
            return Ok(ApiResponse::success(cached));
        }

        let generation = self.cache.generation();
        let vehicles: Vec<VehicleResponse> = self
            .vehicles
            .list(&filters)
            .await?
            .into_iter()
            .map(VehicleResponse::from)
            .collect();
        self.cache.insert(filters, vehicles.clone(), generation).await;
        Ok(ApiResponse::success(vehicles))
    }

    pub async fn get(&self, _user: &AuthenticatedUser, id: i64) -> Result<ApiResponse<VehicleResponse>, AppError> {
        let vehicle = self.find(id).await?;
        Ok(ApiResponse::success(VehicleResponse::from(vehicle)))
    }

    /// Metadatos. El estado `assigned` sólo se alcanza por la asignación.
    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: i64,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        user.require_admin()?;
        request.validate()?;
        let current = self.find(id).await?;

        let status = request.parsed_status();
        match status {
            Some(VehicleStatus::Assigned) => {
                return Err(bad_request_error(
                    "Utilisez l'attribution pour passer un véhicule au statut 'assigned'",
                ));
            }
            Some(new_status) if current.status == VehicleStatus::Assigned && new_status != current.status => {
                return Err(bad_request_error(
                    "Ce véhicule est attribué: retirez l'attribution avant de changer son statut",
                ));
            }
            _ => {}
        }

        let license_plate = request.license_plate.as_deref().map(normalize_license_plate);
        if let Some(plate) = &license_plate {
            if *plate != current.license_plate && self.vehicles.license_plate_exists(plate).await? {
                return Err(AppError::Conflict(format!(
                    "Un véhicule avec la plaque {} existe déjà",
                    plate
                )));
            }
        }

        let changes = VehicleChanges {
            model: request.model.map(|m| m.trim().to_string()),
            license_plate,
            status,
            address: request.address,
        };
        let vehicle = self
            .vehicles
            .update(id, changes)
            .await?
            .ok_or_else(|| not_found_error("Véhicule", id))?;
        self.cache.invalidate_all().await;

        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Véhicule mis à jour avec succès",
        ))
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: i64) -> Result<ApiResponse<()>, AppError> {
        user.require_admin()?;
        if !self.vehicles.delete(id).await? {
            return Err(not_found_error("Véhicule", id));
        }
        self.cache.invalidate_all().await;

        info!("🗑️ Vehículo {} eliminado por {}", id, user.user_id);
        Ok(ApiResponse::message("Véhicule supprimé avec succès"))
    }

    pub async fn assign(
        &self,
        user: &AuthenticatedUser,
        id: i64,
        request: AssignVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        user.require_admin()?;
        let current = self.find(id).await?;

        let assignee = match request.user_id {
            Some(user_id) => {
                let target = self
                    .users
                    .find_by_id(user_id)
                    .await?
                    .ok_or_else(|| not_found_error("Utilisateur", user_id))?;
                if !target.has_vehicle_assigned {
                    return Err(bad_request_error(&format!(
                        "{} n'est pas autorisé(e) à recevoir un véhicule",
                        target.full_name()
                    )));
                }
                Some(target)
            }
            None => None,
        };

        let assignee_id = assignee.as_ref().map(|u| u.id);
        if !self.vehicles.assign_to_user(id, assignee_id).await? {
            return Err(not_found_error("Véhicule", id));
        }
        self.cache.invalidate_all().await;

        let vehicle = self.find(id).await?;
        let label = format!("{} ({})", vehicle.model, vehicle.license_plate);

        if let Some(previous) = current.assigned_to.filter(|prev| Some(*prev) != assignee_id) {
            self.notifier.notify(
                NewNotification::new(
                    previous,
                    NotificationType::VehicleUnassigned,
                    "Véhicule retiré",
                    format!("Le véhicule {} ne vous est plus attribué", label),
                )
                .with_vehicle(id),
            );
        }
        if let Some(new_assignee) = assignee_id.filter(|new| current.assigned_to != Some(*new)) {
            self.notifier.notify(
                NewNotification::new(
                    new_assignee,
                    NotificationType::VehicleAssigned,
                    "Véhicule attribué",
                    format!("Le véhicule {} vous a été attribué", label),
                )
                .with_vehicle(id),
            );
        }

        let message = match &assignee {
            Some(target) => format!("Véhicule attribué à {}", target.full_name()),
            None => "Attribution du véhicule retirée".to_string(),
        };
        Ok(ApiResponse::success_with_message(VehicleResponse::from(vehicle), message))
    }

    pub async fn update_location(
        &self,
        user: &AuthenticatedUser,
        id: i64,
        request: UpdateLocationRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;
        let vehicle = self.find(id).await?;
        Self::ensure_admin_or_assignee(user, &vehicle)?;

        let address = request.address.trim();
        if !self
            .vehicles
            .update_location(id, address, request.latitude, request.longitude, user.user_id)
            .await?
        {
            return Err(not_found_error("Véhicule", id));
        }
        self.cache.invalidate_all().await;

        if !user.is_admin() {
            let message = format!(
                "Le véhicule {} ({}) a été déplacé: {}",
                vehicle.model, vehicle.license_plate, address
            );
            self.notifier
                .notify_admins(&self.users, Some(user.user_id), |admin_id| {
                    NewNotification::new(
                        admin_id,
                        NotificationType::LocationChanged,
                        "Changement d'adresse",
                        message.clone(),
                    )
                    .with_vehicle(id)
                })
                .await;
        }

        let updated = self.find(id).await?;
        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(updated),
            "Adresse du véhicule mise à jour",
        ))
    }

    pub async fn location_history(
        &self,
        user: &AuthenticatedUser,
        id: i64,
    ) -> Result<ApiResponse<Vec<LocationHistoryResponse>>, AppError> {
        let vehicle = self.find(id).await?;
        Self::ensure_admin_or_assignee(user, &vehicle)?;

        let history = self
            .vehicles
            .location_history(id)
            .await?
            .into_iter()
            .map(LocationHistoryResponse::from)
            .collect();
        Ok(ApiResponse::success(history))
    }
}
