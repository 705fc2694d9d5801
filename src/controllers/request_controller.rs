use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::request_dto::{
    CreateRequestRequest, RequestListQuery, RequestResponse, UpdateRequestRequest,
    UpdateRequestStatusRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::notification::NotificationType;
use crate::models::request::{ChangeRequest, RequestStatus};
use crate::repositories::{
    NewNotification, NewRequest, RequestChanges, RequestRepository, RequestStats, UserRepository,
    VehicleRepository,
};
use crate::services::NotificationDispatcher;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, forbidden_error, not_found_error, AppError};

pub struct RequestController {
    requests: Arc<RequestRepository>,
    vehicles: Arc<VehicleRepository>,
    users: Arc<UserRepository>,
    notifier: NotificationDispatcher,
}

impl RequestController {
    pub fn new(state: &AppState) -> Self {
        Self {
            requests: state.requests.clone(),
            vehicles: state.vehicles.clone(),
            users: state.users.clone(),
            notifier: state.notifier.clone(),
        }
    }

    async fn find(&self, id: i64) -> Result<ChangeRequest, AppError> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Demande", id))
    }

    fn ensure_owner_or_admin(user: &AuthenticatedUser, request: &ChangeRequest) -> Result<(), AppError> {
        if user.is_admin() || request.user_id == user.user_id {
            Ok(())
        } else {
            Err(forbidden_error("Vous n'avez pas accès à cette demande"))
        }
    }

    async fn ensure_vehicle_exists(&self, vehicle_id: i64) -> Result<(), AppError> {
        if self.vehicles.find_by_id(vehicle_id).await?.is_none() {
            return Err(not_found_error("Véhicule", vehicle_id));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        request: CreateRequestRequest,
    ) -> Result<ApiResponse<RequestResponse>, AppError> {
        request.validate()?;
        if let Some(vehicle_id) = request.vehicle_id {
            self.ensure_vehicle_exists(vehicle_id).await?;
        }

        let created = self
            .requests
            .create(NewRequest {
                user_id: user.user_id,
                request_type: request.request_type.trim().to_string(),
                details: request.details,
                vehicle_id: request.vehicle_id,
            })
            .await?;

        let request_id = created.id;
        let message = format!("Nouvelle demande '{}' de {}", created.request_type, user.email);
        let vehicle_id = created.vehicle_id;
        self.notifier
            .notify_admins(&self.users, Some(user.user_id), |admin_id| {
                let notification = NewNotification::new(
                    admin_id,
                    NotificationType::RequestCreated,
                    "Nouvelle demande",
                    message.clone(),
                )
                .with_request(request_id);
                match vehicle_id {
                    Some(vehicle) => notification.with_vehicle(vehicle),
                    None => notification,
                }
            })
            .await;

        Ok(ApiResponse::success_with_message(
            RequestResponse::from(created),
            "Demande créée avec succès",
        ))
    }

    /// Admin: todas; resto: las propias
    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        query: RequestListQuery,
    ) -> Result<ApiResponse<Vec<RequestResponse>>, AppError> {
        let status = match query.status.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                RequestStatus::parse(raw)
                    .ok_or_else(|| bad_request_error(&format!("Statut de demande inconnu: {}", raw)))?,
            ),
        };
        let owner = if user.is_admin() { None } else { Some(user.user_id) };

        let requests = self
            .requests
            .list(owner, status)
            .await?
            .into_iter()
            .map(RequestResponse::from)
            .collect();
        Ok(ApiResponse::success(requests))
    }

    pub async fn get(&self, user: &AuthenticatedUser, id: i64) -> Result<ApiResponse<RequestResponse>, AppError> {
        let request = self.find(id).await?;
        Self::ensure_owner_or_admin(user, &request)?;
        Ok(ApiResponse::success(RequestResponse::from(request)))
    }

    /// Sólo el autor, y sólo mientras está pendiente
    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: i64,
        request: UpdateRequestRequest,
    ) -> Result<ApiResponse<RequestResponse>, AppError> {
        request.validate()?;
        let current = self.find(id).await?;
        if current.user_id != user.user_id {
            return Err(forbidden_error("Seul l'auteur peut modifier cette demande"));
        }
        if current.status != RequestStatus::Pending {
            return Err(bad_request_error("Seules les demandes en attente peuvent être modifiées"));
        }
        if let Some(Some(vehicle_id)) = request.vehicle_id {
            self.ensure_vehicle_exists(vehicle_id).await?;
        }

        let updated = self
            .requests
            .update(
                id,
                RequestChanges {
                    request_type: request.request_type.map(|t| t.trim().to_string()),
                    details: request.details,
                    vehicle_id: request.vehicle_id,
                },
            )
            .await?
            .ok_or_else(|| not_found_error("Demande", id))?;
        Ok(ApiResponse::success_with_message(
            RequestResponse::from(updated),
            "Demande mise à jour",
        ))
    }

    pub async fn update_status(
        &self,
        user: &AuthenticatedUser,
        id: i64,
        request: UpdateRequestStatusRequest,
    ) -> Result<ApiResponse<RequestResponse>, AppError> {
        user.require_admin()?;
        request.validate()?;
        let status = request
            .parsed_status()
            .ok_or_else(|| bad_request_error("Statut de demande invalide"))?;
        self.find(id).await?;

        let updated = self
            .requests
            .update_status(id, status, request.admin_response, user.user_id)
            .await?
            .ok_or_else(|| not_found_error("Demande", id))?;

        info!("📋 Solicitud {} pasa a {} por {}", id, status.as_str(), user.user_id);
        self.notifier.notify(
            NewNotification::new(
                updated.user_id,
                NotificationType::RequestStatusChanged,
                "Demande mise à jour",
                format!("Votre demande '{}' est {}", updated.request_type, status.label_fr()),
            )
            .with_request(updated.id),
        );

        Ok(ApiResponse::success_with_message(
            RequestResponse::from(updated),
            "Statut de la demande mis à jour",
        ))
    }

    /// El autor mientras está pendiente, o un administrador
    pub async fn delete(&self, user: &AuthenticatedUser, id: i64) -> Result<ApiResponse<()>, AppError> {
        let current = self.find(id).await?;
        if !user.is_admin() {
            if current.user_id != user.user_id {
                return Err(forbidden_error("Vous n'avez pas accès à cette demande"));
            }
            if current.status != RequestStatus::Pending {
                return Err(bad_request_error("Seules les demandes en attente peuvent être supprimées"));
            }
        }

        if !self.requests.delete(id).await? {
            return Err(not_found_error("Demande", id));
        }
        Ok(ApiResponse::message("Demande supprimée avec succès"))
    }

    pub async fn stats(&self, user: &AuthenticatedUser) -> Result<ApiResponse<RequestStats>, AppError> {
        user.require_admin()?;
        Ok(ApiResponse::success(self.requests.stats().await?))
    }
}
