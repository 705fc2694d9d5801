use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::user_dto::{UpdateProfileRequest, UserListQuery, UserResponse, VehicleEligibilityRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::user::UserRole;
use crate::repositories::{UserChanges, UserRepository};
use crate::services::AuthService;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, not_found_error, AppError};

pub struct UserController {
    users: Arc<UserRepository>,
    auth: Arc<AuthService>,
}

impl UserController {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            auth: state.auth.clone(),
        }
    }

    pub async fn profile(&self, user: &AuthenticatedUser) -> Result<ApiResponse<UserResponse>, AppError> {
        let profile = self
            .users
            .find_by_id(user.user_id)
            .await?
            .ok_or_else(|| not_found_error("Utilisateur", user.user_id))?;
        Ok(ApiResponse::success(UserResponse::from(profile)))
    }

    pub async fn update_profile(
        &self,
        user: &AuthenticatedUser,
        request: UpdateProfileRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        request.validate()?;
        let current = self
            .users
            .find_by_id(user.user_id)
            .await?
            .ok_or_else(|| not_found_error("Utilisateur", user.user_id))?;

        let password_hash = match (&request.new_password, &request.current_password) {
            (Some(new_password), Some(current_password)) => {
                Some(self.auth.change_password(&current, current_password, new_password).await?)
            }
            (Some(_), None) => {
                return Err(bad_request_error(
                    "Le mot de passe actuel est requis pour le modifier",
                ));
            }
            _ => None,
        };

        let changes = UserChanges {
            first_name: request.first_name.map(|s| s.trim().to_string()),
            last_name: request.last_name.map(|s| s.trim().to_string()),
            email: request.email,
            password_hash,
        };
        let updated = self
            .users
            .update(user.user_id, changes)
            .await?
            .ok_or_else(|| not_found_error("Utilisateur", user.user_id))?;

        Ok(ApiResponse::success_with_message(
            UserResponse::from(updated),
            "Profil mis à jour avec succès",
        ))
    }

    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        query: UserListQuery,
    ) -> Result<ApiResponse<Vec<UserResponse>>, AppError> {
        user.require_admin()?;

        let role = match query.role.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                UserRole::parse(raw).ok_or_else(|| bad_request_error(&format!("Rôle inconnu: {}", raw)))?,
            ),
        };

        let users = self
            .users
            .list(role, query.eligible.unwrap_or(false))
            .await?
            .into_iter()
            .map(UserResponse::from)
            .collect();
        Ok(ApiResponse::success(users))
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: i64) -> Result<ApiResponse<()>, AppError> {
        user.require_admin()?;
        if id == user.user_id {
            return Err(bad_request_error("Vous ne pouvez pas supprimer votre propre compte"));
        }
        if !self.users.delete(id).await? {
            return Err(not_found_error("Utilisateur", id));
        }

        info!("🗑️ Usuario {} eliminado por {}", id, user.user_id);
        Ok(ApiResponse::message("Utilisateur supprimé avec succès"))
    }

    pub async fn set_vehicle_eligibility(
        &self,
        user: &AuthenticatedUser,
        id: i64,
        request: VehicleEligibilityRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        user.require_admin()?;
        let updated = self
            .users
            .set_vehicle_eligibility(id, request.has_vehicle_assigned)
            .await?
            .ok_or_else(|| not_found_error("Utilisateur", id))?;

        Ok(ApiResponse::success_with_message(
            UserResponse::from(updated),
            "Autorisation d'attribution mise à jour",
        ))
    }
}
