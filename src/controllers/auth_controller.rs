use std::sync::Arc;

use validator::Validate;

use crate::dto::auth_dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::dto::common_dto::ApiResponse;
use crate::dto::user_dto::UserResponse;
use crate::services::auth_service::{AuthService, Registration};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct AuthController {
    auth: Arc<AuthService>,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            auth: state.auth.clone(),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<ApiResponse<AuthResponse>, AppError> {
        request.validate()?;

        let (user, token) = self
            .auth
            .register(Registration {
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                email: request.email,
                password: request.password,
            })
            .await?;

        Ok(ApiResponse::success_with_message(
            AuthResponse {
                token,
                user: UserResponse::from(user),
            },
            "Compte créé avec succès",
        ))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<ApiResponse<AuthResponse>, AppError> {
        request.validate()?;

        let (user, token) = self.auth.login(&request.email, &request.password).await?;
        Ok(ApiResponse::success_with_message(
            AuthResponse {
                token,
                user: UserResponse::from(user),
            },
            "Connexion réussie",
        ))
    }
}
