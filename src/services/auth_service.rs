//! Servicio de autenticación
//!
//! Registro, login y arranque del administrador inicial. Los hashes se
//! calculan con bcrypt y los tokens se emiten con `utils::jwt`.

use std::sync::Arc;

use bcrypt::{hash, verify};
use tracing::{info, warn};

use crate::models::user::{User, UserRole};
use crate::repositories::{NewUser, UserRepository};
use crate::utils::errors::AppError;
use crate::utils::jwt::{generate_token, JwtConfig};

pub struct AuthService {
    users: Arc<UserRepository>,
    jwt: JwtConfig,
    bcrypt_cost: u32,
}

/// Datos de alta de un empleado
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl AuthService {
    pub fn new(users: Arc<UserRepository>, jwt: JwtConfig, bcrypt_cost: u32) -> Self {
        Self {
            users,
            jwt,
            bcrypt_cost,
        }
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.bcrypt_cost).map_err(|e| AppError::Hash(e.to_string()))
    }

    fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
        verify(password, password_hash).map_err(|e| AppError::Hash(e.to_string()))
    }

    /// Alta pública: siempre crea un empleado
    pub async fn register(&self, registration: Registration) -> Result<(User, String), AppError> {
        if self.users.email_exists(&registration.email).await? {
            return Err(AppError::Conflict("Un compte existe déjà avec cet email".to_string()));
        }

        let password_hash = self.hash_password(&registration.password)?;
        let user = self
            .users
            .create(NewUser {
                first_name: registration.first_name,
                last_name: registration.last_name,
                email: registration.email,
                password_hash,
                role: UserRole::Employee,
                has_vehicle_assigned: false,
            })
            .await?;

        info!("👤 Nuevo empleado registrado: {}", user.id);
        let token = generate_token(&user, &self.jwt)?;
        Ok((user, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AppError> {
        let invalid = || AppError::Unauthorized("Email ou mot de passe incorrect".to_string());

        let user = self.users.find_by_email(email).await?.ok_or_else(invalid)?;
        if !Self::verify_password(password, &user.password_hash)? {
            warn!("🔐 Intento de login fallido para el usuario {}", user.id);
            return Err(invalid());
        }

        let token = generate_token(&user, &self.jwt)?;
        Ok((user, token))
    }

    /// Cambio de contraseña: exige la contraseña actual
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<String, AppError> {
        if !Self::verify_password(current_password, &user.password_hash)? {
            return Err(AppError::BadRequest("Le mot de passe actuel est incorrect".to_string()));
        }
        self.hash_password(new_password)
    }

    /// Crea el administrador configurado si todavía no existe
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<Option<User>, AppError> {
        if self.users.email_exists(email).await? {
            return Ok(None);
        }

        let admin = self
            .users
            .create(NewUser {
                first_name: "Admin".to_string(),
                last_name: "Remisage".to_string(),
                email: email.to_string(),
                password_hash: self.hash_password(password)?,
                role: UserRole::Admin,
                has_vehicle_assigned: false,
            })
            .await?;
        info!("🛡️ Administrador inicial creado: {}", admin.email);
        Ok(Some(admin))
    }
}
