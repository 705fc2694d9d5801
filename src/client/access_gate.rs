//! Puerta de acceso por rol para las vistas del cliente

use crate::models::user::UserRole;

/// Resultado de la carga del perfil tras detectar un token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFetch {
    Pending,
    Failed,
    Loaded(UserRole),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessState {
    Loading,
    Unauthenticated,
    WrongRole { redirect: &'static str },
    Authorized,
}

/// Página de inicio de cada rol
pub fn home_route(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "/dashboard",
        UserRole::Employee => "/employee-dashboard",
    }
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    allowed: Vec<UserRole>,
}

impl RouteGuard {
    pub fn new(allowed: impl Into<Vec<UserRole>>) -> Self {
        Self { allowed: allowed.into() }
    }

    pub fn admin_only() -> Self {
        Self::new([UserRole::Admin])
    }

    pub fn employee_only() -> Self {
        Self::new([UserRole::Employee])
    }

    pub fn authenticated() -> Self {
        Self::new([UserRole::Admin, UserRole::Employee])
    }

    /// Sin token no hay sesión. Un perfil pendiente queda en `Loading` sin
    /// límite de tiempo; un perfil fallido equivale a no estar autenticado.
    pub fn evaluate(&self, token_present: bool, profile: ProfileFetch) -> AccessState {
        if !token_present {
            return AccessState::Unauthenticated;
        }

        match profile {
            ProfileFetch::Pending => AccessState::Loading,
            ProfileFetch::Failed => AccessState::Unauthenticated,
            ProfileFetch::Loaded(role) if self.allowed.contains(&role) => AccessState::Authorized,
            ProfileFetch::Loaded(role) => AccessState::WrongRole {
                redirect: home_route(role),
            },
        }
    }
}
