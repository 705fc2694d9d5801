use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{User, UserRole};

/// Usuario tal como lo ve el cliente: nunca incluye el hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(rename = "has_vehicle_assigned")]
    pub has_vehicle_assigned: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            has_vehicle_assigned: user.has_vehicle_assigned,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    pub current_password: Option<String>,

    #[validate(length(min = 6, max = 100))]
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VehicleEligibilityRequest {
    #[serde(alias = "hasVehicleAssigned")]
    pub has_vehicle_assigned: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    /// Sólo usuarios habilitados para recibir un vehículo
    pub eligible: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_hides_password() {
        let user = User {
            id: 7,
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            email: "jean@remisage.fr".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            role: UserRole::Employee,
            has_vehicle_assigned: true,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["firstName"], "Jean");
        assert_eq!(value["has_vehicle_assigned"], true);
        assert_eq!(value["role"], "employee");
    }
}
