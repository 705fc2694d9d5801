//! Modelo de User
//!
//! Mapea el documento `user` del almacén. El hash de la contraseña vive en el
//! campo `password` y nunca se serializa hacia el cliente.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};

use super::ids::{store_id, DocumentKind};
use crate::store::{fields, Document, StoreError};

/// Rol del usuario
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Employee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Employee => "employee",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(UserRole::Admin),
            "employee" => Some(UserRole::Employee),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    /// Habilita al usuario para recibir un vehículo
    pub has_vehicle_assigned: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn to_document(&self) -> Document {
        let mut body = Map::new();
        body.insert("firstName".into(), json!(self.first_name));
        body.insert("lastName".into(), json!(self.last_name));
        body.insert("email".into(), json!(self.email));
        body.insert("password".into(), json!(self.password_hash));
        body.insert("role".into(), json!(self.role.as_str()));
        body.insert("has_vehicle_assigned".into(), json!(self.has_vehicle_assigned));
        Document::new(store_id(DocumentKind::User, self.id), DocumentKind::User.as_str(), body)
            .with_created_at(self.created_at)
    }
}

impl TryFrom<&Document> for User {
    type Error = StoreError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        let role_raw = fields::required_str(doc, "role")?;
        let role = UserRole::parse(&role_raw).ok_or_else(|| StoreError::Corrupt {
            id: doc.id.clone(),
            reason: format!("unknown role '{}'", role_raw),
        })?;

        Ok(User {
            id: fields::own_number(doc, DocumentKind::User)?,
            first_name: fields::optional_str(doc, "firstName").unwrap_or_default(),
            last_name: fields::optional_str(doc, "lastName").unwrap_or_default(),
            email: fields::required_str(doc, "email")?,
            password_hash: fields::optional_str(doc, "password").unwrap_or_default(),
            role,
            has_vehicle_assigned: fields::bool_or(doc, "has_vehicle_assigned", false),
            created_at: doc.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_document_round_trip() {
        let user = User {
            id: 42,
            first_name: "Camille".to_string(),
            last_name: "Martin".to_string(),
            email: "camille@remisage.fr".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            role: UserRole::Employee,
            has_vehicle_assigned: true,
            created_at: Utc::now(),
        };

        let doc = user.to_document();
        assert_eq!(doc.id, "user-42");
        assert_eq!(doc.fields["role"], "employee");
        assert_eq!(User::try_from(&doc).unwrap(), user);
    }

    #[test]
    fn test_unknown_role_is_corrupt() {
        let mut body = Map::new();
        body.insert("email".into(), json!("x@y.fr"));
        body.insert("role".into(), json!("superuser"));
        let doc = Document::new("user-1", "user", body);
        assert!(matches!(User::try_from(&doc), Err(StoreError::Corrupt { .. })));
    }
}
