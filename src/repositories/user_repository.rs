use chrono::Utc;
use serde_json::json;

use crate::models::ids::{next_document_number, store_id, DocumentKind};
use crate::models::user::{User, UserRole};
use crate::store::{DocumentQuery, Patch, SharedStore, Transaction, UniqueConstraint};
use crate::utils::errors::AppError;

use super::decode_listed;

/// Datos para crear un usuario; la contraseña ya viene hasheada
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub has_vehicle_assigned: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

pub struct UserRepository {
    store: SharedStore,
}

fn email_constraint(email: &str) -> UniqueConstraint {
    UniqueConstraint::new(DocumentKind::User.as_str(), "email", email)
}

impl UserRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        self.create_with_id(next_document_number(), new_user).await
    }

    /// Crea con un ID conocido (importaciones, fixtures)
    pub async fn create_with_id(&self, id: i64, new_user: NewUser) -> Result<User, AppError> {
        let email = new_user.email.trim().to_lowercase();
        let user = User {
            id,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: email.clone(),
            password_hash: new_user.password_hash,
            role: new_user.role,
            has_vehicle_assigned: new_user.has_vehicle_assigned,
            created_at: Utc::now(),
        };

        let saved = self
            .store
            .commit(
                Transaction::new()
                    .create(user.to_document())
                    .require_unique(email_constraint(&email)),
            )
            .await?;

        match saved.first() {
            Some(doc) => Ok(User::try_from(doc)?),
            None => Err(AppError::Internal("Création d'utilisateur sans résultat".to_string())),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let doc = self.store.get(&store_id(DocumentKind::User, id)).await?;
        Ok(doc.as_ref().map(User::try_from).transpose()?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let docs = self
            .store
            .list(
                &DocumentQuery::of_type(DocumentKind::User.as_str())
                    .eq("email", email.trim().to_lowercase())
                    .limit(1),
            )
            .await?;
        Ok(docs.first().map(User::try_from).transpose()?)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    pub async fn list(&self, role: Option<UserRole>, eligible_only: bool) -> Result<Vec<User>, AppError> {
        let mut query = DocumentQuery::of_type(DocumentKind::User.as_str());
        if let Some(role) = role {
            query = query.eq("role", role.as_str());
        }
        if eligible_only {
            query = query.eq("has_vehicle_assigned", true);
        }

        let docs = self.store.list(&query).await?;
        Ok(decode_listed(&docs))
    }

    pub async fn list_admin_ids(&self) -> Result<Vec<i64>, AppError> {
        Ok(self
            .list(Some(UserRole::Admin), false)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect())
    }

    pub async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let doc_id = store_id(DocumentKind::User, id);
        let mut patch = Patch::new(doc_id.clone());
        let mut transaction = Transaction::new();

        if let Some(first_name) = changes.first_name {
            patch = patch.set("firstName", first_name);
        }
        if let Some(last_name) = changes.last_name {
            patch = patch.set("lastName", last_name);
        }
        if let Some(email) = changes.email {
            let email = email.trim().to_lowercase();
            transaction = transaction.require_unique(email_constraint(&email).except(doc_id));
            patch = patch.set("email", email);
        }
        if let Some(password_hash) = changes.password_hash {
            patch = patch.set("password", password_hash);
        }

        let saved = self.store.commit(transaction.patch(patch)).await?;
        Ok(saved.first().map(User::try_from).transpose()?)
    }

    /// Actualiza la habilitación del usuario para recibir un vehículo
    pub async fn set_vehicle_eligibility(&self, id: i64, eligible: bool) -> Result<Option<User>, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(None);
        }
        let patch = Patch::new(store_id(DocumentKind::User, id)).set("has_vehicle_assigned", json!(eligible));
        let saved = self.store.commit(Transaction::new().patch(patch)).await?;
        Ok(saved.first().map(User::try_from).transpose()?)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(false);
        }
        self.store
            .commit(Transaction::new().delete(store_id(DocumentKind::User, id)))
            .await?;
        Ok(true)
    }
}
