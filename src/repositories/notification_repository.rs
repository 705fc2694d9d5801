use chrono::Utc;
use serde_json::json;

use crate::models::ids::{next_document_number, store_id, DocumentKind};
use crate::models::notification::{Notification, NotificationType};
use crate::store::{fields, DocumentQuery, Patch, SharedStore, Transaction};
use crate::utils::errors::AppError;

use super::decode_listed;

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_vehicle: Option<i64>,
    pub related_request: Option<i64>,
    pub related_message: Option<i64>,
}

impl NewNotification {
    pub fn new(
        user_id: i64,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            notification_type,
            title: title.into(),
            message: message.into(),
            related_vehicle: None,
            related_request: None,
            related_message: None,
        }
    }

    pub fn with_vehicle(mut self, vehicle_id: i64) -> Self {
        self.related_vehicle = Some(vehicle_id);
        self
    }

    pub fn with_request(mut self, request_id: i64) -> Self {
        self.related_request = Some(request_id);
        self
    }

    pub fn with_message(mut self, message_id: i64) -> Self {
        self.related_message = Some(message_id);
        self
    }
}

pub struct NotificationRepository {
    store: SharedStore,
}

impl NotificationRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, new_notification: NewNotification) -> Result<Notification, AppError> {
        let notification = Notification {
            id: next_document_number(),
            user_id: new_notification.user_id,
            notification_type: new_notification.notification_type,
            title: new_notification.title,
            message: new_notification.message,
            is_read: false,
            related_vehicle: new_notification.related_vehicle,
            related_request: new_notification.related_request,
            related_message: new_notification.related_message,
            created_at: Utc::now(),
        };

        let saved = self
            .store
            .commit(Transaction::new().create(notification.to_document()))
            .await?;
        match saved.first() {
            Some(doc) => Ok(Notification::try_from(doc)?),
            None => Err(AppError::Internal("Création de notification sans résultat".to_string())),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Notification>, AppError> {
        let doc = self.store.get(&store_id(DocumentKind::Notification, id)).await?;
        Ok(doc.as_ref().map(Notification::try_from).transpose()?)
    }

    fn user_query(user_id: i64) -> DocumentQuery {
        DocumentQuery::of_type(DocumentKind::Notification.as_str())
            .eq(fields::reference_path("user"), store_id(DocumentKind::User, user_id))
    }

    pub async fn list_for_user(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>, AppError> {
        let mut query = Self::user_query(user_id).newest_first();
        if unread_only {
            query = query.eq("isRead", false);
        }

        let docs = self.store.list(&query).await?;
        Ok(decode_listed(&docs))
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<usize, AppError> {
        Ok(self.store.count(&Self::user_query(user_id).eq("isRead", false)).await?)
    }

    pub async fn mark_as_read(&self, id: i64) -> Result<Option<Notification>, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(None);
        }
        let patch = Patch::new(store_id(DocumentKind::Notification, id)).set("isRead", json!(true));
        let saved = self.store.commit(Transaction::new().patch(patch)).await?;
        Ok(saved.first().map(Notification::try_from).transpose()?)
    }

    /// Marca todas las no leídas del usuario en una sola transacción
    pub async fn mark_all_as_read(&self, user_id: i64) -> Result<usize, AppError> {
        let unread = self
            .store
            .list(&Self::user_query(user_id).eq("isRead", false))
            .await?;
        if unread.is_empty() {
            return Ok(0);
        }

        let count = unread.len();
        let transaction = unread.into_iter().fold(Transaction::new(), |tx, doc| {
            tx.patch(Patch::new(doc.id).set("isRead", json!(true)))
        });
        self.store.commit(transaction).await?;
        Ok(count)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(false);
        }
        self.store
            .commit(Transaction::new().delete(store_id(DocumentKind::Notification, id)))
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use std::sync::Arc;

    fn assigned(user_id: i64) -> NewNotification {
        NewNotification::new(user_id, NotificationType::VehicleAssigned, "Véhicule attribué", "Clio AB-123-CD")
            .with_vehicle(5)
    }

    #[tokio::test]
    async fn test_unread_lifecycle() {
        let repo = NotificationRepository::new(Arc::new(MemoryDocumentStore::new()));
        let first = repo.create(assigned(2)).await.unwrap();
        repo.create(assigned(2)).await.unwrap();
        repo.create(assigned(3)).await.unwrap();

        assert_eq!(first.related_vehicle, Some(5));
        assert_eq!(repo.unread_count(2).await.unwrap(), 2);

        repo.mark_as_read(first.id).await.unwrap();
        assert_eq!(repo.list_for_user(2, true).await.unwrap().len(), 1);
        assert_eq!(repo.list_for_user(2, false).await.unwrap().len(), 2);

        assert_eq!(repo.mark_all_as_read(2).await.unwrap(), 1);
        assert_eq!(repo.unread_count(2).await.unwrap(), 0);
        assert_eq!(repo.unread_count(3).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_notification() {
        let repo = NotificationRepository::new(Arc::new(MemoryDocumentStore::new()));
        assert!(repo.mark_as_read(42).await.unwrap().is_none());
        assert!(!repo.delete(42).await.unwrap());
    }
}
