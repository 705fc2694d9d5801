use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::ids::{next_document_number, store_id, DocumentKind};
use crate::models::request::{ChangeRequest, RequestStatus};
use crate::store::{fields, DocumentQuery, Patch, SharedStore, Transaction};
use crate::utils::errors::AppError;

use super::decode_listed;

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub user_id: i64,
    pub request_type: String,
    pub details: String,
    pub vehicle_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestChanges {
    pub request_type: Option<String>,
    pub details: Option<String>,
    /// `Some(None)` desvincula el vehículo
    pub vehicle_id: Option<Option<i64>>,
}

/// Totales por estado y por tipo
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestStats {
    pub total: usize,
    #[serde(rename = "byStatus")]
    pub by_status: BTreeMap<String, usize>,
    #[serde(rename = "byType")]
    pub by_type: BTreeMap<String, usize>,
}

pub struct RequestRepository {
    store: SharedStore,
}

impl RequestRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, new_request: NewRequest) -> Result<ChangeRequest, AppError> {
        let now = Utc::now();
        let request = ChangeRequest {
            id: next_document_number(),
            user_id: new_request.user_id,
            request_type: new_request.request_type,
            details: new_request.details,
            vehicle_id: new_request.vehicle_id,
            status: RequestStatus::Pending,
            admin_response: None,
            resolved_by: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        };

        let saved = self
            .store
            .commit(Transaction::new().create(request.to_document()))
            .await?;
        match saved.first() {
            Some(doc) => Ok(ChangeRequest::try_from(doc)?),
            None => Err(AppError::Internal("Création de demande sans résultat".to_string())),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ChangeRequest>, AppError> {
        let doc = self.store.get(&store_id(DocumentKind::Request, id)).await?;
        Ok(doc.as_ref().map(ChangeRequest::try_from).transpose()?)
    }

    /// Lista del más reciente al más antiguo; `user_id` restringe a un autor
    pub async fn list(
        &self,
        user_id: Option<i64>,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ChangeRequest>, AppError> {
        let mut query = DocumentQuery::of_type(DocumentKind::Request.as_str()).newest_first();
        if let Some(user_id) = user_id {
            query = query.eq(fields::reference_path("user"), store_id(DocumentKind::User, user_id));
        }
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }

        let docs = self.store.list(&query).await?;
        Ok(decode_listed(&docs))
    }

    pub async fn update(&self, id: i64, changes: RequestChanges) -> Result<Option<ChangeRequest>, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let mut patch = Patch::new(store_id(DocumentKind::Request, id));
        if let Some(request_type) = changes.request_type {
            patch = patch.set("type", request_type);
        }
        if let Some(details) = changes.details {
            patch = patch.set("details", details);
        }
        if let Some(vehicle_id) = changes.vehicle_id {
            let value = vehicle_id
                .map(|v| fields::reference(DocumentKind::Vehicle, v))
                .unwrap_or(Value::Null);
            patch = patch.set("vehicle", value);
        }

        let saved = self.store.commit(Transaction::new().patch(patch)).await?;
        Ok(saved.first().map(ChangeRequest::try_from).transpose()?)
    }

    /// Cambio de estado por un administrador. Los estados finales registran
    /// quién resolvió y cuándo.
    pub async fn update_status(
        &self,
        id: i64,
        status: RequestStatus,
        admin_response: Option<String>,
        admin_id: i64,
    ) -> Result<Option<ChangeRequest>, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let mut patch = Patch::new(store_id(DocumentKind::Request, id)).set("status", status.as_str());
        if let Some(response) = admin_response {
            patch = patch.set("adminResponse", response);
        }
        if status == RequestStatus::Pending {
            patch = patch.set("resolvedBy", Value::Null).set("resolvedAt", Value::Null);
        } else {
            patch = patch
                .set("resolvedBy", fields::reference(DocumentKind::User, admin_id))
                .set("resolvedAt", json!(Utc::now().to_rfc3339()));
        }

        let saved = self.store.commit(Transaction::new().patch(patch)).await?;
        Ok(saved.first().map(ChangeRequest::try_from).transpose()?)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(false);
        }
        self.store
            .commit(Transaction::new().delete(store_id(DocumentKind::Request, id)))
            .await?;
        Ok(true)
    }

    pub async fn stats(&self) -> Result<RequestStats, AppError> {
        let requests = self.list(None, None).await?;

        let mut stats = RequestStats {
            total: requests.len(),
            ..Default::default()
        };
        for status in RequestStatus::ALL {
            stats.by_status.insert(status.as_str().to_string(), 0);
        }
        for request in &requests {
            *stats.by_status.entry(request.status.as_str().to_string()).or_default() += 1;
            *stats.by_type.entry(request.request_type.clone()).or_default() += 1;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use std::sync::Arc;

    fn request(user_id: i64, request_type: &str) -> NewRequest {
        NewRequest {
            user_id,
            request_type: request_type.to_string(),
            details: "Vidange à prévoir".to_string(),
            vehicle_id: Some(7),
        }
    }

    #[tokio::test]
    async fn test_status_change_records_resolution() {
        let repo = RequestRepository::new(Arc::new(MemoryDocumentStore::new()));
        let created = repo.create(request(3, "maintenance")).await.unwrap();
        assert_eq!(created.status, RequestStatus::Pending);
        assert_eq!(created.vehicle_id, Some(7));

        let updated = repo
            .update_status(created.id, RequestStatus::Approved, Some("OK".to_string()), 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Approved);
        assert_eq!(updated.resolved_by, Some(1));
        assert!(updated.resolved_at.is_some());
        assert_eq!(updated.admin_response.as_deref(), Some("OK"));
    }

    #[tokio::test]
    async fn test_list_filters_by_owner_and_status() {
        let repo = RequestRepository::new(Arc::new(MemoryDocumentStore::new()));
        let first = repo.create(request(3, "maintenance")).await.unwrap();
        repo.create(request(3, "changement")).await.unwrap();
        repo.create(request(4, "maintenance")).await.unwrap();
        repo.update_status(first.id, RequestStatus::Rejected, None, 1).await.unwrap();

        assert_eq!(repo.list(Some(3), None).await.unwrap().len(), 2);
        assert_eq!(repo.list(None, Some(RequestStatus::Pending)).await.unwrap().len(), 2);
        assert_eq!(repo.list(Some(3), Some(RequestStatus::Rejected)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stats_counts_every_status() {
        let repo = RequestRepository::new(Arc::new(MemoryDocumentStore::new()));
        repo.create(request(3, "maintenance")).await.unwrap();
        repo.create(request(4, "maintenance")).await.unwrap();
        repo.create(request(4, "changement")).await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_status["pending"], 3);
        assert_eq!(stats.by_status["completed"], 0);
        assert_eq!(stats.by_type["maintenance"], 2);
    }

    #[tokio::test]
    async fn test_update_can_detach_vehicle() {
        let repo = RequestRepository::new(Arc::new(MemoryDocumentStore::new()));
        let created = repo.create(request(3, "maintenance")).await.unwrap();

        let updated = repo
            .update(created.id, RequestChanges { vehicle_id: Some(None), ..Default::default() })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.vehicle_id, None);
    }
}
