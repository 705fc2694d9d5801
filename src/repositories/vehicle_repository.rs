use std::collections::HashSet;

use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::models::ids::{next_document_number, store_id, DocumentKind};
use crate::models::location_history::LocationHistoryEntry;
use crate::models::vehicle::{GeoPoint, Vehicle, VehicleStatus};
use crate::store::{
    fields, Document, DocumentQuery, Patch, SharedStore, Transaction, UniqueConstraint,
};
use crate::utils::errors::AppError;

use super::decode_listed;

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub model: String,
    pub license_plate: String,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleChanges {
    pub model: Option<String>,
    pub license_plate: Option<String>,
    /// Sólo `available` o `maintenance`; la asignación tiene su propia operación
    pub status: Option<VehicleStatus>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VehicleFilters {
    pub status: Option<VehicleStatus>,
    pub assigned_to: Option<i64>,
}

/// Resultado del barrido de borradores
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftCleanupReport {
    /// Borradores cuyo documento publicado existe: se eliminan
    pub stale_drafts: Vec<String>,
    /// Borradores sin versión publicada: se promueven
    pub orphan_drafts: Vec<String>,
    /// Huérfanos cuya matrícula ya usa otro vehículo: se conservan para
    /// revisión manual
    pub conflicting_drafts: Vec<String>,
}

pub struct VehicleRepository {
    store: SharedStore,
}

fn plate_constraint(plate: &str) -> UniqueConstraint {
    UniqueConstraint::new(DocumentKind::Vehicle.as_str(), "licensePlate", plate)
}

fn vehicle_id(id: i64) -> String {
    store_id(DocumentKind::Vehicle, id)
}

impl VehicleRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, new_vehicle: NewVehicle) -> Result<Vehicle, AppError> {
        self.create_with_id(next_document_number(), new_vehicle).await
    }

    pub async fn create_with_id(&self, id: i64, new_vehicle: NewVehicle) -> Result<Vehicle, AppError> {
        let now = Utc::now();
        let vehicle = Vehicle {
            id,
            model: new_vehicle.model,
            license_plate: new_vehicle.license_plate,
            status: VehicleStatus::Available,
            address: new_vehicle.address,
            location: new_vehicle.location,
            assigned_to: None,
            created_at: now,
            updated_at: now,
        };

        let saved = self
            .store
            .commit(
                Transaction::new()
                    .create(vehicle.to_document())
                    .require_unique(plate_constraint(&vehicle.license_plate)),
            )
            .await?;
        first_vehicle(&saved)
    }

    /// Sólo la versión publicada; los borradores no forman parte del modelo
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Vehicle>, AppError> {
        let doc = self.store.get(&vehicle_id(id)).await?;
        Ok(doc.as_ref().map(Vehicle::try_from).transpose()?)
    }

    pub async fn license_plate_exists(&self, license_plate: &str) -> Result<bool, AppError> {
        let count = self
            .store
            .count(
                &DocumentQuery::of_type(DocumentKind::Vehicle.as_str())
                    .eq("licensePlate", license_plate),
            )
            .await?;
        Ok(count > 0)
    }

    pub async fn list(&self, filters: &VehicleFilters) -> Result<Vec<Vehicle>, AppError> {
        let mut query = DocumentQuery::of_type(DocumentKind::Vehicle.as_str()).newest_first();
        if let Some(status) = filters.status {
            query = query.eq("status", status.as_str());
        }
        if let Some(user_id) = filters.assigned_to {
            query = query.eq(
                fields::reference_path("assignedTo"),
                store_id(DocumentKind::User, user_id),
            );
        }

        let docs = self.store.list(&query).await?;
        Ok(decode_listed(&docs))
    }

    pub async fn update(&self, id: i64, changes: VehicleChanges) -> Result<Option<Vehicle>, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let doc_id = vehicle_id(id);
        let mut patch = Patch::new(doc_id.clone());
        let mut transaction = Transaction::new();

        if let Some(model) = changes.model {
            patch = patch.set("model", model);
        }
        if let Some(plate) = changes.license_plate {
            transaction = transaction.require_unique(plate_constraint(&plate).except(doc_id));
            patch = patch.set("licensePlate", plate);
        }
        if let Some(status) = changes.status {
            patch = patch.set("status", status.as_str());
        }
        if let Some(address) = changes.address {
            patch = patch.set("address", address);
        }

        let saved = self.store.commit(transaction.patch(patch)).await?;
        first_vehicle(&saved).map(Some)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(false);
        }
        self.store.commit(Transaction::new().delete(vehicle_id(id))).await?;
        Ok(true)
    }

    /// Asigna (o libera con `None`) un vehículo. Un único parche escribe
    /// `status` y `assignedTo` juntos. `Ok(false)` si el vehículo no existe.
    ///
    /// No verifica la habilitación del usuario: eso es del controlador.
    pub async fn assign_to_user(&self, id: i64, user_id: Option<i64>) -> Result<bool, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(false);
        }

        let patch = match user_id {
            Some(user) => Patch::new(vehicle_id(id))
                .set("status", VehicleStatus::Assigned.as_str())
                .set("assignedTo", fields::reference(DocumentKind::User, user)),
            None => Patch::new(vehicle_id(id))
                .set("status", VehicleStatus::Available.as_str())
                .set("assignedTo", Value::Null),
        };

        self.store.commit(Transaction::new().patch(patch)).await?;
        info!("🚗 Vehículo {} asignado a {:?}", id, user_id);
        Ok(true)
    }

    /// Cambia la ubicación y anexa la entrada de historial en la misma
    /// transacción. `Ok(false)` si el vehículo no existe.
    ///
    /// El parche exige la revisión leída junto con la última entrada: de dos
    /// cambios concurrentes, el segundo falla con conflicto en vez de
    /// escribir una fecha que no sea posterior a la del primero.
    pub async fn update_location(
        &self,
        id: i64,
        address: &str,
        lat: f64,
        lng: f64,
        updated_by: i64,
    ) -> Result<bool, AppError> {
        let Some(transaction) = self.location_transaction(id, address, lat, lng, updated_by).await? else {
            return Ok(false);
        };

        self.store.commit(transaction).await?;
        info!("📍 Ubicación del vehículo {} actualizada por {}", id, updated_by);
        Ok(true)
    }

    async fn location_transaction(
        &self,
        id: i64,
        address: &str,
        lat: f64,
        lng: f64,
        updated_by: i64,
    ) -> Result<Option<Transaction>, AppError> {
        let Some(current) = self.store.get(&vehicle_id(id)).await? else {
            return Ok(None);
        };

        // La nueva entrada debe quedar estrictamente después de la última
        let mut created_at = Utc::now();
        if let Some(latest) = self.latest_history_entry(id).await? {
            if created_at <= latest.created_at {
                created_at = latest.created_at + Duration::milliseconds(1);
            }
        }

        let entry = LocationHistoryEntry {
            id: next_document_number(),
            vehicle_id: id,
            address: address.to_string(),
            location: GeoPoint { lat, lng },
            updated_by,
            created_at,
        };

        let patch = Patch::new(vehicle_id(id))
            .set("address", address)
            .set("location", fields::geopoint(lat, lng))
            .if_revision(current.revision);

        Ok(Some(Transaction::new().patch(patch).create(entry.to_document())))
    }

    fn history_query(id: i64) -> DocumentQuery {
        DocumentQuery::of_type(DocumentKind::VehicleLocationHistory.as_str())
            .eq(fields::reference_path("vehicle"), vehicle_id(id))
            .newest_first()
    }

    /// Historial de ubicaciones, de la más reciente a la más antigua
    pub async fn location_history(&self, id: i64) -> Result<Vec<LocationHistoryEntry>, AppError> {
        let docs = self.store.list(&Self::history_query(id)).await?;
        Ok(decode_listed(&docs))
    }

    async fn latest_history_entry(&self, id: i64) -> Result<Option<LocationHistoryEntry>, AppError> {
        let docs = self.store.list(&Self::history_query(id).limit(1)).await?;
        Ok(docs.first().map(LocationHistoryEntry::try_from).transpose()?)
    }

    /// Detecta borradores de vehículos y, si `apply`, elimina los obsoletos y
    /// promueve los huérfanos a su ID publicado.
    pub async fn cleanup_drafts(&self, apply: bool) -> Result<DraftCleanupReport, AppError> {
        let drafts: Vec<Document> = self
            .store
            .list(&DocumentQuery::of_type(DocumentKind::Vehicle.as_str()).with_drafts())
            .await?
            .into_iter()
            .filter(Document::is_draft)
            .collect();

        let mut report = DraftCleanupReport::default();
        let mut transaction = Transaction::new();
        let mut promoted_plates: HashSet<String> = HashSet::new();

        for draft in drafts {
            let published = draft.published_id().to_string();
            if self.store.get(&published).await?.is_some() {
                report.stale_drafts.push(draft.id.clone());
                // Delete borra también el publicado: aquí sólo el borrador
                transaction = transaction.delete_exact(draft.id.clone());
                continue;
            }

            if let Some(plate) = draft.get("licensePlate").and_then(Value::as_str) {
                if promoted_plates.contains(plate) || self.license_plate_exists(plate).await? {
                    warn!("⚠️ Borrador huérfano {} con matrícula {} ya en uso, se conserva", draft.id, plate);
                    report.conflicting_drafts.push(draft.id.clone());
                    continue;
                }
                promoted_plates.insert(plate.to_string());
                transaction = transaction.require_unique(plate_constraint(plate));
            }

            warn!("⚠️ Borrador huérfano {}, se promueve a {}", draft.id, published);
            report.orphan_drafts.push(draft.id.clone());
            let mut promoted = draft.clone();
            promoted.id = published;
            transaction = transaction.create(promoted).delete_exact(draft.id);
        }

        if apply && !transaction.mutations.is_empty() {
            self.store.commit(transaction).await?;
            info!(
                "🧹 Limpieza de borradores: {} eliminados, {} promovidos",
                report.stale_drafts.len(),
                report.orphan_drafts.len()
            );
        }
        Ok(report)
    }
}

fn first_vehicle(saved: &[Document]) -> Result<Vehicle, AppError> {
    match saved.first() {
        Some(doc) => Ok(Vehicle::try_from(doc)?),
        None => Err(AppError::Internal("Transaction sans document résultant".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryDocumentStore};
    use std::sync::Arc;

    fn new_vehicle(plate: &str) -> NewVehicle {
        NewVehicle {
            model: "Peugeot 205".to_string(),
            license_plate: plate.to_string(),
            address: None,
            location: None,
        }
    }

    fn setup() -> (Arc<MemoryDocumentStore>, VehicleRepository) {
        let store = Arc::new(MemoryDocumentStore::new());
        let repo = VehicleRepository::new(store.clone());
        (store, repo)
    }

    #[tokio::test]
    async fn test_assignment_keeps_status_and_reference_together() {
        let (_, repo) = setup();
        let vehicle = repo.create(new_vehicle("AB-123-CD")).await.unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Available);

        assert!(repo.assign_to_user(vehicle.id, Some(42)).await.unwrap());
        let assigned = repo.find_by_id(vehicle.id).await.unwrap().unwrap();
        assert_eq!(assigned.status, VehicleStatus::Assigned);
        assert_eq!(assigned.assigned_to, Some(42));
        assert!(assigned.is_consistent());

        assert!(repo.assign_to_user(vehicle.id, None).await.unwrap());
        let released = repo.find_by_id(vehicle.id).await.unwrap().unwrap();
        assert_eq!(released.status, VehicleStatus::Available);
        assert_eq!(released.assigned_to, None);
        assert!(released.is_consistent());
    }

    #[tokio::test]
    async fn test_assign_missing_vehicle_returns_false() {
        let (_, repo) = setup();
        assert!(!repo.assign_to_user(404, Some(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_unassign_then_assign_creates_no_duplicates() {
        let (store, repo) = setup();
        let vehicle = repo.create(new_vehicle("AB-123-CD")).await.unwrap();

        repo.assign_to_user(vehicle.id, None).await.unwrap();
        repo.assign_to_user(vehicle.id, Some(42)).await.unwrap();

        let all = store
            .list(&DocumentQuery::of_type("vehicle").with_drafts())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_plate_is_rejected_without_mutation() {
        let (store, repo) = setup();
        repo.create(new_vehicle("AB-123-CD")).await.unwrap();

        let err = repo.create(new_vehicle("AB-123-CD")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_location_update_appends_exactly_one_entry() {
        let (_, repo) = setup();
        let vehicle = repo.create(new_vehicle("AB-123-CD")).await.unwrap();

        repo.update_location(vehicle.id, "1 Rue de Lyon", 45.76, 4.83, 1).await.unwrap();
        repo.update_location(vehicle.id, "10 Rue de Paris", 48.85, 2.35, 42).await.unwrap();

        let history = repo.location_history(vehicle.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].address, "10 Rue de Paris");
        assert_eq!(history[0].location, GeoPoint { lat: 48.85, lng: 2.35 });
        assert_eq!(history[0].updated_by, 42);
        assert!(history[0].created_at > history[1].created_at);

        let updated = repo.find_by_id(vehicle.id).await.unwrap().unwrap();
        assert_eq!(updated.address.as_deref(), Some("10 Rue de Paris"));
    }

    #[tokio::test]
    async fn test_location_update_on_missing_vehicle_writes_nothing() {
        let (store, repo) = setup();
        assert!(!repo.update_location(99, "Nulle part", 0.0, 0.0, 1).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_filters_by_assignee() {
        let (_, repo) = setup();
        let a = repo.create(new_vehicle("AA-111-AA")).await.unwrap();
        repo.create(new_vehicle("BB-222-BB")).await.unwrap();
        repo.assign_to_user(a.id, Some(42)).await.unwrap();

        let filters = VehicleFilters {
            assigned_to: Some(42),
            ..Default::default()
        };
        let mine = repo.list(&filters).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, a.id);

        let available = repo
            .list(&VehicleFilters {
                status: Some(VehicleStatus::Available),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_drafts() {
        let (store, repo) = setup();
        let vehicle = repo.create(new_vehicle("AA-111-AA")).await.unwrap();

        let mut stale = vehicle.to_document();
        stale.id = format!("drafts.vehicle-{}", vehicle.id);
        let mut orphan = Vehicle {
            id: 5,
            license_plate: "BB-222-BB".to_string(),
            ..vehicle.clone()
        }
        .to_document();
        orphan.id = "drafts.vehicle-5".to_string();
        store.seed([stale, orphan]).await;

        let dry_run = repo.cleanup_drafts(false).await.unwrap();
        assert_eq!(dry_run.stale_drafts.len(), 1);
        assert_eq!(dry_run.orphan_drafts, vec!["drafts.vehicle-5".to_string()]);
        assert_eq!(store.len().await, 3);

        repo.cleanup_drafts(true).await.unwrap();
        assert_eq!(store.len().await, 2);
        assert!(repo.find_by_id(vehicle.id).await.unwrap().is_some());
        assert!(repo.find_by_id(5).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_orphan_whose_plate_is_taken() {
        let (store, repo) = setup();
        let vehicle = repo.create(new_vehicle("AB-123-CD")).await.unwrap();

        let mut clash = Vehicle { id: 5, ..vehicle.clone() }.to_document();
        clash.id = "drafts.vehicle-5".to_string();
        let mut first = Vehicle {
            id: 6,
            license_plate: "EF-456-GH".to_string(),
            ..vehicle.clone()
        }
        .to_document();
        first.id = "drafts.vehicle-6".to_string();
        let mut second = Vehicle {
            id: 7,
            license_plate: "EF-456-GH".to_string(),
            ..vehicle.clone()
        }
        .to_document();
        second.id = "drafts.vehicle-7".to_string();
        store.seed([clash, first, second]).await;

        let report = repo.cleanup_drafts(true).await.unwrap();
        assert_eq!(report.orphan_drafts, vec!["drafts.vehicle-6".to_string()]);
        assert_eq!(
            report.conflicting_drafts,
            vec!["drafts.vehicle-5".to_string(), "drafts.vehicle-7".to_string()]
        );

        for plate in ["AB-123-CD", "EF-456-GH"] {
            let published = store
                .list(&DocumentQuery::of_type("vehicle").eq("licensePlate", plate))
                .await
                .unwrap();
            assert_eq!(published.len(), 1, "{}", plate);
        }
        assert!(repo.find_by_id(5).await.unwrap().is_none());
        assert!(store.get("drafts.vehicle-5").await.unwrap().is_some());
        assert!(store.get("drafts.vehicle-7").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_location_updates_cannot_both_commit() {
        let (_, repo) = setup();
        let vehicle = repo.create(new_vehicle("AB-123-CD")).await.unwrap();

        // Ambas se preparan sobre el mismo estado
        let first = repo
            .location_transaction(vehicle.id, "1 Rue de Lyon", 45.76, 4.83, 1)
            .await
            .unwrap()
            .unwrap();
        let second = repo
            .location_transaction(vehicle.id, "10 Rue de Paris", 48.85, 2.35, 2)
            .await
            .unwrap()
            .unwrap();

        repo.store.commit(first).await.unwrap();
        let err = AppError::from(repo.store.commit(second).await.unwrap_err());
        assert!(matches!(err, AppError::Conflict(_)));

        let history = repo.location_history(vehicle.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].address, "1 Rue de Lyon");
    }

    #[tokio::test]
    async fn test_list_skips_corrupt_documents() {
        let (store, repo) = setup();
        let vehicle = repo.create(new_vehicle("AB-123-CD")).await.unwrap();
        store
            .seed([Document::new("vehicle-9", "vehicle", serde_json::Map::new())])
            .await;

        let listed = repo.list(&VehicleFilters::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, vehicle.id);

        // La lectura directa sí informa del documento corrupto
        assert!(repo.find_by_id(9).await.is_err());
    }
}
