//! Importación de la base relacional antigua
//!
//! Uso: `import_legacy <export.json>`
//!
//! El fichero contiene una tabla por clave (`users`, `vehicles`,
//! `location_history`, `messages`, `requests`, `notifications`). Los IDs
//! numéricos se conservan y cada documento se escribe con create-or-replace,
//! así que repetir la importación no duplica nada.

use std::env;
use std::fs;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Deserialize;

use remisage::config::EnvironmentConfig;
use remisage::database::connect_store;
use remisage::models::location_history::LocationHistoryEntry;
use remisage::models::message::Message;
use remisage::models::notification::{Notification, NotificationType};
use remisage::models::request::{ChangeRequest, RequestStatus};
use remisage::models::user::{User, UserRole};
use remisage::models::vehicle::{GeoPoint, Vehicle, VehicleStatus};
use remisage::store::{Document, DocumentStore, SharedStore, Transaction};
use remisage::utils::validation::normalize_license_plate;

#[derive(Debug, Default, Deserialize)]
struct LegacyExport {
    #[serde(default)]
    users: Vec<LegacyUser>,
    #[serde(default)]
    vehicles: Vec<LegacyVehicle>,
    #[serde(default)]
    location_history: Vec<LegacyLocation>,
    #[serde(default)]
    messages: Vec<LegacyMessage>,
    #[serde(default)]
    requests: Vec<LegacyRequest>,
    #[serde(default)]
    notifications: Vec<LegacyNotification>,
}

#[derive(Debug, Deserialize)]
struct LegacyUser {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    role: String,
    #[serde(default)]
    has_vehicle_assigned: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct LegacyVehicle {
    id: i64,
    model: String,
    license_plate: String,
    status: String,
    address: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    assigned_to: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LegacyLocation {
    id: i64,
    vehicle_id: i64,
    address: String,
    latitude: f64,
    longitude: f64,
    updated_by: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct LegacyMessage {
    id: i64,
    sender_id: i64,
    receiver_id: i64,
    #[serde(default)]
    subject: String,
    content: String,
    #[serde(default)]
    is_read: bool,
    #[serde(default)]
    is_archived: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LegacyRequest {
    id: i64,
    user_id: i64,
    #[serde(rename = "type")]
    request_type: String,
    details: String,
    vehicle_id: Option<i64>,
    status: String,
    admin_response: Option<String>,
    resolved_by: Option<i64>,
    resolved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LegacyNotification {
    id: i64,
    user_id: i64,
    #[serde(rename = "type")]
    notification_type: String,
    title: String,
    message: String,
    #[serde(default)]
    is_read: bool,
    related_vehicle_id: Option<i64>,
    related_request_id: Option<i64>,
    related_message_id: Option<i64>,
    created_at: DateTime<Utc>,
}

fn user_document(row: LegacyUser) -> Result<Document> {
    let role = match UserRole::parse(&row.role) {
        Some(role) => role,
        None => bail!("Usuario {}: rol desconocido '{}'", row.id, row.role),
    };
    Ok(User {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email.trim().to_lowercase(),
        password_hash: row.password,
        role,
        has_vehicle_assigned: row.has_vehicle_assigned,
        created_at: row.created_at,
    }
    .to_document())
}

fn vehicle_document(row: LegacyVehicle) -> Document {
    // `assigned` si y sólo si hay asignado
    let status = match (row.assigned_to, VehicleStatus::parse(&row.status)) {
        (Some(_), _) => VehicleStatus::Assigned,
        (None, Some(VehicleStatus::Assigned)) | (None, None) => {
            warn!("⚠️ Vehículo {}: estado '{}' sin asignado, se importa como available", row.id, row.status);
            VehicleStatus::Available
        }
        (None, Some(status)) => status,
    };
    let location = match (row.latitude, row.longitude) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        _ => None,
    };

    Vehicle {
        id: row.id,
        model: row.model,
        license_plate: normalize_license_plate(&row.license_plate),
        status,
        address: row.address,
        location,
        assigned_to: row.assigned_to,
        created_at: row.created_at,
        updated_at: row.updated_at.unwrap_or(row.created_at),
    }
    .to_document()
}

fn location_document(row: LegacyLocation) -> Document {
    LocationHistoryEntry {
        id: row.id,
        vehicle_id: row.vehicle_id,
        address: row.address,
        location: GeoPoint {
            lat: row.latitude,
            lng: row.longitude,
        },
        updated_by: row.updated_by,
        created_at: row.created_at,
    }
    .to_document()
}

fn message_document(row: LegacyMessage) -> Document {
    Message {
        id: row.id,
        sender_id: row.sender_id,
        receiver_id: row.receiver_id,
        subject: row.subject,
        content: row.content,
        is_read: row.is_read,
        is_archived: row.is_archived,
        created_at: row.created_at,
        updated_at: row.updated_at.unwrap_or(row.created_at),
    }
    .to_document()
}

fn request_document(row: LegacyRequest) -> Result<Document> {
    let status = match RequestStatus::parse(&row.status) {
        Some(status) => status,
        None => bail!("Solicitud {}: estado desconocido '{}'", row.id, row.status),
    };
    Ok(ChangeRequest {
        id: row.id,
        user_id: row.user_id,
        request_type: row.request_type,
        details: row.details,
        vehicle_id: row.vehicle_id,
        status,
        admin_response: row.admin_response,
        resolved_by: row.resolved_by,
        resolved_at: row.resolved_at,
        created_at: row.created_at,
        updated_at: row.updated_at.unwrap_or(row.created_at),
    }
    .to_document())
}

fn notification_document(row: LegacyNotification) -> Document {
    Notification {
        id: row.id,
        user_id: row.user_id,
        notification_type: NotificationType::parse(&row.notification_type),
        title: row.title,
        message: row.message,
        is_read: row.is_read,
        related_vehicle: row.related_vehicle_id,
        related_request: row.related_request_id,
        related_message: row.related_message_id,
        created_at: row.created_at,
    }
    .to_document()
}

/// Una transacción por tabla
async fn import_table(store: &SharedStore, table: &str, documents: Vec<Document>) -> Result<usize> {
    if documents.is_empty() {
        info!("⏭️ {}: vacío", table);
        return Ok(0);
    }

    let count = documents.len();
    let transaction = documents
        .into_iter()
        .fold(Transaction::new(), |tx, doc| tx.create_or_replace(doc));
    store
        .commit(transaction)
        .await
        .with_context(|| format!("Error importando {}", table))?;
    info!("✅ {}: {} documentos", table, count);
    Ok(count)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Uso: {} <export.json>", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    info!("📂 Leyendo {}", path);
    let raw = fs::read_to_string(path).with_context(|| format!("No se pudo leer {}", path))?;
    let export: LegacyExport = serde_json::from_str(&raw).context("JSON de exportación inválido")?;

    let config = EnvironmentConfig::from_env().context("Configuración inválida")?;
    let store = connect_store(&config).await?;

    let users = export
        .users
        .into_iter()
        .map(user_document)
        .collect::<Result<Vec<_>>>()?;
    let requests = export
        .requests
        .into_iter()
        .map(request_document)
        .collect::<Result<Vec<_>>>()?;

    let mut total = 0;
    total += import_table(&store, "users", users).await?;
    total += import_table(
        &store,
        "vehicles",
        export.vehicles.into_iter().map(vehicle_document).collect(),
    )
    .await?;
    total += import_table(
        &store,
        "location_history",
        export.location_history.into_iter().map(location_document).collect(),
    )
    .await?;
    total += import_table(
        &store,
        "messages",
        export.messages.into_iter().map(message_document).collect(),
    )
    .await?;
    total += import_table(&store, "requests", requests).await?;
    total += import_table(
        &store,
        "notifications",
        export.notifications.into_iter().map(notification_document).collect(),
    )
    .await?;

    info!("🎉 Importación terminada: {} documentos", total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use remisage::store::{DocumentQuery, MemoryDocumentStore};
    use std::sync::Arc;

    fn legacy_vehicle(status: &str, assigned_to: Option<i64>) -> LegacyVehicle {
        LegacyVehicle {
            id: 7,
            model: "Renault Kangoo".to_string(),
            license_plate: " ab-123-cd ".to_string(),
            status: status.to_string(),
            address: None,
            latitude: Some(48.85),
            longitude: Some(2.35),
            assigned_to,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn legacy_user(role: &str) -> LegacyUser {
        LegacyUser {
            id: 3,
            first_name: "Jeanne".to_string(),
            last_name: "Martin".to_string(),
            email: " Jeanne.Martin@Remisage.FR".to_string(),
            password: "$2b$04$hash".to_string(),
            role: role.to_string(),
            has_vehicle_assigned: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_assigned_without_assignee_becomes_available() {
        let doc = vehicle_document(legacy_vehicle("assigned", None));
        let vehicle = Vehicle::try_from(&doc).unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert_eq!(vehicle.assigned_to, None);
        assert_eq!(vehicle.license_plate, "AB-123-CD");
        assert_eq!(doc.id, "vehicle-7");
    }

    #[test]
    fn test_assignee_forces_assigned_status() {
        let doc = vehicle_document(legacy_vehicle("maintenance", Some(3)));
        let vehicle = Vehicle::try_from(&doc).unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Assigned);
        assert_eq!(vehicle.assigned_to, Some(3));

        let doc = vehicle_document(legacy_vehicle("en panne", None));
        assert_eq!(Vehicle::try_from(&doc).unwrap().status, VehicleStatus::Available);

        let doc = vehicle_document(legacy_vehicle("maintenance", None));
        assert_eq!(Vehicle::try_from(&doc).unwrap().status, VehicleStatus::Maintenance);
    }

    #[test]
    fn test_user_rows() {
        let doc = user_document(legacy_user("employee")).unwrap();
        let user = User::try_from(&doc).unwrap();
        assert_eq!(user.email, "jeanne.martin@remisage.fr");
        assert_eq!(user.role, UserRole::Employee);
        assert_eq!(doc.id, "user-3");

        let err = user_document(legacy_user("superviseur")).unwrap_err();
        assert!(err.to_string().contains("superviseur"));
    }

    #[tokio::test]
    async fn test_replaying_an_import_does_not_duplicate() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());

        for _ in 0..2 {
            let docs = vec![vehicle_document(legacy_vehicle("available", None))];
            assert_eq!(import_table(&store, "vehicles", docs).await.unwrap(), 1);
        }

        let vehicles = store.list(&DocumentQuery::of_type("vehicle")).await.unwrap();
        assert_eq!(vehicles.len(), 1);
    }
}
