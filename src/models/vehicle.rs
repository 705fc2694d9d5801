//! Modelo de Vehicle
//!
//! Mapea el documento `vehicle` del almacén. `status` y `assignedTo` sólo
//! cambian juntos a través de la asignación.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::ids::{store_id, DocumentKind};
use crate::store::{fields, Document, StoreError};

/// Estado del vehículo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Available,
    Assigned,
    Maintenance,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Assigned => "assigned",
            VehicleStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(VehicleStatus::Available),
            "assigned" => Some(VehicleStatus::Assigned),
            "maintenance" => Some(VehicleStatus::Maintenance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: i64,
    pub model: String,
    pub license_plate: String,
    pub status: VehicleStatus,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
    pub assigned_to: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// `status == assigned` si y sólo si hay un `assigned_to`
    pub fn is_consistent(&self) -> bool {
        (self.status == VehicleStatus::Assigned) == self.assigned_to.is_some()
    }

    pub fn store_id(&self) -> String {
        store_id(DocumentKind::Vehicle, self.id)
    }

    pub fn to_document(&self) -> Document {
        let mut body = Map::new();
        body.insert("model".into(), json!(self.model));
        body.insert("licensePlate".into(), json!(self.license_plate));
        body.insert("status".into(), json!(self.status.as_str()));
        body.insert("address".into(), json!(self.address));
        body.insert(
            "location".into(),
            self.location
                .map(|p| fields::geopoint(p.lat, p.lng))
                .unwrap_or(Value::Null),
        );
        body.insert(
            "assignedTo".into(),
            self.assigned_to
                .map(|user| fields::reference(DocumentKind::User, user))
                .unwrap_or(Value::Null),
        );
        Document::new(self.store_id(), DocumentKind::Vehicle.as_str(), body)
            .with_created_at(self.created_at)
    }
}

impl TryFrom<&Document> for Vehicle {
    type Error = StoreError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        let status = match fields::optional_str(doc, "status") {
            Some(raw) => VehicleStatus::parse(&raw).ok_or_else(|| StoreError::Corrupt {
                id: doc.id.clone(),
                reason: format!("unknown status '{}'", raw),
            })?,
            None => VehicleStatus::Available,
        };

        Ok(Vehicle {
            id: fields::own_number(doc, DocumentKind::Vehicle)?,
            model: fields::optional_str(doc, "model").unwrap_or_default(),
            license_plate: fields::required_str(doc, "licensePlate")?,
            status,
            address: fields::optional_str(doc, "address"),
            location: fields::optional_geopoint(doc, "location").map(|(lat, lng)| GeoPoint { lat, lng }),
            assigned_to: fields::optional_reference(doc, "assignedTo", DocumentKind::User)?,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}
