//! Historial de ubicaciones de vehículos
//!
//! Registro de sólo-anexado: una entrada por cambio de ubicación.

use chrono::{DateTime, Utc};
use serde_json::{json, Map};

use super::ids::{store_id, DocumentKind};
use super::vehicle::GeoPoint;
use crate::store::{fields, Document, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct LocationHistoryEntry {
    pub id: i64,
    pub vehicle_id: i64,
    pub address: String,
    pub location: GeoPoint,
    pub updated_by: i64,
    pub created_at: DateTime<Utc>,
}

impl LocationHistoryEntry {
    pub fn to_document(&self) -> Document {
        let mut body = Map::new();
        body.insert("vehicle".into(), fields::reference(DocumentKind::Vehicle, self.vehicle_id));
        body.insert("address".into(), json!(self.address));
        body.insert("location".into(), fields::geopoint(self.location.lat, self.location.lng));
        body.insert("updatedBy".into(), fields::reference(DocumentKind::User, self.updated_by));
        Document::new(
            store_id(DocumentKind::VehicleLocationHistory, self.id),
            DocumentKind::VehicleLocationHistory.as_str(),
            body,
        )
        .with_created_at(self.created_at)
    }
}

impl TryFrom<&Document> for LocationHistoryEntry {
    type Error = StoreError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        let (lat, lng) = fields::optional_geopoint(doc, "location").ok_or_else(|| StoreError::Corrupt {
            id: doc.id.clone(),
            reason: "missing location".to_string(),
        })?;

        Ok(LocationHistoryEntry {
            id: fields::own_number(doc, DocumentKind::VehicleLocationHistory)?,
            vehicle_id: fields::required_reference(doc, "vehicle", DocumentKind::Vehicle)?,
            address: fields::required_str(doc, "address")?,
            location: GeoPoint { lat, lng },
            updated_by: fields::required_reference(doc, "updatedBy", DocumentKind::User)?,
            created_at: doc.created_at,
        })
    }
}
