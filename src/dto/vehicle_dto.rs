use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::location_history::LocationHistoryEntry;
use crate::models::vehicle::{GeoPoint, Vehicle, VehicleStatus};
use crate::utils::validation::{
    validate_latitude, validate_license_plate, validate_longitude, validate_not_empty,
    validate_vehicle_status,
};

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_optional_coordinates"))]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub model: String,

    #[validate(custom = "validate_license_plate")]
    pub license_plate: String,

    pub address: Option<String>,

    pub latitude: Option<f64>,

    pub longitude: Option<f64>,
}

impl CreateVehicleRequest {
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }
}

fn validate_optional_coordinates(request: &CreateVehicleRequest) -> Result<(), ValidationError> {
    match (request.latitude, request.longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lng)) => {
            validate_latitude(lat)?;
            validate_longitude(lng)
        }
        _ => Err(ValidationError::new("coordinates_pair")),
    }
}

// Request para actualizar los metadatos de un vehículo
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub model: Option<String>,

    #[validate(custom = "validate_license_plate")]
    pub license_plate: Option<String>,

    #[validate(custom = "validate_vehicle_status")]
    pub status: Option<String>,

    pub address: Option<String>,
}

impl UpdateVehicleRequest {
    pub fn parsed_status(&self) -> Option<VehicleStatus> {
        self.status.as_deref().and_then(VehicleStatus::parse)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_location_coordinates"))]
pub struct UpdateLocationRequest {
    #[validate(custom = "validate_not_empty")]
    pub address: String,

    #[serde(alias = "lat")]
    pub latitude: f64,

    #[serde(alias = "lng")]
    pub longitude: f64,
}

fn validate_location_coordinates(request: &UpdateLocationRequest) -> Result<(), ValidationError> {
    validate_latitude(request.latitude)?;
    validate_longitude(request.longitude)
}

/// `userId: null` libera el vehículo
#[derive(Debug, Deserialize)]
pub struct AssignVehicleRequest {
    #[serde(default, rename = "userId", alias = "user_id", alias = "assignedTo")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleListQuery {
    pub status: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: i64,
    pub model: String,
    pub license_plate: String,
    pub status: VehicleStatus,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub assigned_to: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            model: vehicle.model,
            license_plate: vehicle.license_plate,
            status: vehicle.status,
            address: vehicle.address,
            latitude: vehicle.location.map(|l| l.lat),
            longitude: vehicle.location.map(|l| l.lng),
            location: vehicle.location,
            assigned_to: vehicle.assigned_to,
            created_at: vehicle.created_at,
            updated_at: vehicle.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationHistoryResponse {
    pub id: i64,
    pub vehicle_id: i64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub updated_by: i64,
    pub created_at: DateTime<Utc>,
}

impl From<LocationHistoryEntry> for LocationHistoryResponse {
    fn from(entry: LocationHistoryEntry) -> Self {
        Self {
            id: entry.id,
            vehicle_id: entry.vehicle_id,
            address: entry.address,
            latitude: entry.location.lat,
            longitude: entry.location.lng,
            updated_by: entry.updated_by,
            created_at: entry.created_at,
        }
    }
}
