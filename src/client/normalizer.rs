//! Normalización de vehículos recibidos por el cliente
//!
//! La API y el almacén no siempre devuelven la misma forma: documentos con
//! `_id` prefijado y `location` geopoint, respuestas ya aplanadas, sobres
//! `{items}`/`{data}`/`{vehicles}` u objetos indexados. Todo se reduce aquí a
//! [`NormalizedVehicle`] con IDs numéricos.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::metrics;
use crate::models::ids::{coerce_numeric_id, extract_id};

/// Forma canónica de un vehículo en el cliente
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedVehicle {
    pub id: i64,
    pub model: String,
    pub license_plate: String,
    pub status: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub assigned_to: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Normaliza un único objeto. Si no se puede obtener un ID, `id = 0`.
pub fn normalize_vehicle(value: &Value) -> NormalizedVehicle {
    let (latitude, longitude) = coordinates(value);

    NormalizedVehicle {
        id: vehicle_id(value),
        model: string_field(value, "model").unwrap_or_default(),
        license_plate: string_field(value, "licensePlate")
            .or_else(|| string_field(value, "license_plate"))
            .unwrap_or_default(),
        status: string_field(value, "status").unwrap_or_else(|| "available".to_string()),
        address: string_field(value, "address"),
        latitude,
        longitude,
        assigned_to: value
            .get("assignedTo")
            .or_else(|| value.get("assigned_to"))
            .and_then(reference_number),
        created_at: string_field(value, "createdAt").or_else(|| string_field(value, "_createdAt")),
        updated_at: string_field(value, "updatedAt").or_else(|| string_field(value, "_updatedAt")),
    }
}

/// Normaliza cualquier forma de respuesta y deduplica por ID (gana el último).
///
/// Los registros sin ID positivo se descartan con un warning.
pub fn normalize_vehicle_list(payload: &Value) -> Vec<NormalizedVehicle> {
    let mut raw = Vec::new();
    collect_vehicles(payload, &mut raw);

    let mut positions: HashMap<i64, usize> = HashMap::new();
    let mut vehicles: Vec<NormalizedVehicle> = Vec::with_capacity(raw.len());

    for value in raw {
        let vehicle = normalize_vehicle(value);
        if vehicle.id <= 0 {
            let raw_id = value.get("_id").or_else(|| value.get("id")).cloned().unwrap_or_default();
            warn!("⚠️ Vehículo descartado por ID inválido: {}", raw_id);
            metrics::record_normalizer_drop();
            continue;
        }

        match positions.get(&vehicle.id) {
            Some(&index) => vehicles[index] = vehicle,
            None => {
                positions.insert(vehicle.id, vehicles.len());
                vehicles.push(vehicle);
            }
        }
    }

    vehicles
}

fn collect_vehicles<'a>(payload: &'a Value, out: &mut Vec<&'a Value>) {
    match payload {
        Value::Array(items) => {
            for item in items {
                if item.is_object() {
                    out.push(item);
                }
            }
        }
        Value::Object(map) => {
            for envelope in ["items", "data", "vehicles"] {
                if let Some(inner) = map.get(envelope) {
                    if inner.is_array() || inner.is_object() {
                        collect_vehicles(inner, out);
                        return;
                    }
                }
            }

            if looks_like_vehicle(payload) {
                out.push(payload);
            } else {
                // Objeto indexado: `{ "vehicle-1": {...}, "vehicle-2": {...} }`
                for value in map.values() {
                    if value.is_object() {
                        out.push(value);
                    }
                }
            }
        }
        _ => {}
    }
}

fn looks_like_vehicle(value: &Value) -> bool {
    ["_id", "id", "licensePlate", "model"]
        .iter()
        .any(|key| value.get(key).map_or(false, |v| !v.is_object()))
}

/// `_id` prefijado primero, luego `id`
fn vehicle_id(value: &Value) -> i64 {
    let from_store = value.get("_id").map(id_number).unwrap_or(0);
    if from_store > 0 {
        return from_store;
    }
    value.get("id").map(id_number).unwrap_or(0)
}

fn id_number(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) if s.contains('-') => coerce_numeric_id(&extract_id(s)),
        Value::String(s) => coerce_numeric_id(s),
        _ => 0,
    }
}

/// Número, cadena numérica, `user-42`, `{_ref}`, `{id}` o `{_id}`
fn reference_number(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Object(map) => ["_ref", "id", "_id"]
            .iter()
            .find_map(|key| map.get(*key))
            .map(id_number)
            .unwrap_or(0),
        other => id_number(other),
    };
    Some(number).filter(|n| *n > 0)
}

fn coordinates(value: &Value) -> (Option<f64>, Option<f64>) {
    let location = value.get("location");
    let latitude = location
        .and_then(|l| l.get("lat"))
        .and_then(number_value)
        .or_else(|| value.get("latitude").and_then(number_value));
    let longitude = location
        .and_then(|l| l.get("lng"))
        .and_then(number_value)
        .or_else(|| value.get("longitude").and_then(number_value));
    (latitude, longitude)
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_document_is_flattened() {
        let doc = json!({
            "_id": "vehicle-7",
            "model": "Clio",
            "location": { "_type": "geopoint", "lat": 48.8, "lng": 2.3 }
        });

        let vehicle = normalize_vehicle(&doc);
        assert_eq!(vehicle.id, 7);
        assert_eq!(vehicle.model, "Clio");
        assert_eq!(vehicle.latitude, Some(48.8));
        assert_eq!(vehicle.longitude, Some(2.3));
        assert_eq!(vehicle.assigned_to, None);
    }

    #[test]
    fn test_flat_response_with_string_numbers() {
        let vehicle = normalize_vehicle(&json!({
            "id": "12",
            "model": "Kangoo",
            "licensePlate": "AB-123-CD",
            "status": "assigned",
            "latitude": "45.76",
            "longitude": 4.83,
            "assignedTo": "42"
        }));

        assert_eq!(vehicle.id, 12);
        assert_eq!(vehicle.license_plate, "AB-123-CD");
        assert_eq!(vehicle.latitude, Some(45.76));
        assert_eq!(vehicle.assigned_to, Some(42));
    }

    #[test]
    fn test_assigned_to_shapes() {
        let cases = [
            json!(42),
            json!("42"),
            json!("user-42"),
            json!({ "_type": "reference", "_ref": "user-42", "_weak": true }),
            json!({ "id": 42 }),
            json!({ "_id": "user-42" }),
        ];
        for assigned in cases {
            let vehicle = normalize_vehicle(&json!({ "id": 1, "assignedTo": assigned }));
            assert_eq!(vehicle.assigned_to, Some(42), "shape {}", assigned);
        }

        let vehicle = normalize_vehicle(&json!({ "id": 1, "assignedTo": null }));
        assert_eq!(vehicle.assigned_to, None);
    }

    #[test]
    fn test_unparseable_id_is_zero() {
        assert_eq!(normalize_vehicle(&json!({ "_id": "vehicle-abc" })).id, 0);
        assert_eq!(normalize_vehicle(&json!({ "model": "Clio" })).id, 0);
    }

    #[test]
    fn test_envelopes_are_unwrapped() {
        let items = json!({ "items": [{ "id": 1 }, { "id": 2 }] });
        let data = json!({ "success": true, "data": [{ "id": 1 }] });
        let vehicles = json!({ "vehicles": [{ "id": 3 }] });
        let single = json!({ "data": { "_id": "vehicle-9", "model": "Twingo" } });
        let keyed = json!({ "a": { "id": 4 }, "b": { "id": 5 } });

        assert_eq!(normalize_vehicle_list(&items).len(), 2);
        assert_eq!(normalize_vehicle_list(&data).len(), 1);
        assert_eq!(normalize_vehicle_list(&vehicles)[0].id, 3);
        assert_eq!(normalize_vehicle_list(&single)[0].id, 9);
        assert_eq!(normalize_vehicle_list(&keyed).len(), 2);
        assert!(normalize_vehicle_list(&json!("nope")).is_empty());
    }

    #[test]
    fn test_draft_duplicates_collapse_last_wins() {
        let payload = json!([
            { "_id": "vehicle-7", "model": "Clio", "status": "available" },
            { "_id": "drafts.vehicle-7", "model": "Clio", "status": "assigned" },
            { "_id": "vehicle-8", "model": "Zoe" }
        ]);

        let vehicles = normalize_vehicle_list(&payload);
        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[0].id, 7);
        assert_eq!(vehicles[0].status, "assigned");
        assert_eq!(vehicles[1].id, 8);
    }

    #[test]
    fn test_records_without_positive_id_are_dropped() {
        let payload = json!([{ "_id": "vehicle-x" }, { "id": -3 }, { "id": 5 }]);
        let vehicles = normalize_vehicle_list(&payload);
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].id, 5);
    }
}
