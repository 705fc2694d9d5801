//! Lectura y escritura de campos de documentos
//!
//! Referencias débiles `{_type:'reference', _ref, _weak}` y geopuntos
//! `{_type:'geopoint', lat, lng}` tal como los guarda el almacén.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::{Document, StoreError, StoreResult};
use crate::models::ids::{DocumentId, DocumentKind};

fn corrupt(doc: &Document, reason: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        id: doc.id.clone(),
        reason: reason.into(),
    }
}

pub fn required_str(doc: &Document, key: &str) -> StoreResult<String> {
    doc.fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| corrupt(doc, format!("missing string field '{}'", key)))
}

pub fn optional_str(doc: &Document, key: &str) -> Option<String> {
    doc.fields.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn bool_or(doc: &Document, key: &str, default: bool) -> bool {
    doc.fields.get(key).and_then(Value::as_bool).unwrap_or(default)
}

pub fn optional_datetime(doc: &Document, key: &str) -> Option<DateTime<Utc>> {
    doc.fields
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// ID numérico del propio documento, validado contra su tipo
pub fn own_number(doc: &Document, kind: DocumentKind) -> StoreResult<i64> {
    DocumentId::parse(kind, doc.published_id())
        .map(|id| id.number())
        .map_err(|e| corrupt(doc, e.to_string()))
}

/// Referencia débil a otro documento
pub fn reference(kind: DocumentKind, number: i64) -> Value {
    json!({
        "_type": "reference",
        "_ref": crate::models::ids::store_id(kind, number),
        "_weak": true,
    })
}

/// Lee una referencia; acepta el objeto `{_ref}` o el ID como cadena.
/// `Ok(None)` si falta o es `null`.
pub fn optional_reference(doc: &Document, key: &str, kind: DocumentKind) -> StoreResult<Option<i64>> {
    let raw = match doc.fields.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(obj)) => obj.get("_ref").and_then(Value::as_str),
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => None,
    }
    .ok_or_else(|| corrupt(doc, format!("malformed reference '{}'", key)))?;

    DocumentId::parse(kind, raw)
        .map(|id| Some(id.number()))
        .map_err(|e| corrupt(doc, format!("reference '{}': {}", key, e)))
}

pub fn required_reference(doc: &Document, key: &str, kind: DocumentKind) -> StoreResult<i64> {
    optional_reference(doc, key, kind)?
        .ok_or_else(|| corrupt(doc, format!("missing reference '{}'", key)))
}

/// Ruta de filtro sobre el `_ref` de una referencia
pub fn reference_path(key: &str) -> String {
    format!("{}._ref", key)
}

pub fn geopoint(lat: f64, lng: f64) -> Value {
    json!({ "_type": "geopoint", "lat": lat, "lng": lng })
}

pub fn optional_geopoint(doc: &Document, key: &str) -> Option<(f64, f64)> {
    let obj = doc.fields.get(key)?.as_object()?;
    Some((obj.get("lat")?.as_f64()?, obj.get("lng")?.as_f64()?))
}
