//! Solicitudes de cambio/mantenimiento enviadas por los usuarios
//!
//! `ChangeRequest` para no chocar con `axum::extract::Request`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::ids::{store_id, DocumentKind};
use crate::store::{fields, Document, StoreError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn label_fr(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "en attente",
            RequestStatus::Approved => "approuvée",
            RequestStatus::Rejected => "rejetée",
            RequestStatus::Completed => "terminée",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRequest {
    pub id: i64,
    pub user_id: i64,
    pub request_type: String,
    pub details: String,
    pub vehicle_id: Option<i64>,
    pub status: RequestStatus,
    pub admin_response: Option<String>,
    pub resolved_by: Option<i64>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChangeRequest {
    pub fn to_document(&self) -> Document {
        let mut body = Map::new();
        body.insert("user".into(), fields::reference(DocumentKind::User, self.user_id));
        body.insert("type".into(), json!(self.request_type));
        body.insert("details".into(), json!(self.details));
        body.insert(
            "vehicle".into(),
            self.vehicle_id
                .map(|v| fields::reference(DocumentKind::Vehicle, v))
                .unwrap_or(Value::Null),
        );
        body.insert("status".into(), json!(self.status.as_str()));
        body.insert("adminResponse".into(), json!(self.admin_response));
        body.insert(
            "resolvedBy".into(),
            self.resolved_by
                .map(|u| fields::reference(DocumentKind::User, u))
                .unwrap_or(Value::Null),
        );
        body.insert(
            "resolvedAt".into(),
            json!(self.resolved_at.map(|d| d.to_rfc3339())),
        );
        Document::new(store_id(DocumentKind::Request, self.id), DocumentKind::Request.as_str(), body)
            .with_created_at(self.created_at)
    }
}

impl TryFrom<&Document> for ChangeRequest {
    type Error = StoreError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        let status_raw = fields::optional_str(doc, "status").unwrap_or_else(|| "pending".to_string());
        let status = RequestStatus::parse(&status_raw).ok_or_else(|| StoreError::Corrupt {
            id: doc.id.clone(),
            reason: format!("unknown status '{}'", status_raw),
        })?;

        Ok(ChangeRequest {
            id: fields::own_number(doc, DocumentKind::Request)?,
            user_id: fields::required_reference(doc, "user", DocumentKind::User)?,
            request_type: fields::required_str(doc, "type")?,
            details: fields::optional_str(doc, "details").unwrap_or_default(),
            vehicle_id: fields::optional_reference(doc, "vehicle", DocumentKind::Vehicle)?,
            status,
            admin_response: fields::optional_str(doc, "adminResponse"),
            resolved_by: fields::optional_reference(doc, "resolvedBy", DocumentKind::User)?,
            resolved_at: fields::optional_datetime(doc, "resolvedAt"),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}
