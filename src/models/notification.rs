//! Notificaciones por usuario

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::ids::{store_id, DocumentKind};
use crate::store::{fields, Document, StoreError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    VehicleAssigned,
    VehicleUnassigned,
    LocationChanged,
    NewMessage,
    RequestCreated,
    RequestStatusChanged,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::VehicleAssigned => "vehicle_assigned",
            NotificationType::VehicleUnassigned => "vehicle_unassigned",
            NotificationType::LocationChanged => "location_changed",
            NotificationType::NewMessage => "new_message",
            NotificationType::RequestCreated => "request_created",
            NotificationType::RequestStatusChanged => "request_status_changed",
            NotificationType::System => "system",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "vehicle_assigned" => NotificationType::VehicleAssigned,
            "vehicle_unassigned" => NotificationType::VehicleUnassigned,
            "location_changed" => NotificationType::LocationChanged,
            "new_message" => NotificationType::NewMessage,
            "request_created" => NotificationType::RequestCreated,
            "request_status_changed" => NotificationType::RequestStatusChanged,
            _ => NotificationType::System,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub related_vehicle: Option<i64>,
    pub related_request: Option<i64>,
    pub related_message: Option<i64>,
    pub created_at: DateTime<Utc>,
}

fn optional_ref(kind: DocumentKind, id: Option<i64>) -> Value {
    id.map(|n| fields::reference(kind, n)).unwrap_or(Value::Null)
}

impl Notification {
    pub fn to_document(&self) -> Document {
        let mut body = Map::new();
        body.insert("user".into(), fields::reference(DocumentKind::User, self.user_id));
        body.insert("type".into(), json!(self.notification_type.as_str()));
        body.insert("title".into(), json!(self.title));
        body.insert("message".into(), json!(self.message));
        body.insert("isRead".into(), json!(self.is_read));
        body.insert("relatedVehicle".into(), optional_ref(DocumentKind::Vehicle, self.related_vehicle));
        body.insert("relatedRequest".into(), optional_ref(DocumentKind::Request, self.related_request));
        body.insert("relatedMessage".into(), optional_ref(DocumentKind::Message, self.related_message));
        Document::new(
            store_id(DocumentKind::Notification, self.id),
            DocumentKind::Notification.as_str(),
            body,
        )
        .with_created_at(self.created_at)
    }
}

impl TryFrom<&Document> for Notification {
    type Error = StoreError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: fields::own_number(doc, DocumentKind::Notification)?,
            user_id: fields::required_reference(doc, "user", DocumentKind::User)?,
            notification_type: NotificationType::parse(
                &fields::optional_str(doc, "type").unwrap_or_default(),
            ),
            title: fields::optional_str(doc, "title").unwrap_or_default(),
            message: fields::optional_str(doc, "message").unwrap_or_default(),
            is_read: fields::bool_or(doc, "isRead", false),
            related_vehicle: fields::optional_reference(doc, "relatedVehicle", DocumentKind::Vehicle)?,
            related_request: fields::optional_reference(doc, "relatedRequest", DocumentKind::Request)?,
            related_message: fields::optional_reference(doc, "relatedMessage", DocumentKind::Message)?,
            created_at: doc.created_at,
        })
    }
}
