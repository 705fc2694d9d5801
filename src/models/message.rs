//! Modelo de Message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};

use super::ids::{store_id, DocumentKind};
use crate::store::{fields, Document, StoreError};

/// Carpeta lógica desde el punto de vista de un usuario
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageFolder {
    #[default]
    Inbox,
    Sent,
    Archived,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub subject: String,
    pub content: String,
    pub is_read: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// ¿Pertenece el mensaje a la carpeta de este usuario?
    pub fn in_folder(&self, user_id: i64, folder: MessageFolder) -> bool {
        match folder {
            MessageFolder::Inbox => self.receiver_id == user_id && !self.is_archived,
            MessageFolder::Sent => self.sender_id == user_id && !self.is_archived,
            MessageFolder::Archived => self.is_participant(user_id) && self.is_archived,
        }
    }

    pub fn to_document(&self) -> Document {
        let mut body = Map::new();
        body.insert("sender".into(), fields::reference(DocumentKind::User, self.sender_id));
        body.insert("receiver".into(), fields::reference(DocumentKind::User, self.receiver_id));
        body.insert("subject".into(), json!(self.subject));
        body.insert("content".into(), json!(self.content));
        body.insert("isRead".into(), json!(self.is_read));
        body.insert("isArchived".into(), json!(self.is_archived));
        Document::new(store_id(DocumentKind::Message, self.id), DocumentKind::Message.as_str(), body)
            .with_created_at(self.created_at)
    }
}

impl TryFrom<&Document> for Message {
    type Error = StoreError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        Ok(Message {
            id: fields::own_number(doc, DocumentKind::Message)?,
            sender_id: fields::required_reference(doc, "sender", DocumentKind::User)?,
            receiver_id: fields::required_reference(doc, "receiver", DocumentKind::User)?,
            subject: fields::optional_str(doc, "subject").unwrap_or_default(),
            content: fields::required_str(doc, "content")?,
            is_read: fields::bool_or(doc, "isRead", false),
            is_archived: fields::bool_or(doc, "isArchived", false),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folders() {
        let now = Utc::now();
        let mut message = Message {
            id: 1,
            sender_id: 1,
            receiver_id: 2,
            subject: "Pneus".to_string(),
            content: "Pneu avant crevé".to_string(),
            is_read: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };

        assert!(message.in_folder(2, MessageFolder::Inbox));
        assert!(!message.in_folder(1, MessageFolder::Inbox));
        assert!(message.in_folder(1, MessageFolder::Sent));

        message.is_archived = true;
        assert!(!message.in_folder(2, MessageFolder::Inbox));
        assert!(message.in_folder(1, MessageFolder::Archived));
        assert!(message.in_folder(2, MessageFolder::Archived));
        assert!(!message.in_folder(3, MessageFolder::Archived));
    }
}
