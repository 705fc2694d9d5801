use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::message::{Message, MessageFolder};
use crate::utils::validation::validate_not_empty;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(alias = "receiver")]
    pub receiver_id: i64,

    #[serde(default)]
    #[validate(length(max = 200))]
    pub subject: String,

    #[validate(length(min = 1, max = 5000), custom = "validate_not_empty")]
    pub content: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessageRequest {
    #[validate(length(max = 200))]
    pub subject: Option<String>,

    #[validate(length(min = 1, max = 5000), custom = "validate_not_empty")]
    pub content: Option<String>,

    pub is_read: Option<bool>,

    pub is_archived: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageListQuery {
    #[serde(default)]
    pub folder: MessageFolder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
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

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            subject: message.subject,
            content: message.content,
            is_read: message.is_read,
            is_archived: message.is_archived,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }
}
