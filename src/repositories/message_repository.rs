use std::collections::HashSet;

use chrono::Utc;
use serde_json::json;

use crate::models::ids::{next_document_number, store_id, DocumentKind};
use crate::models::message::{Message, MessageFolder};
use crate::store::{fields, DocumentQuery, Patch, SharedStore, Transaction};
use crate::utils::errors::AppError;

use super::decode_listed;

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub subject: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct MessageChanges {
    pub subject: Option<String>,
    pub content: Option<String>,
    pub is_read: Option<bool>,
    pub is_archived: Option<bool>,
}

impl MessageChanges {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.content.is_none() && self.is_read.is_none() && self.is_archived.is_none()
    }
}

pub struct MessageRepository {
    store: SharedStore,
}

impl MessageRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, new_message: NewMessage) -> Result<Message, AppError> {
        let now = Utc::now();
        let message = Message {
            id: next_document_number(),
            sender_id: new_message.sender_id,
            receiver_id: new_message.receiver_id,
            subject: new_message.subject,
            content: new_message.content,
            is_read: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };

        let saved = self
            .store
            .commit(Transaction::new().create(message.to_document()))
            .await?;
        match saved.first() {
            Some(doc) => Ok(Message::try_from(doc)?),
            None => Err(AppError::Internal("Création de message sans résultat".to_string())),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError> {
        let doc = self.store.get(&store_id(DocumentKind::Message, id)).await?;
        Ok(doc.as_ref().map(Message::try_from).transpose()?)
    }

    /// Mensajes de un usuario en una carpeta, del más reciente al más antiguo
    pub async fn list_for_user(&self, user_id: i64, folder: MessageFolder) -> Result<Vec<Message>, AppError> {
        let user_ref = store_id(DocumentKind::User, user_id);
        let base = DocumentQuery::of_type(DocumentKind::Message.as_str()).newest_first();

        // Las carpetas dependen de emisor o receptor: se consultan ambos lados
        let mut docs = match folder {
            MessageFolder::Inbox => {
                self.store
                    .list(&base.eq(fields::reference_path("receiver"), user_ref))
                    .await?
            }
            MessageFolder::Sent => {
                self.store
                    .list(&base.eq(fields::reference_path("sender"), user_ref))
                    .await?
            }
            MessageFolder::Archived => {
                let mut received = self
                    .store
                    .list(&base.clone().eq(fields::reference_path("receiver"), user_ref.clone()))
                    .await?;
                let sent = self
                    .store
                    .list(&base.eq(fields::reference_path("sender"), user_ref))
                    .await?;
                let seen: HashSet<String> = received.iter().map(|d| d.id.clone()).collect();
                received.extend(sent.into_iter().filter(|d| !seen.contains(&d.id)));
                received
            }
        };
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let messages: Vec<Message> = decode_listed(&docs);
        Ok(messages
            .into_iter()
            .filter(|message| message.in_folder(user_id, folder))
            .collect())
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<usize, AppError> {
        let count = self
            .store
            .count(
                &DocumentQuery::of_type(DocumentKind::Message.as_str())
                    .eq(fields::reference_path("receiver"), store_id(DocumentKind::User, user_id))
                    .eq("isRead", false)
                    .eq("isArchived", false),
            )
            .await?;
        Ok(count)
    }

    pub async fn update(&self, id: i64, changes: MessageChanges) -> Result<Option<Message>, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let mut patch = Patch::new(store_id(DocumentKind::Message, id));
        if let Some(subject) = changes.subject {
            patch = patch.set("subject", subject);
        }
        if let Some(content) = changes.content {
            patch = patch.set("content", content);
        }
        if let Some(is_read) = changes.is_read {
            patch = patch.set("isRead", json!(is_read));
        }
        if let Some(is_archived) = changes.is_archived {
            patch = patch.set("isArchived", json!(is_archived));
        }

        let saved = self.store.commit(Transaction::new().patch(patch)).await?;
        Ok(saved.first().map(Message::try_from).transpose()?)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(false);
        }
        self.store
            .commit(Transaction::new().delete(store_id(DocumentKind::Message, id)))
            .await?;
        Ok(true)
    }
}
