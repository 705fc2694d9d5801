use std::sync::Arc;

use validator::Validate;

use crate::dto::common_dto::{ApiResponse, CountResponse};
use crate::dto::message_dto::{MessageListQuery, MessageResponse, SendMessageRequest, UpdateMessageRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::message::Message;
use crate::models::notification::NotificationType;
use crate::repositories::{MessageChanges, MessageRepository, NewMessage, NewNotification, UserRepository};
use crate::services::NotificationDispatcher;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, forbidden_error, not_found_error, AppError};

pub struct MessageController {
    messages: Arc<MessageRepository>,
    users: Arc<UserRepository>,
    notifier: NotificationDispatcher,
}

impl MessageController {
    pub fn new(state: &AppState) -> Self {
        Self {
            messages: state.messages.clone(),
            users: state.users.clone(),
            notifier: state.notifier.clone(),
        }
    }

    /// Sólo emisor y receptor pueden ver el mensaje
    async fn find_for(&self, user: &AuthenticatedUser, id: i64) -> Result<Message, AppError> {
        let message = self
            .messages
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Message", id))?;
        if !message.is_participant(user.user_id) {
            return Err(forbidden_error("Vous n'avez pas accès à ce message"));
        }
        Ok(message)
    }

    pub async fn send(
        &self,
        user: &AuthenticatedUser,
        request: SendMessageRequest,
    ) -> Result<ApiResponse<MessageResponse>, AppError> {
        request.validate()?;
        let receiver = self
            .users
            .find_by_id(request.receiver_id)
            .await?
            .ok_or_else(|| not_found_error("Destinataire", request.receiver_id))?;

        let message = self
            .messages
            .create(NewMessage {
                sender_id: user.user_id,
                receiver_id: receiver.id,
                subject: request.subject.trim().to_string(),
                content: request.content,
            })
            .await?;

        let title = if message.subject.is_empty() {
            "Nouveau message".to_string()
        } else {
            format!("Nouveau message: {}", message.subject)
        };
        self.notifier.notify(
            NewNotification::new(
                receiver.id,
                NotificationType::NewMessage,
                title,
                format!("Vous avez reçu un message de {}", user.email),
            )
            .with_message(message.id),
        );

        Ok(ApiResponse::success_with_message(
            MessageResponse::from(message),
            "Message envoyé avec succès",
        ))
    }

    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        query: MessageListQuery,
    ) -> Result<ApiResponse<Vec<MessageResponse>>, AppError> {
        let messages = self
            .messages
            .list_for_user(user.user_id, query.folder)
            .await?
            .into_iter()
            .map(MessageResponse::from)
            .collect();
        Ok(ApiResponse::success(messages))
    }

    pub async fn get(&self, user: &AuthenticatedUser, id: i64) -> Result<ApiResponse<MessageResponse>, AppError> {
        let message = self.find_for(user, id).await?;
        Ok(ApiResponse::success(MessageResponse::from(message)))
    }

    /// Contenido y asunto: emisor. Lectura: receptor. Archivo: ambos.
    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: i64,
        request: UpdateMessageRequest,
    ) -> Result<ApiResponse<MessageResponse>, AppError> {
        request.validate()?;
        let message = self.find_for(user, id).await?;

        let edits_content = request.subject.is_some() || request.content.is_some();
        if edits_content && message.sender_id != user.user_id {
            return Err(forbidden_error("Seul l'expéditeur peut modifier le contenu du message"));
        }
        if request.is_read.is_some() && message.receiver_id != user.user_id {
            return Err(forbidden_error("Seul le destinataire peut marquer le message comme lu"));
        }

        let changes = MessageChanges {
            subject: request.subject,
            content: request.content,
            is_read: request.is_read,
            is_archived: request.is_archived,
        };
        if changes.is_empty() {
            return Err(bad_request_error("Aucune modification fournie"));
        }

        let updated = self
            .messages
            .update(id, changes)
            .await?
            .ok_or_else(|| not_found_error("Message", id))?;
        Ok(ApiResponse::success_with_message(
            MessageResponse::from(updated),
            "Message mis à jour",
        ))
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: i64) -> Result<ApiResponse<()>, AppError> {
        self.find_for(user, id).await?;
        if !self.messages.delete(id).await? {
            return Err(not_found_error("Message", id));
        }
        Ok(ApiResponse::message("Message supprimé avec succès"))
    }

    pub async fn unread_count(&self, user: &AuthenticatedUser) -> Result<ApiResponse<CountResponse>, AppError> {
        let count = self.messages.unread_count(user.user_id).await?;
        Ok(ApiResponse::success(CountResponse { count }))
    }
}
