use std::sync::Arc;

use crate::dto::common_dto::{ApiResponse, CountResponse};
use crate::dto::notification_dto::{MarkAllReadResponse, NotificationListQuery, NotificationResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::notification::Notification;
use crate::repositories::NotificationRepository;
use crate::state::AppState;
use crate::utils::errors::{forbidden_error, not_found_error, AppError};

pub struct NotificationController {
    notifications: Arc<NotificationRepository>,
}

impl NotificationController {
    pub fn new(state: &AppState) -> Self {
        Self {
            notifications: state.notifications.clone(),
        }
    }

    async fn find_owned(&self, user: &AuthenticatedUser, id: i64) -> Result<Notification, AppError> {
        let notification = self
            .notifications
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Notification", id))?;
        if notification.user_id != user.user_id {
            return Err(forbidden_error("Cette notification ne vous appartient pas"));
        }
        Ok(notification)
    }

    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        query: NotificationListQuery,
    ) -> Result<ApiResponse<Vec<NotificationResponse>>, AppError> {
        let notifications = self
            .notifications
            .list_for_user(user.user_id, query.unread_only)
            .await?
            .into_iter()
            .map(NotificationResponse::from)
            .collect();
        Ok(ApiResponse::success(notifications))
    }

    pub async fn get(
        &self,
        user: &AuthenticatedUser,
        id: i64,
    ) -> Result<ApiResponse<NotificationResponse>, AppError> {
        let notification = self.find_owned(user, id).await?;
        Ok(ApiResponse::success(NotificationResponse::from(notification)))
    }

    pub async fn mark_as_read(
        &self,
        user: &AuthenticatedUser,
        id: i64,
    ) -> Result<ApiResponse<NotificationResponse>, AppError> {
        self.find_owned(user, id).await?;
        let updated = self
            .notifications
            .mark_as_read(id)
            .await?
            .ok_or_else(|| not_found_error("Notification", id))?;
        Ok(ApiResponse::success(NotificationResponse::from(updated)))
    }

    pub async fn mark_all_as_read(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<ApiResponse<MarkAllReadResponse>, AppError> {
        let updated = self.notifications.mark_all_as_read(user.user_id).await?;
        Ok(ApiResponse::success_with_message(
            MarkAllReadResponse { updated },
            "Toutes les notifications ont été marquées comme lues",
        ))
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: i64) -> Result<ApiResponse<()>, AppError> {
        self.find_owned(user, id).await?;
        if !self.notifications.delete(id).await? {
            return Err(not_found_error("Notification", id));
        }
        Ok(ApiResponse::message("Notification supprimée"))
    }

    pub async fn unread_count(&self, user: &AuthenticatedUser) -> Result<ApiResponse<CountResponse>, AppError> {
        let count = self.notifications.unread_count(user.user_id).await?;
        Ok(ApiResponse::success(CountResponse { count }))
    }
}
