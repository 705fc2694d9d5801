//! Servicio de notificaciones
//!
//! Cola acotada consumida por una única tarea en segundo plano que escribe los
//! documentos `notification`. Es best-effort: si la cola está llena o la
//! escritura falla se registra en logs y métricas y se descarta.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::metrics::{self, NotificationOutcome};
use crate::repositories::{NewNotification, NotificationRepository, UserRepository};
use crate::store::SharedStore;

#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<NewNotification>,
}

impl NotificationDispatcher {
    /// Arranca la tarea consumidora y devuelve el handle para encolar
    pub fn spawn(store: SharedStore, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let repository = NotificationRepository::new(store);
        let join_handle = tokio::spawn(run(repository, receiver));
        info!("📨 Dispatcher de notificaciones iniciado (capacidad {})", capacity);
        (Self { sender }, join_handle)
    }

    /// Encola sin esperar. Nunca falla hacia el llamador.
    pub fn notify(&self, notification: NewNotification) {
        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(
                    "⚠️ Cola de notificaciones llena, se descarta '{}' para el usuario {}",
                    dropped.title, dropped.user_id
                );
                metrics::record_notification(NotificationOutcome::Dropped);
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!(
                    "⚠️ Dispatcher detenido, se descarta '{}' para el usuario {}",
                    dropped.title, dropped.user_id
                );
                metrics::record_notification(NotificationOutcome::Dropped);
            }
        }
    }

    /// Notifica a todos los administradores salvo `except`
    pub async fn notify_admins<F>(&self, users: &UserRepository, except: Option<i64>, build: F)
    where
        F: Fn(i64) -> NewNotification,
    {
        match users.list_admin_ids().await {
            Ok(admin_ids) => {
                for admin_id in admin_ids.into_iter().filter(|id| Some(*id) != except) {
                    self.notify(build(admin_id));
                }
            }
            Err(e) => {
                warn!("⚠️ No se pudieron obtener los administradores a notificar: {}", e);
                metrics::record_notification(NotificationOutcome::Failed);
            }
        }
    }
}

async fn run(repository: NotificationRepository, mut receiver: mpsc::Receiver<NewNotification>) {
    while let Some(notification) = receiver.recv().await {
        let user_id = notification.user_id;
        match repository.create(notification).await {
            Ok(saved) => {
                debug!("📬 Notificación {} creada para el usuario {}", saved.id, user_id);
                metrics::record_notification(NotificationOutcome::Delivered);
            }
            Err(e) => {
                warn!("⚠️ Error creando notificación para el usuario {}: {}", user_id, e);
                metrics::record_notification(NotificationOutcome::Failed);
            }
        }
    }
    info!("📪 Dispatcher de notificaciones detenido");
}
