//! Repositorios
//!
//! Acceso a las entidades sobre el almacén de documentos. Cada operación de
//! escritura compuesta es una única transacción del almacén.

pub mod message_repository;
pub mod notification_repository;
pub mod request_repository;
pub mod user_repository;
pub mod vehicle_repository;

pub use message_repository::{MessageChanges, MessageRepository, NewMessage};
pub use notification_repository::{NewNotification, NotificationRepository};
pub use request_repository::{NewRequest, RequestChanges, RequestRepository, RequestStats};
pub use user_repository::{NewUser, UserChanges, UserRepository};
pub use vehicle_repository::{
    DraftCleanupReport, NewVehicle, VehicleChanges, VehicleFilters, VehicleRepository,
};

use tracing::warn;

use crate::metrics;
use crate::store::{Document, StoreError};

/// Convierte un listado ignorando los documentos ilegibles. Un registro
/// corrupto se registra y se cuenta, sin tumbar el listado entero.
pub(crate) fn decode_listed<'a, T>(docs: &'a [Document]) -> Vec<T>
where
    T: TryFrom<&'a Document, Error = StoreError>,
{
    docs.iter()
        .filter_map(|doc| match T::try_from(doc) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!("⚠️ Documento {} ignorado en el listado: {}", doc.id, e);
                metrics::record_corrupt_document(&doc.doc_type);
                None
            }
        })
        .collect()
}
