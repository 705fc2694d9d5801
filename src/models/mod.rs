//! Modelos del sistema
//!
//! Entidades de dominio y su mapeo exacto a los documentos del almacén.

pub mod ids;
pub mod location_history;
pub mod message;
pub mod notification;
pub mod request;
pub mod user;
pub mod vehicle;

pub use ids::{DocumentId, DocumentKind};
pub use location_history::LocationHistoryEntry;
pub use message::{Message, MessageFolder};
pub use notification::{Notification, NotificationType};
pub use request::{ChangeRequest, RequestStatus};
pub use user::{User, UserRole};
pub use vehicle::{GeoPoint, Vehicle, VehicleStatus};
