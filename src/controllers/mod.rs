//! Controladores
//!
//! Validación y autorización alrededor de los repositorios. Los mensajes al
//! usuario están en francés.

pub mod auth_controller;
pub mod message_controller;
pub mod notification_controller;
pub mod request_controller;
pub mod user_controller;
pub mod vehicle_controller;

pub use auth_controller::AuthController;
pub use message_controller::MessageController;
pub use notification_controller::NotificationController;
pub use request_controller::RequestController;
pub use user_controller::UserController;
pub use vehicle_controller::VehicleController;
