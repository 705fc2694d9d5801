//! Services module
//!
//! Este módulo contiene la lógica de negocio que no pertenece a un único
//! repositorio.

pub mod auth_service;
pub mod notification_service;

pub use auth_service::AuthService;
pub use notification_service::NotificationDispatcher;
