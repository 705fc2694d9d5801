//! Objetos de transferencia de la API REST
//!
//! Cuerpos de petición validados con `validator` y respuestas en camelCase.

pub mod auth_dto;
pub mod common_dto;
pub mod message_dto;
pub mod notification_dto;
pub mod request_dto;
pub mod user_dto;
pub mod vehicle_dto;

pub use common_dto::{ApiResponse, CountResponse};
