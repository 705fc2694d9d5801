//! Middleware del sistema
//!
//! Este módulo contiene el middleware para autenticación y CORS.

pub mod auth;
pub mod cors;

pub use auth::{auth_middleware, AuthenticatedUser};
pub use cors::cors_middleware_with_origins;
