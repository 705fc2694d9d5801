//! Módulo de base de datos
//!
//! Maneja la conexión al backend del almacén de documentos.

pub mod connection;

pub use connection::connect_store;
