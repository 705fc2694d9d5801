//! Conexión al almacén de documentos
//!
//! Este módulo elige el backend según la configuración y, con PostgreSQL,
//! crea el pool y verifica el esquema.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{DatabaseConfig, EnvironmentConfig, StorageBackend};
use crate::store::{MemoryDocumentStore, PgDocumentStore, SharedStore};

/// Crea el almacén configurado
pub async fn connect_store(config: &EnvironmentConfig) -> Result<SharedStore> {
    match config.storage_backend {
        StorageBackend::Memory => {
            info!("🧠 Almacén en memoria (los datos no persisten)");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres backend")?;
            info!("🐘 Conectando a PostgreSQL: {}", mask_database_url(url));

            let pool = DatabaseConfig::new(url)
                .create_pool()
                .await
                .context("Failed to create the PostgreSQL pool")?;
            let store = PgDocumentStore::new(pool);
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
    }
}

/// Función helper para enmascarar la URL de la base de datos en logs
pub fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}
