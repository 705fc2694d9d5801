//! Limpieza de borradores de vehículos
//!
//! Uso: `cleanup_drafts [--dry-run]`
//!
//! Los borradores con versión publicada se eliminan; los huérfanos se
//! promueven a su ID publicado salvo que su matrícula ya esté en uso, en cuyo
//! caso se listan para revisión manual. Con `--dry-run` sólo se muestra el
//! informe.

use std::env;

use anyhow::{Context, Result};
use log::{info, warn};

use remisage::config::{EnvironmentConfig, StorageBackend};
use remisage::database::connect_store;
use remisage::repositories::VehicleRepository;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let dry_run = env::args().skip(1).any(|arg| arg == "--dry-run" || arg == "-n");

    let config = EnvironmentConfig::from_env().context("Configuración inválida")?;
    if config.storage_backend == StorageBackend::Memory {
        warn!("⚠️ STORAGE_BACKEND=memory: no hay borradores que limpiar en un almacén vacío");
    }

    let store = connect_store(&config).await?;
    let vehicles = VehicleRepository::new(store);

    let report = vehicles
        .cleanup_drafts(!dry_run)
        .await
        .context("Error durante la limpieza")?;

    println!("Borradores obsoletos: {}", report.stale_drafts.len());
    for id in &report.stale_drafts {
        println!("  - {}", id);
    }
    println!("Borradores huérfanos: {}", report.orphan_drafts.len());
    for id in &report.orphan_drafts {
        println!("  + {}", id);
    }
    if !report.conflicting_drafts.is_empty() {
        println!("Borradores con matrícula duplicada (sin cambios): {}", report.conflicting_drafts.len());
        for id in &report.conflicting_drafts {
            println!("  ! {}", id);
        }
    }

    if dry_run {
        info!("🔍 Modo --dry-run: no se ha modificado nada");
    } else {
        info!("✅ Limpieza aplicada");
    }
    Ok(())
}
