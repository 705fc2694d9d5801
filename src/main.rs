use std::net::SocketAddr;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use remisage::build_router;
use remisage::config::EnvironmentConfig;
use remisage::database::connect_store;
use remisage::services::NotificationDispatcher;
use remisage::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚗 Remisage - Gestión de flota");
    info!("==============================");

    let config = EnvironmentConfig::from_env().context("Configuración inválida")?;
    info!("⚙️ Entorno: {} (almacén {})", config.environment, config.storage_backend.as_str());

    let store = match connect_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("❌ Error conectando al almacén: {:#}", e);
            return Err(e);
        }
    };

    let (notifier, notifier_handle) =
        NotificationDispatcher::spawn(store.clone(), config.notification_queue_capacity);
    let state = AppState::new(config.clone(), store, notifier);

    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => {
            if let Err(e) = state.auth.bootstrap_admin(email, password).await {
                error!("❌ No se pudo crear el administrador inicial: {}", e);
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            warn!("⚠️ ADMIN_EMAIL y ADMIN_PASSWORD deben definirse juntos; se omite el administrador inicial");
        }
        (None, None) => {}
    }

    let app = build_router(state);

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("Dirección inválida: {}", config.server_url()))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   POST /api/auth/register | /api/auth/login");
    info!("   GET  /api/health | /metrics");
    info!("   /api/users, /api/vehicles, /api/messages, /api/requests, /api/notifications");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    // El router ya se soltó: al cerrarse los emisores la tarea drena la cola y termina
    if let Err(e) = notifier_handle.await {
        warn!("⚠️ La tarea de notificaciones terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
