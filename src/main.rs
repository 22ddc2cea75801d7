use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vehicle_allocation::config::{DatabaseConfig, EnvironmentConfig};
use vehicle_allocation::create_app;
use vehicle_allocation::database::DatabaseConnection;
use vehicle_allocation::repositories::{
    AllocationRepository, AllocationStore, InMemoryAllocationRepository,
};
use vehicle_allocation::services::{AllocationManager, SystemClock};
use vehicle_allocation::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚗 Vehicle Allocation Service");
    info!("============================");

    let config = EnvironmentConfig::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    info!("🏷️ Entorno: {}", config.environment);

    // Inicializar storage
    let store: Arc<dyn AllocationStore> = if db_config.url.is_some() {
        let db_connection = match DatabaseConnection::new(&db_config).await {
            Ok(conn) => conn,
            Err(e) => {
                error!("❌ Error conectando a la base de datos: {}", e);
                return Err(anyhow::anyhow!("Error de base de datos: {}", e));
            }
        };
        db_connection.run_migrations().await?;
        Arc::new(AllocationRepository::new(db_connection.pool().clone()))
    } else {
        warn!("⚠️ DATABASE_URL no configurada, usando storage en memoria");
        Arc::new(InMemoryAllocationRepository::new())
    };

    let manager = AllocationManager::new(store, Arc::new(SystemClock));
    let addr: SocketAddr = config.server_url().parse()?;
    let app = create_app(AppState::new(manager, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET    /health");
    info!("   POST   /allocations");
    info!("   GET    /allocations/history?employee_id=&vehicle_id=");
    info!("   GET    /allocations/:id");
    info!("   PATCH  /allocations/:id");
    info!("   DELETE /allocations/:id");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
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
