//! Conexión a PostgreSQL
//!
//! Este módulo crea el pool de conexiones y prepara el schema de la tabla
//! `allocations`, incluida la restricción única por vehículo y fecha.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS allocations (
        id UUID PRIMARY KEY,
        employee_id TEXT NOT NULL CHECK (length(employee_id) > 0),
        vehicle_id TEXT NOT NULL CHECK (length(vehicle_id) > 0),
        driver_id TEXT NOT NULL CHECK (length(driver_id) > 0),
        allocation_date DATE NOT NULL,
        status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'canceled')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT allocations_vehicle_date_key UNIQUE (vehicle_id, allocation_date)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS allocations_employee_id_idx ON allocations (employee_id)",
];

/// Conexión a la base de datos con su pool
#[derive(Clone)]
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Conectar usando la configuración dada
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        if let Some(url) = &config.url {
            info!("🔗 Conectando a PostgreSQL: {}", mask_database_url(url));
        }
        let pool = config.create_pool().await?;
        info!("✅ PostgreSQL conectado exitosamente");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Crear la tabla y sus índices si no existen
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("📦 Schema de allocations verificado");
        Ok(())
    }
}

/// Función helper para enmascarar la URL de la base de datos en logs
fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}
