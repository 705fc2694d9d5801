//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Fuera de producción todas las variables tienen un valor por defecto.

use std::env;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_JWT_SECRET: &str = "remisage-dev-secret-change-in-production";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_SECRET must be changed in production")]
    DefaultSecretInProduction,
}

/// Backend del almacén de documentos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Postgres => "postgres",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            _ => Err(()),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    /// Segundos de validez de un token
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub vehicle_cache_ttl: u64,
    pub notification_queue_capacity: usize,
    pub bcrypt_cost: u32,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiration: 86_400,
            cors_origins: vec!["http://localhost:5173".to_string()],
            storage_backend: StorageBackend::Memory,
            database_url: None,
            vehicle_cache_ttl: 30,
            notification_queue_capacity: 256,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin_email: None,
            admin_password: None,
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
    }
}

impl EnvironmentConfig {
    /// Lee la configuración desde el entorno (tras `dotenvy::dotenv()`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let storage_backend = match var("STORAGE_BACKEND") {
            None => defaults.storage_backend,
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "STORAGE_BACKEND",
                value,
            })?,
        };

        let config = Self {
            environment: var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parsed("PORT", defaults.port)?,
            host: var("HOST").unwrap_or(defaults.host),
            jwt_secret: var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_expiration: parsed("JWT_EXPIRATION", defaults.jwt_expiration)?,
            cors_origins: var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            storage_backend,
            database_url: var("DATABASE_URL"),
            vehicle_cache_ttl: parsed("VEHICLE_CACHE_TTL", defaults.vehicle_cache_ttl)?,
            notification_queue_capacity: parsed(
                "NOTIFICATION_QUEUE_CAPACITY",
                defaults.notification_queue_capacity,
            )?,
            bcrypt_cost: parsed("BCRYPT_COST", defaults.bcrypt_cost)?,
            admin_email: var("ADMIN_EMAIL"),
            admin_password: var("ADMIN_PASSWORD"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::DefaultSecretInProduction);
        }
        if self.storage_backend == StorageBackend::Postgres && self.database_url.is_none() {
            return Err(ConfigError::Missing { name: "DATABASE_URL" });
        }
        if self.notification_queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "NOTIFICATION_QUEUE_CAPACITY",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_rejects_default_secret() {
        let config = EnvironmentConfig {
            environment: "production".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::DefaultSecretInProduction));

        let config = EnvironmentConfig {
            environment: "production".to_string(),
            jwt_secret: "s3cr3t".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let config = EnvironmentConfig {
            storage_backend: StorageBackend::Postgres,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Missing { name: "DATABASE_URL" }));
    }

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!("memory".parse(), Ok(StorageBackend::Memory));
        assert_eq!("PostgreSQL".parse(), Ok(StorageBackend::Postgres));
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_server_url() {
        assert_eq!(EnvironmentConfig::default().server_url(), "0.0.0.0:3000");
    }
}
