//! Configuración de cache
//!
//! Este módulo contiene la configuración para el sistema de cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuración del cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Segundos de vida de una entrada; 0 desactiva el cache
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 30,
        }
    }
}

impl CacheConfig {
    pub fn new(ttl_seconds: u64) -> Self {
        Self { ttl_seconds }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl_seconds > 0
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}
