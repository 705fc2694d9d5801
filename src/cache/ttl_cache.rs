//! Cache en proceso con expiración
//!
//! Mapa protegido por `RwLock` cuyas entradas caducan tras un TTL fijo. Se
//! usa para el listado de vehículos; cualquier escritura lo invalida entero.
//!
//! Cada invalidación incrementa una generación. Quien rellena el cache toma
//! la generación antes de leer el almacén y la pasa a [`TtlCache::insert`]:
//! si hubo una invalidación entre medias, el valor leído se descarta.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::cache_config::CacheConfig;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<K, V> {
    config: CacheConfig,
    entries: RwLock<HashMap<K, Entry<V>>>,
    generation: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Generación actual; tomarla antes de leer el dato a cachear
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        if !self.config.is_enabled() {
            return None;
        }

        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                debug!("📥 Cache HIT para clave: {:?}", key);
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!("⏰ Cache EXPIRADO para clave: {:?}", key);
                None
            }
            None => {
                debug!("❌ Cache MISS para clave: {:?}", key);
                None
            }
        }
    }

    /// Guarda el valor si no hubo invalidaciones desde `generation`.
    /// Devuelve `false` si el valor se descartó.
    pub async fn insert(&self, key: K, value: V, generation: u64) -> bool {
        if !self.config.is_enabled() {
            return false;
        }

        let expires_at = Instant::now() + self.config.ttl();
        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::Acquire) != generation {
            debug!("🚫 Valor obsoleto descartado para clave: {:?}", key);
            return false;
        }
        entries.retain(|_, entry| entry.expires_at > Instant::now());
        entries.insert(key, Entry { value, expires_at });
        true
    }

    /// Vacía el cache completo
    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        if !entries.is_empty() {
            debug!("🗑️ Cache invalidado ({} entradas)", entries.len());
            entries.clear();
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache: TtlCache<&str, u32> = TtlCache::new(CacheConfig::new(10));
        assert!(cache.insert("vehicles", 3, cache.generation()).await);
        assert_eq!(cache.get(&"vehicles").await, Some(3));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get(&"vehicles").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache: TtlCache<u8, u32> = TtlCache::new(CacheConfig::new(60));
        cache.insert(1, 1, cache.generation()).await;
        cache.insert(2, 2, cache.generation()).await;
        assert_eq!(cache.len().await, 2);

        cache.invalidate_all().await;
        assert!(cache.is_empty().await);
        assert_eq!(cache.get(&1).await, None);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let cache: TtlCache<u8, u32> = TtlCache::new(CacheConfig::new(0));
        assert!(!cache.insert(1, 1, cache.generation()).await);
        assert_eq!(cache.get(&1).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_value_read_before_invalidation_is_discarded() {
        let cache: TtlCache<u8, u32> = TtlCache::new(CacheConfig::new(60));
        let generation = cache.generation();

        // Una escritura invalida mientras el lector consulta el almacén
        cache.invalidate_all().await;

        assert!(!cache.insert(1, 1, generation).await);
        assert_eq!(cache.get(&1).await, None);

        assert!(cache.insert(1, 2, cache.generation()).await);
        assert_eq!(cache.get(&1).await, Some(2));
    }
}
