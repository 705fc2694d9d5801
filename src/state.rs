//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::cache::{CacheConfig, TtlCache};
use crate::config::environment::EnvironmentConfig;
use crate::dto::vehicle_dto::VehicleResponse;
use crate::repositories::{
    MessageRepository, NotificationRepository, RequestRepository, UserRepository,
    VehicleFilters, VehicleRepository,
};
use crate::services::{AuthService, NotificationDispatcher};
use crate::store::SharedStore;
use crate::utils::jwt::JwtConfig;

pub type VehicleListCache = TtlCache<VehicleFilters, Vec<VehicleResponse>>;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub store: SharedStore,
    pub users: Arc<UserRepository>,
    pub vehicles: Arc<VehicleRepository>,
    pub messages: Arc<MessageRepository>,
    pub requests: Arc<RequestRepository>,
    pub notifications: Arc<NotificationRepository>,
    pub auth: Arc<AuthService>,
    pub notifier: NotificationDispatcher,
    pub vehicle_cache: Arc<VehicleListCache>,
}

impl AppState {
    /// Construye el estado; el dispatcher ya debe estar arrancado
    pub fn new(config: EnvironmentConfig, store: SharedStore, notifier: NotificationDispatcher) -> Self {
        let users = Arc::new(UserRepository::new(store.clone()));
        let auth = Arc::new(AuthService::new(
            users.clone(),
            JwtConfig::from(&config),
            config.bcrypt_cost,
        ));
        let vehicle_cache = Arc::new(TtlCache::new(CacheConfig::new(config.vehicle_cache_ttl)));

        Self {
            vehicles: Arc::new(VehicleRepository::new(store.clone())),
            messages: Arc::new(MessageRepository::new(store.clone())),
            requests: Arc::new(RequestRepository::new(store.clone())),
            notifications: Arc::new(NotificationRepository::new(store.clone())),
            users,
            auth,
            notifier,
            vehicle_cache,
            store,
            config,
        }
    }
}
