use std::sync::Arc;

use citizen_db::cache::CacheStore;
use citizen_db::data_manager::DataManager;
use citizen_db::store::DocumentStore;

use crate::config::ServerConfig;
use crate::services::categories::NotificationCategoryService;
use crate::services::history::OptInHistoryRecorder;
use crate::services::locks::KeyLocks;
use crate::services::phone_mapping::PhoneMappingService;
use crate::services::preferences::PreferenceService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (every service holds a `DataManager`, which is
/// itself a pair of `Arc`s).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Cache-aside access to every collection.
    pub data: DataManager,
    pub categories: NotificationCategoryService,
    pub preferences: PreferenceService,
    pub phone_mappings: PhoneMappingService,
    pub history: OptInHistoryRecorder,
}

impl AppState {
    /// Wire every service over one data manager and one lock set.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let data = DataManager::new(store, cache, config.data_manager_config());
        let locks = KeyLocks::default();

        let categories = NotificationCategoryService::new(data.clone());
        let history = OptInHistoryRecorder::new(data.clone());
        let preferences = PreferenceService::new(
            data.clone(),
            categories.clone(),
            history.clone(),
            locks.clone(),
        );
        let phone_mappings = PhoneMappingService::new(
            data.clone(),
            categories.clone(),
            preferences.clone(),
            history.clone(),
            locks,
            config.quarantine_window(),
        );

        Self {
            config: Arc::new(config),
            data,
            categories,
            preferences,
            phone_mappings,
            history,
        }
    }
}
