use std::sync::Arc;

use crate::{
    config::Config,
    db::{Cache, FileStore, KeyValueStore},
    services::{
        providers::{MetadataGateway, TmdbGateway},
        PreferenceStore, Recommender, ReferenceLookup,
    },
};

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn MetadataGateway>,
    pub recommender: Arc<Recommender>,
    pub preferences: Arc<PreferenceStore>,
    pub lookup: Arc<ReferenceLookup>,
}

impl AppState {
    /// Wires the services over one gateway, one persistence backend and one shared cache
    pub fn new(
        gateway: Arc<dyn MetadataGateway>,
        store: Arc<dyn KeyValueStore>,
        region: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        let cache = Cache::default();

        Self {
            recommender: Arc::new(Recommender::new(gateway.clone(), cache.clone())),
            preferences: Arc::new(PreferenceStore::new(store)),
            lookup: Arc::new(ReferenceLookup::new(gateway.clone(), cache, region, language)),
            gateway,
        }
    }

    /// TMDB gateway and a file store under the configured data directory
    pub fn from_config(config: &Config) -> Self {
        let gateway = Arc::new(TmdbGateway::from_config(config));
        let store = Arc::new(FileStore::new(config.data_dir.clone()));

        tracing::info!(
            gateway = gateway.name(),
            data_dir = %config.data_dir.display(),
            region = %config.tmdb_region,
            "Application state initialized"
        );

        Self::new(
            gateway,
            store,
            config.tmdb_region.clone(),
            config.tmdb_language.clone(),
        )
    }
}
