use std::sync::Arc;

use crate::{
    config::{Config, FeatureFlags},
    db::{self, Db},
    errors::{Error, Result},
    object_store::{LocalObjectStore, ObjectStore},
};

#[derive(Clone)]
pub struct AppState {
    pub sdb: Db,
    pub config: Arc<Config>,
    pub store: Arc<dyn ObjectStore>,
}

impl AppState {
    /// Connects to the configured database and media root.
    pub async fn init(config: Config) -> Result<Self> {
        let sdb = db::connect(&config).await?;
        let store = Arc::new(LocalObjectStore::new(config.media_root.clone()));
        Ok(Self::new(sdb, config, store))
    }

    pub fn new(sdb: Db, config: Config, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            sdb,
            config: Arc::new(config),
            store,
        }
    }

    pub fn features(&self) -> FeatureFlags {
        self.config.features
    }

    /// A disabled feature is reported as absent.
    pub fn require_feature(&self, enabled: bool) -> Result<()> {
        if enabled {
            Ok(())
        } else {
            Err(Error::NotFound("Resource"))
        }
    }
}
