//! Application configuration assembled from the environment

use std::time::Duration;

use place_config::{CanvasConfig, ConfigError, StoreConfig};

/// Everything the service needs at startup
#[derive(Debug, Clone, Default)]
pub struct PlaceConfig {
    pub canvas: CanvasConfig,
    pub store: StoreConfig,
}

impl PlaceConfig {
    /// Parse from `PLACE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            canvas: CanvasConfig::from_env()?,
            store: StoreConfig::from_env()?,
        })
    }

    /// Deadline applied around each single store call
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.store.op_timeout_ms)
    }
}
