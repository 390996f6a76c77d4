//! Backing store selection

use std::sync::Arc;

use canvas::{BitfieldStore, MemoryStore};
use place_config::StoreConfig;
use tracing::{info, warn};

use crate::error::AppError;

/// Open the configured store: Redis when a URL is set, otherwise memory.
pub fn open(config: &StoreConfig) -> Result<Arc<dyn BitfieldStore>, AppError> {
    match config.redis_url.as_deref() {
        Some(url) => open_redis(url, config),
        None => {
            warn!("PLACE_REDIS_URL not set; canvas lives in process memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(feature = "redis")]
fn open_redis(url: &str, config: &StoreConfig) -> Result<Arc<dyn BitfieldStore>, AppError> {
    let timeout = std::time::Duration::from_millis(config.op_timeout_ms);
    let store = canvas::RedisStore::connect(url)?.with_timeout(timeout);
    info!("Using Redis store at {}", url);
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
fn open_redis(url: &str, _config: &StoreConfig) -> Result<Arc<dyn BitfieldStore>, AppError> {
    info!("Refusing Redis store at {}", url);
    Err(AppError::RedisDisabled)
}
