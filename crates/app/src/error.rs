use canvas::CanvasError;
#[cfg(feature = "redis")]
use canvas::StoreError;
use place_config::ConfigError;
use place_ipc::IpcError;
use thiserror::Error;

use crate::logging::InitError;

/// Startup and serving failures of the binary
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[cfg(feature = "redis")]
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Protocol error: {0}")]
    Ipc(#[from] IpcError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] InitError),

    #[error("PLACE_REDIS_URL is set but this build lacks the `redis` feature")]
    RedisDisabled,
}
