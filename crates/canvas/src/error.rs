use place_config::ConfigError;
use thiserror::Error;

use crate::store::StoreError;
use crate::validation::DrawRejection;

/// Errors surfaced by canvas operations
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Coordinate ({x}, {y}) is outside the {width}x{height} canvas")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    #[error("Value {value} does not fit in {bits} bits (max {max})")]
    InvalidValue { value: i64, bits: u8, max: u16 },
    #[error(transparent)]
    Rejected(#[from] DrawRejection),
    #[error("Invalid canvas configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl CanvasError {
    /// Caller errors are never worth retrying
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::InvalidValue { .. } | Self::Rejected(_)
        )
    }
}
