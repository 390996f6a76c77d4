//! Packed-bitfield canvas
//!
//! A shared W x H canvas where every cell is a fixed-width unsigned field
//! inside one packed byte buffer owned by an external store.
//! - [`address`] - Coordinate to field-slot mapping with bounds checks
//! - [`codec`] - Value validation, field descriptors and packed bit access
//! - [`validation`] - Draw request checks that report every violation at once
//! - [`store`] - The external bitfield store seam and its adapters
//! - [`canvas`] - Reset, pixel writes and bulk reads against a store
//! - [`transcode`] - Binary / base64 rendering of fetched byte ranges

pub mod address;
pub mod canvas;
pub mod codec;
pub mod constants;
pub mod error;
pub mod store;
pub mod transcode;
pub mod validation;

pub use address::*;
pub use canvas::*;
pub use codec::*;
pub use constants::*;
pub use error::*;
pub use store::*;
pub use transcode::*;
pub use validation::*;

pub use place_config::{CanvasConfig, FetchRange, ResetStrategy, SeedRange};
