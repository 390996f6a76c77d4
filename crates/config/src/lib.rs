//! Shared configuration for place
//!
//! This crate provides the single source of truth for canvas geometry,
//! seeding behavior and store connection settings. Values come from
//! defaults, optionally overridden by `PLACE_*` environment variables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default store key holding the packed canvas
pub const DEFAULT_KEY: &str = "place";

/// Default canvas width in cells
pub const DEFAULT_WIDTH: u32 = 1000;

/// Default canvas height in cells
pub const DEFAULT_HEIGHT: u32 = 1000;

/// Default bits per cell (16 colors)
pub const DEFAULT_BITS_PER_PIXEL: u8 = 4;

/// Widest supported cell. Values must fit in a `u16`.
pub const MAX_BITS_PER_PIXEL: u8 = 16;

/// Default deadline applied around every store call
pub const DEFAULT_OP_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("Canvas dimensions must be non-zero, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("Bits per pixel must be 1..={max}, got {0}", max = MAX_BITS_PER_PIXEL)]
    InvalidBitDepth(u8),
    #[error("Canvas {width}x{height} at {bits} bits is too large to address")]
    CanvasTooLarge { width: u32, height: u32, bits: u8 },
    #[error("Seed range {min}..={max} does not fit in {bits} bits")]
    InvalidSeedRange { min: u16, max: u16, bits: u8 },
}

/// Inclusive range reset draws cell values from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRange {
    pub min: u16,
    pub max: u16,
}

impl SeedRange {
    /// Default seed range for a bit depth: every value except the largest.
    ///
    /// A 1-bit canvas has no room to reserve the top value, so it seeds zeros.
    pub fn default_for_bits(bits: u8) -> Self {
        Self {
            min: 0,
            max: max_value(bits).saturating_sub(1),
        }
    }

    /// Full range of encodable values
    pub fn full(bits: u8) -> Self {
        Self {
            min: 0,
            max: max_value(bits),
        }
    }
}

/// Byte range fetched for a whole-canvas read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchRange {
    /// Exactly the packed length, `ceil(W * H * B / 8)` bytes
    #[default]
    Exact,
    /// Bytes `0..=W+1`, kept for clients that depend on the old range
    Legacy,
}

impl FetchRange {
    /// Parse from the `PLACE_FETCH_RANGE` value
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "exact" => Some(Self::Exact),
            "legacy" => Some(Self::Legacy),
            _ => None,
        }
    }
}

/// How reset writes seed values into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetStrategy {
    /// Delete the key, then one field-set per cell. Not atomic.
    #[default]
    PerField,
    /// Build the packed buffer locally and replace the key in one write
    Bulk,
}

impl ResetStrategy {
    /// Parse from the `PLACE_RESET` value
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "per-field" | "per_field" => Some(Self::PerField),
            "bulk" => Some(Self::Bulk),
            _ => None,
        }
    }
}

/// Canvas geometry and behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Store key the packed buffer lives under
    pub key: String,
    /// Width in cells
    pub width: u32,
    /// Height in cells
    pub height: u32,
    /// Bits per cell
    pub bits_per_pixel: u8,
    /// Values reset draws from
    pub seed_range: SeedRange,
    /// Byte range returned by whole-canvas reads
    pub fetch_range: FetchRange,
    /// How reset writes seed values
    pub reset_strategy: ResetStrategy,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            bits_per_pixel: DEFAULT_BITS_PER_PIXEL,
            seed_range: SeedRange::default_for_bits(DEFAULT_BITS_PER_PIXEL),
            fetch_range: FetchRange::default(),
            reset_strategy: ResetStrategy::default(),
        }
    }
}

impl CanvasConfig {
    /// Create a config with the given geometry and default behavior
    pub fn new(width: u32, height: u32, bits_per_pixel: u8) -> Self {
        Self {
            width,
            height,
            bits_per_pixel,
            seed_range: SeedRange::default_for_bits(bits_per_pixel),
            ..Self::default()
        }
    }

    /// Largest value a cell can hold
    pub fn max_value(&self) -> u16 {
        max_value(self.bits_per_pixel)
    }

    /// Number of cells on the canvas
    pub fn cell_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Total bits in the packed buffer, `None` when it overflows `u64`
    pub fn packed_bits(&self) -> Option<u64> {
        self.cell_count().checked_mul(u64::from(self.bits_per_pixel))
    }

    /// Length of the packed buffer in bytes.
    ///
    /// Saturates for geometry that [`CanvasConfig::validate`] rejects.
    pub fn packed_len(&self) -> u64 {
        self.packed_bits().map_or(u64::MAX, |bits| bits.div_ceil(8))
    }

    /// Inclusive byte range `(start, end)` read for a whole-canvas fetch
    pub fn fetch_bounds(&self) -> (u64, u64) {
        match self.fetch_range {
            FetchRange::Exact => (0, self.packed_len().saturating_sub(1)),
            FetchRange::Legacy => (0, u64::from(self.width) + 1),
        }
    }

    /// Check geometry and seed range against each other
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyCanvas {
                width: self.width,
                height: self.height,
            });
        }
        if self.bits_per_pixel == 0 || self.bits_per_pixel > MAX_BITS_PER_PIXEL {
            return Err(ConfigError::InvalidBitDepth(self.bits_per_pixel));
        }
        let addressable = self
            .packed_bits()
            .and_then(|bits| usize::try_from(bits.div_ceil(8)).ok())
            .is_some();
        if !addressable {
            return Err(ConfigError::CanvasTooLarge {
                width: self.width,
                height: self.height,
                bits: self.bits_per_pixel,
            });
        }
        let SeedRange { min, max } = self.seed_range;
        if min > max || max > self.max_value() {
            return Err(ConfigError::InvalidSeedRange {
                min,
                max,
                bits: self.bits_per_pixel,
            });
        }
        Ok(())
    }

    /// Parse from `PLACE_*` environment variables on top of the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Parse from an arbitrary variable source on top of the defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup("PLACE_KEY") {
            config.key = key;
        }
        if let Some(width) = parse_var(&lookup, "PLACE_WIDTH")? {
            config.width = width;
        }
        if let Some(height) = parse_var(&lookup, "PLACE_HEIGHT")? {
            config.height = height;
        }
        if let Some(bits) = parse_var(&lookup, "PLACE_BITS")? {
            config.bits_per_pixel = bits;
            config.seed_range = SeedRange::default_for_bits(bits);
        }
        if let Some(min) = parse_var(&lookup, "PLACE_SEED_MIN")? {
            config.seed_range.min = min;
        }
        if let Some(max) = parse_var(&lookup, "PLACE_SEED_MAX")? {
            config.seed_range.max = max;
        }
        if let Some(raw) = lookup("PLACE_FETCH_RANGE") {
            config.fetch_range = FetchRange::parse(&raw).ok_or(ConfigError::InvalidEnv {
                name: "PLACE_FETCH_RANGE",
                value: raw,
            })?;
        }
        if let Some(raw) = lookup("PLACE_RESET") {
            config.reset_strategy = ResetStrategy::parse(&raw).ok_or(ConfigError::InvalidEnv {
                name: "PLACE_RESET",
                value: raw,
            })?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Connection settings for the external store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis URL; `None` keeps the canvas in process memory
    pub redis_url: Option<String>,
    /// Deadline for a single store call
    pub op_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            op_timeout_ms: DEFAULT_OP_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    /// Parse from `PLACE_REDIS_URL` and `PLACE_TIMEOUT_MS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Parse from an arbitrary variable source on top of the defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();
        config.redis_url = lookup("PLACE_REDIS_URL").filter(|url| !url.trim().is_empty());
        if let Some(timeout) = parse_var(&lookup, "PLACE_TIMEOUT_MS")? {
            config.op_timeout_ms = timeout;
        }
        Ok(config)
    }
}

/// Largest value representable in `bits` bits, saturating at `u16::MAX`
pub fn max_value(bits: u8) -> u16 {
    if bits >= 16 {
        u16::MAX
    } else {
        (1u16 << bits) - 1
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { name, value: raw }),
        None => Ok(None),
    }
}
