//! Canvas operations against the external bitfield store
//!
//! [`CanvasStore`] owns the key and geometry and turns reset, draw and fetch
//! requests into store calls. It keeps no copy of the packed buffer between
//! calls and holds no locks of its own; field-level atomicity comes from the
//! store.

use std::sync::Arc;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use tracing::{debug, info, warn};

use place_config::{CanvasConfig, ResetStrategy};

use crate::address::Coordinate;
use crate::codec::{read_bits, validate_value, write_field, FieldDescriptor};
use crate::constants::BITS_PER_BYTE;
use crate::error::CanvasError;
use crate::store::BitfieldStore;
use crate::transcode::{render, Payload, Representation};

/// Externally observable canvas lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasPhase {
    /// The key is absent
    Uninitialized,
    /// The key holds packed content
    Initialized,
}

/// Cheap to clone; clones share the store and configuration.
#[derive(Clone)]
pub struct CanvasStore {
    store: Arc<dyn BitfieldStore>,
    config: Arc<CanvasConfig>,
}

impl std::fmt::Debug for CanvasStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasStore")
            .field("key", &self.config.key)
            .field("width", &self.config.width)
            .field("height", &self.config.height)
            .field("bits_per_pixel", &self.config.bits_per_pixel)
            .finish()
    }
}

impl CanvasStore {
    /// Create a canvas over `store`, rejecting inconsistent geometry
    pub fn new(config: CanvasConfig, store: Arc<dyn BitfieldStore>) -> Result<Self, CanvasError> {
        config.validate()?;
        Ok(Self {
            store,
            config: Arc::new(config),
        })
    }

    #[inline]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    #[inline]
    fn field(&self, coord: Coordinate) -> FieldDescriptor {
        FieldDescriptor::new(self.config.bits_per_pixel, coord.slot(self.config.width))
    }

    /// Clear the canvas and seed every cell from the configured seed range.
    ///
    /// With [`ResetStrategy::PerField`] this is one delete followed by one
    /// field set per cell. It is not atomic: concurrent draws may interleave
    /// with the seed writes, and a store failure part way through leaves the
    /// canvas partially seeded. [`ResetStrategy::Bulk`] replaces the whole
    /// buffer in one store call instead.
    pub fn reset(&self) -> Result<(), CanvasError> {
        self.reset_with_rng(&mut rand::thread_rng())
    }

    /// [`CanvasStore::reset`] with a caller-supplied random source
    pub fn reset_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(), CanvasError> {
        let config = &self.config;
        let seeds = Uniform::new_inclusive(config.seed_range.min, config.seed_range.max);
        let cells = config.cell_count();

        info!(
            "Resetting canvas '{}' ({}x{}, {} bits, {:?})",
            config.key, config.width, config.height, config.bits_per_pixel, config.reset_strategy
        );

        match config.reset_strategy {
            ResetStrategy::PerField => {
                self.store.delete(&config.key).inspect_err(|e| {
                    warn!("reset: delete of '{}' failed: {}", config.key, e);
                })?;
                for slot in 0..cells {
                    let field = FieldDescriptor::new(config.bits_per_pixel, slot);
                    let value = seeds.sample(rng);
                    self.store
                        .set_field(&config.key, field, value)
                        .inspect_err(|e| {
                            warn!(
                                "reset: seeding stopped at slot {} of {}: {}",
                                slot, cells, e
                            );
                        })?;
                }
            }
            ResetStrategy::Bulk => {
                let mut bytes = Vec::with_capacity(config.packed_len() as usize);
                for slot in 0..cells {
                    let field = FieldDescriptor::new(config.bits_per_pixel, slot);
                    write_field(&mut bytes, field, seeds.sample(rng));
                }
                self.store.replace(&config.key, &bytes).inspect_err(|e| {
                    warn!("reset: bulk write of '{}' failed: {}", config.key, e);
                })?;
            }
        }

        info!("Canvas '{}' seeded with {} cells", config.key, cells);
        Ok(())
    }

    /// Set one cell.
    ///
    /// Fails with `OutOfBounds` or `InvalidValue` before touching the store.
    /// The write is a single atomic field set; writing to a canvas that was
    /// never reset creates the key with every other cell at zero.
    pub fn set_pixel(&self, x: i64, y: i64, value: i64) -> Result<(), CanvasError> {
        let coord = Coordinate::checked(x, y, self.config.width, self.config.height)?;
        let value = validate_value(value, self.config.bits_per_pixel)?;
        self.write(coord, value)
    }

    /// Set one cell from an already validated coordinate and value
    pub fn write(&self, coord: Coordinate, value: u16) -> Result<(), CanvasError> {
        let field = self.field(coord);
        let previous = self
            .store
            .set_field(&self.config.key, field, value)
            .inspect_err(|e| warn!("set_pixel ({}, {}) failed: {}", coord.x, coord.y, e))?;
        debug!(
            "set_pixel ({}, {}) slot {}: {} -> {}",
            coord.x, coord.y, field.slot, previous, value
        );
        Ok(())
    }

    /// Read one cell back from the store
    pub fn get_pixel(&self, x: i64, y: i64) -> Result<u16, CanvasError> {
        let coord = Coordinate::checked(x, y, self.config.width, self.config.height)?;
        let field = self.field(coord);
        let (first, last) = field.byte_span();
        let bytes = self
            .store
            .get_range(&self.config.key, first, last)
            .inspect_err(|e| warn!("get_pixel ({}, {}) failed: {}", coord.x, coord.y, e))?;
        let relative = field.bit_offset() - first * BITS_PER_BYTE;
        Ok(read_bits(&bytes, relative, field.bits))
    }

    /// Raw packed bytes for the whole canvas, over the configured fetch range.
    ///
    /// An uninitialized canvas yields no bytes.
    pub fn get_all(&self) -> Result<Vec<u8>, CanvasError> {
        let (start, end) = self.config.fetch_bounds();
        let bytes = self
            .store
            .get_range(&self.config.key, start, end)
            .inspect_err(|e| warn!("get_all on '{}' failed: {}", self.config.key, e))?;
        debug!("get_all: {} bytes from '{}'", bytes.len(), self.config.key);
        Ok(bytes)
    }

    /// Whole canvas rendered for a content-type hint
    pub fn fetch(&self, content_type: Option<&str>) -> Result<Payload, CanvasError> {
        let bytes = self.get_all()?;
        Ok(render(bytes, Representation::from_content_type(content_type)))
    }

    /// Whether the canvas key exists yet
    pub fn phase(&self) -> Result<CanvasPhase, CanvasError> {
        Ok(if self.store.exists(&self.config.key)? {
            CanvasPhase::Initialized
        } else {
            CanvasPhase::Uninitialized
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_fields;
    use crate::constants::OCTET_STREAM;
    use crate::store::{MemoryStore, StoreError};
    use place_config::{FetchRange, SeedRange};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn canvas(config: CanvasConfig) -> (CanvasStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let canvas = CanvasStore::new(config, store.clone()).unwrap();
        (canvas, store)
    }

    fn cells(canvas: &CanvasStore) -> Vec<u16> {
        let config = canvas.config();
        decode_fields(&canvas.get_all().unwrap(), config.bits_per_pixel, config.cell_count() as usize)
    }

    /// Store whose every call fails, standing in for an unreachable backend
    struct DownStore;

    impl BitfieldStore for DownStore {
        fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Connection("refused".into()))
        }
        fn set_field(&self, _: &str, _: FieldDescriptor, _: u16) -> Result<u16, StoreError> {
            Err(StoreError::Connection("refused".into()))
        }
        fn get_range(&self, _: &str, _: u64, _: u64) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::Connection("refused".into()))
        }
        fn replace(&self, _: &str, _: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Connection("refused".into()))
        }
        fn exists(&self, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Connection("refused".into()))
        }
    }

    /// Store that accepts `budget` field sets, then fails
    struct FlakyStore {
        inner: MemoryStore,
        budget: std::sync::atomic::AtomicUsize,
    }

    impl BitfieldStore for FlakyStore {
        fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key)
        }
        fn set_field(&self, key: &str, field: FieldDescriptor, value: u16) -> Result<u16, StoreError> {
            use std::sync::atomic::Ordering;
            if self.budget.load(Ordering::SeqCst) == 0 {
                return Err(StoreError::Connection("dropped".into()));
            }
            self.budget.fetch_sub(1, Ordering::SeqCst);
            self.inner.set_field(key, field, value)
        }
        fn get_range(&self, key: &str, start: u64, end: u64) -> Result<Vec<u8>, StoreError> {
            self.inner.get_range(key, start, end)
        }
        fn replace(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
            self.inner.replace(key, bytes)
        }
        fn exists(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.exists(key)
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            CanvasStore::new(CanvasConfig::new(0, 2, 4), store),
            Err(CanvasError::Config(_))
        ));
    }

    #[test]
    fn test_set_pixel_scenario() {
        let (canvas, _) = canvas(CanvasConfig::new(2, 2, 4));
        canvas.set_pixel(0, 0, 4).unwrap();
        canvas.set_pixel(1, 0, 5).unwrap();
        canvas.set_pixel(0, 1, 6).unwrap();

        let before = cells(&canvas);
        canvas.set_pixel(1, 1, 9).unwrap();
        let after = cells(&canvas);

        assert_eq!(after[3], 9);
        assert_eq!(&after[..3], &before[..3]);
        assert_eq!(after, vec![4, 5, 6, 9]);
    }

    #[test]
    fn test_round_trip_every_cell_and_value() {
        let (canvas, _) = canvas(CanvasConfig::new(3, 3, 4));
        for y in 0..3 {
            for x in 0..3 {
                for value in 0..=15 {
                    canvas.set_pixel(x, y, value).unwrap();
                    assert_eq!(i64::from(canvas.get_pixel(x, y).unwrap()), value);
                }
            }
        }
    }

    #[test]
    fn test_round_trip_odd_bit_depth() {
        let (canvas, _) = canvas(CanvasConfig::new(5, 1, 3));
        for x in 0..5 {
            canvas.set_pixel(x, 0, 7 - x).unwrap();
        }
        for x in 0..5 {
            assert_eq!(i64::from(canvas.get_pixel(x, 0).unwrap()), 7 - x);
        }
        assert_eq!(cells(&canvas), vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn test_boundaries() {
        let (canvas, store) = canvas(CanvasConfig::new(2, 2, 4));
        assert!(matches!(
            canvas.set_pixel(2, 0, 0),
            Err(CanvasError::OutOfBounds { .. })
        ));
        assert!(matches!(
            canvas.set_pixel(0, 2, 0),
            Err(CanvasError::OutOfBounds { .. })
        ));
        assert!(matches!(
            canvas.set_pixel(0, 0, 16),
            Err(CanvasError::InvalidValue { .. })
        ));
        assert!(matches!(
            canvas.set_pixel(-1, 0, 0),
            Err(CanvasError::OutOfBounds { .. })
        ));

        // Nothing reached the store
        assert!(!store.exists("place").unwrap());
    }

    #[test]
    fn test_write_creates_key() {
        let (canvas, _) = canvas(CanvasConfig::new(2, 2, 4));
        assert_eq!(canvas.phase().unwrap(), CanvasPhase::Uninitialized);
        assert!(canvas.get_all().unwrap().is_empty());

        canvas.set_pixel(0, 1, 3).unwrap();
        assert_eq!(canvas.phase().unwrap(), CanvasPhase::Initialized);
        assert_eq!(cells(&canvas), vec![0, 0, 3, 0]);
    }

    #[test]
    fn test_reset_seeds_every_cell() {
        let mut config = CanvasConfig::new(8, 4, 4);
        config.seed_range = SeedRange { min: 3, max: 5 };
        let (canvas, store) = canvas(config);
        let mut rng = StdRng::seed_from_u64(7);

        canvas.reset_with_rng(&mut rng).unwrap();
        assert_eq!(canvas.phase().unwrap(), CanvasPhase::Initialized);
        assert_eq!(store.len("place").unwrap(), 16);
        let seeded = cells(&canvas);
        assert_eq!(seeded.len(), 32);
        assert!(seeded.iter().all(|v| (3..=5).contains(v)));
    }

    #[test]
    fn test_default_seed_excludes_max() {
        let (canvas, _) = canvas(CanvasConfig::new(16, 16, 2));
        let mut rng = StdRng::seed_from_u64(11);
        canvas.reset_with_rng(&mut rng).unwrap();
        assert!(cells(&canvas).iter().all(|v| *v <= 2));
    }

    #[test]
    fn test_reset_twice_stays_complete() {
        let (canvas, store) = canvas(CanvasConfig::new(4, 4, 4));
        canvas.reset().unwrap();
        canvas.reset().unwrap();
        assert_eq!(store.len("place").unwrap(), 8);
        assert!(cells(&canvas).iter().all(|v| *v <= 14));
    }

    #[test]
    fn test_reset_clears_stale_tail() {
        let (canvas, store) = canvas(CanvasConfig::new(2, 2, 4));
        store.replace("place", &[0xFF; 6]).unwrap();
        canvas.reset().unwrap();
        assert_eq!(store.len("place").unwrap(), 2);
    }

    #[test]
    fn test_bulk_reset_matches_per_field_layout() {
        let mut per_field_config = CanvasConfig::new(5, 3, 4);
        per_field_config.seed_range = SeedRange::full(4);
        let mut bulk_config = per_field_config.clone();
        bulk_config.reset_strategy = ResetStrategy::Bulk;

        let (per_field, _) = canvas(per_field_config);
        let (bulk, _) = canvas(bulk_config);
        per_field.reset_with_rng(&mut StdRng::seed_from_u64(42)).unwrap();
        bulk.reset_with_rng(&mut StdRng::seed_from_u64(42)).unwrap();

        assert_eq!(per_field.get_all().unwrap(), bulk.get_all().unwrap());
    }

    #[test]
    fn test_partial_reset_is_reported() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            budget: std::sync::atomic::AtomicUsize::new(3),
        });
        let canvas = CanvasStore::new(CanvasConfig::new(2, 2, 4), store.clone()).unwrap();

        let err = canvas.reset().unwrap_err();
        assert!(matches!(err, CanvasError::StoreUnavailable(_)));
        assert!(!err.is_caller_error());

        // The first three cells were written before the failure
        assert_eq!(store.inner.len("place").unwrap(), 2);
    }

    #[test]
    fn test_store_unavailable() {
        let canvas = CanvasStore::new(CanvasConfig::new(2, 2, 4), Arc::new(DownStore)).unwrap();
        assert!(matches!(canvas.reset(), Err(CanvasError::StoreUnavailable(_))));
        assert!(matches!(
            canvas.set_pixel(0, 0, 1),
            Err(CanvasError::StoreUnavailable(_))
        ));
        assert!(matches!(canvas.get_all(), Err(CanvasError::StoreUnavailable(_))));
        assert!(matches!(canvas.phase(), Err(CanvasError::StoreUnavailable(_))));

        // Caller errors still win over the store
        assert!(matches!(
            canvas.set_pixel(9, 0, 1),
            Err(CanvasError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_legacy_fetch_range() {
        let mut config = CanvasConfig::new(4, 4, 4);
        config.fetch_range = FetchRange::Legacy;
        let (canvas, _) = canvas(config);
        canvas.reset().unwrap();

        // Bytes 0..=5 of an 8-byte buffer
        assert_eq!(canvas.get_all().unwrap().len(), 6);
    }

    #[test]
    fn test_exact_fetch_range() {
        let (canvas, store) = canvas(CanvasConfig::new(3, 3, 4));
        canvas.reset().unwrap();
        store.replace("place", &[0x11; 9]).unwrap();
        assert_eq!(canvas.get_all().unwrap().len(), 5);
    }

    #[test]
    fn test_fetch_representation() {
        let (canvas, _) = canvas(CanvasConfig::new(2, 2, 4));
        canvas.set_pixel(0, 0, 0xF).unwrap();
        canvas.set_pixel(1, 1, 0x1).unwrap();

        assert_eq!(
            canvas.fetch(Some(OCTET_STREAM)).unwrap(),
            Payload::Binary(vec![0xF0, 0x01])
        );
        assert_eq!(canvas.fetch(None).unwrap(), Payload::Base64("8AE=".to_string()));
    }
}
