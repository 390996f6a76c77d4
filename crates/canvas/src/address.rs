//! Coordinate to field-slot addressing
//!
//! Cells are laid out row-major: the slot of `(x, y)` is `y * width + x`,
//! counted in whole fields. The physical bit position of a slot is
//! `slot * bits_per_pixel`, which is the codec's concern.

use crate::error::CanvasError;

/// A validated canvas coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    /// Validate raw coordinates against the canvas bounds
    pub fn checked(x: i64, y: i64, width: u32, height: u32) -> Result<Self, CanvasError> {
        match (axis_index(x, width), axis_index(y, height)) {
            (Some(x), Some(y)) => Ok(Self { x, y }),
            _ => Err(CanvasError::OutOfBounds {
                x,
                y,
                width,
                height,
            }),
        }
    }

    /// Row-major field slot of this coordinate
    #[inline]
    pub fn slot(&self, width: u32) -> u64 {
        u64::from(self.y) * u64::from(width) + u64::from(self.x)
    }
}

/// Field slot of `(x, y)`; fails with `OutOfBounds` for negative or
/// too-large coordinates. No wraparound.
pub fn field_slot(x: i64, y: i64, width: u32, height: u32) -> Result<u64, CanvasError> {
    Coordinate::checked(x, y, width, height).map(|coord| coord.slot(width))
}

/// `Some(index)` when `0 <= value < extent`
#[inline]
pub fn axis_index(value: i64, extent: u32) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| *v < extent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slot_is_row_major() {
        assert_eq!(field_slot(0, 0, 4, 3).unwrap(), 0);
        assert_eq!(field_slot(3, 0, 4, 3).unwrap(), 3);
        assert_eq!(field_slot(0, 1, 4, 3).unwrap(), 4);
        assert_eq!(field_slot(3, 2, 4, 3).unwrap(), 11);
    }

    #[test]
    fn test_every_slot_is_distinct() {
        let (width, height) = (7u32, 5u32);
        let mut seen = HashSet::new();
        for y in 0..height {
            for x in 0..width {
                let slot = field_slot(x.into(), y.into(), width, height).unwrap();
                assert_eq!(slot, u64::from(y) * u64::from(width) + u64::from(x));
                assert!(seen.insert(slot));
            }
        }
        assert_eq!(seen.len(), (width * height) as usize);
    }

    #[test]
    fn test_out_of_bounds() {
        assert!(matches!(
            field_slot(4, 0, 4, 3),
            Err(CanvasError::OutOfBounds { x: 4, y: 0, .. })
        ));
        assert!(field_slot(0, 3, 4, 3).is_err());
        assert!(field_slot(-1, 0, 4, 3).is_err());
        assert!(field_slot(0, -1, 4, 3).is_err());
        assert!(field_slot(i64::MAX, 0, 4, 3).is_err());
    }

    #[test]
    fn test_large_canvas_does_not_overflow() {
        let slot = field_slot(i64::from(u32::MAX - 1), i64::from(u32::MAX - 1), u32::MAX, u32::MAX)
            .unwrap();
        assert_eq!(slot, u64::from(u32::MAX - 1) * u64::from(u32::MAX) + u64::from(u32::MAX - 1));
    }
}
