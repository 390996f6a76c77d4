use std::fmt;

use place_config::CanvasConfig;
use thiserror::Error;

use crate::address::{axis_index, Coordinate};
use crate::codec::validate_value;

/// One constraint a draw request broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Value { value: i64, max: u16 },
    X { x: i64, width: u32 },
    Y { y: i64, height: u32 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value { value, max } => {
                write!(f, "value must be between 0 and {max}, got {value}")
            }
            Self::X { x, width } => write!(f, "x must be between 0 and {}, got {x}", width - 1),
            Self::Y { y, height } => {
                write!(f, "y must be between 0 and {}, got {y}", height - 1)
            }
        }
    }
}

/// Every violation found in a draw request, in value, x, y order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_violations(.violations))]
pub struct DrawRejection {
    pub violations: Vec<Violation>,
}

impl DrawRejection {
    /// True when only the coordinates were wrong
    pub fn is_out_of_bounds(&self) -> bool {
        self.violations
            .iter()
            .all(|v| matches!(v, Violation::X { .. } | Violation::Y { .. }))
    }

    /// True when only the value was wrong
    pub fn is_invalid_value(&self) -> bool {
        self.violations
            .iter()
            .all(|v| matches!(v, Violation::Value { .. }))
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A draw request that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidDraw {
    pub coord: Coordinate,
    pub value: u16,
}

/// Check a raw draw request against the canvas, collecting every violation
/// instead of stopping at the first.
pub fn validate_draw(
    x: i64,
    y: i64,
    value: i64,
    config: &CanvasConfig,
) -> Result<ValidDraw, DrawRejection> {
    let checked_value = validate_value(value, config.bits_per_pixel).ok();
    let checked_x = axis_index(x, config.width);
    let checked_y = axis_index(y, config.height);

    match (checked_value, checked_x, checked_y) {
        (Some(value), Some(x), Some(y)) => Ok(ValidDraw {
            coord: Coordinate { x, y },
            value,
        }),
        _ => {
            let mut violations = Vec::with_capacity(3);
            if checked_value.is_none() {
                violations.push(Violation::Value {
                    value,
                    max: config.max_value(),
                });
            }
            if checked_x.is_none() {
                violations.push(Violation::X {
                    x,
                    width: config.width,
                });
            }
            if checked_y.is_none() {
                violations.push(Violation::Y {
                    y,
                    height: config.height,
                });
            }
            Err(DrawRejection { violations })
        }
    }
}
