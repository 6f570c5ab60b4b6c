use crate::position::{Position, distance_between};
use crate::{Error, Result};

/// Distance threshold in metres below which two positions count as the same location.
///
/// Fixed when a document is built; documents expose it read-only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Granularity(f64);

impl Granularity {
    pub fn new(metres: f64) -> Result<Self> {
        if !metres.is_finite() || metres < 0.0 {
            return Err(Error::InvalidGranularity(metres));
        }
        Ok(Self(metres))
    }

    pub fn metres(&self) -> f64 {
        self.0
    }

    /// True when `p1` and `p2` are strictly closer than the granularity.
    ///
    /// A distance exactly equal to the granularity is not a match, so a zero
    /// granularity never merges anything.
    pub fn same_location(&self, p1: &Position, p2: &Position) -> bool {
        distance_between(p1, p2) < self.0
    }
}
