//! No-data ranges over raw sample values.

use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::lane::Lane;

/// Interval of raw sample values that mark missing data.
///
/// Either end may be open or closed. For floating lanes the range can additionally claim NaN.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "NoDataRangeRepr", into = "NoDataRangeRepr")]
pub struct NoDataRange {
    min: f64,
    max: f64,
    min_included: bool,
    max_included: bool,
    nan_included: bool,
}

impl NoDataRange {
    /// Create a validated range.
    pub fn new(min: f64, max: f64, min_included: bool, max_included: bool) -> MosaicResult<Self> {
        if min.is_nan() || max.is_nan() {
            return Err(MosaicError::validation(
                "no-data range bounds must not be NaN (use with_nan)",
            ));
        }
        if min > max {
            return Err(MosaicError::validation(format!(
                "no-data range min {min} must be <= max {max}"
            )));
        }
        if min == max && !(min_included && max_included) {
            return Err(MosaicError::validation(
                "degenerate no-data range must be closed at both ends",
            ));
        }
        Ok(Self {
            min,
            max,
            min_included,
            max_included,
            nan_included: false,
        })
    }

    /// Closed range `[min, max]`.
    pub fn closed(min: f64, max: f64) -> MosaicResult<Self> {
        Self::new(min, max, true, true)
    }

    /// Single value `[v, v]`.
    pub fn point(v: f64) -> MosaicResult<Self> {
        Self::new(v, v, true, true)
    }

    /// Range that matches NaN samples only.
    pub fn nan() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            min_included: false,
            max_included: false,
            nan_included: true,
        }
    }

    /// Also treat NaN samples as no-data.
    pub fn with_nan(mut self) -> Self {
        self.nan_included = true;
        self
    }

    /// Lower bound.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Whether the lower bound belongs to the range.
    pub fn is_min_included(&self) -> bool {
        self.min_included
    }

    /// Whether the upper bound belongs to the range.
    pub fn is_max_included(&self) -> bool {
        self.max_included
    }

    /// Whether NaN samples are no-data.
    pub fn is_nan_included(&self) -> bool {
        self.nan_included
    }

    /// Return `true` when `v` falls inside the range.
    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        if v.is_nan() {
            return self.nan_included;
        }
        let above = if self.min_included {
            v >= self.min
        } else {
            v > self.min
        };
        let below = if self.max_included {
            v <= self.max
        } else {
            v < self.max
        };
        above && below
    }

    /// Typed variant of [`NoDataRange::contains`].
    #[inline]
    pub fn contains_sample<T: Lane>(&self, v: T) -> bool {
        self.contains(v.to_f64())
    }

    /// A finite value inside the range, used as border fill for extended sources.
    pub fn representative(&self) -> f64 {
        if self.min > self.max {
            return f64::NAN;
        }
        if self.min_included {
            self.min
        } else if self.max_included {
            self.max
        } else {
            self.min + (self.max - self.min) / 2.0
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct NoDataRangeRepr {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default = "default_true")]
    min_included: bool,
    #[serde(default = "default_true")]
    max_included: bool,
    #[serde(default)]
    nan: bool,
}

fn default_true() -> bool {
    true
}

impl TryFrom<NoDataRangeRepr> for NoDataRange {
    type Error = MosaicError;

    fn try_from(r: NoDataRangeRepr) -> MosaicResult<Self> {
        let range = match (r.min, r.max) {
            (None, None) if r.nan => return Ok(NoDataRange::nan()),
            (None, None) => {
                return Err(MosaicError::validation(
                    "no-data range needs min/max or nan=true",
                ));
            }
            (min, max) => {
                let min = min.or(max).unwrap_or_default();
                let max = max.unwrap_or(min);
                NoDataRange::new(min, max, r.min_included, r.max_included)?
            }
        };
        Ok(if r.nan { range.with_nan() } else { range })
    }
}

impl From<NoDataRange> for NoDataRangeRepr {
    fn from(r: NoDataRange) -> Self {
        let bounded = r.min <= r.max;
        Self {
            min: bounded.then_some(r.min),
            max: bounded.then_some(r.max),
            min_included: r.min_included,
            max_included: r.max_included,
            nan: r.nan_included,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/nodata.rs"]
mod tests;
