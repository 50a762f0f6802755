//! Per-pixel validity and weight decisions.
//!
//! Classification is a pure function of the sample, the source's no-data range and one
//! weighting signal. Which signal a source uses is fixed once at setup by its
//! [`WeightStrategy`].

use std::fmt;
use std::sync::Arc;

use crate::raster::lane::Lane;
use crate::raster::nodata::NoDataRange;
use crate::raster::source::{RasterSource, Roi};

/// Validity and weight of one source sample at one pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelDecision {
    /// Whether the sample may contribute to the destination.
    pub valid: bool,
    /// Non-negative contribution weight; zero whenever `valid` is `false`.
    pub weight: f64,
}

impl PixelDecision {
    /// Excluded sample.
    pub const INVALID: Self = Self {
        valid: false,
        weight: 0.0,
    };

    /// Fully weighted sample.
    pub const FULL: Self = Self {
        valid: true,
        weight: 1.0,
    };

    /// Decision for `weight`; non-positive or NaN weights are invalid.
    #[inline]
    pub fn weighted(weight: f64) -> Self {
        if weight > 0.0 {
            Self {
                valid: true,
                weight,
            }
        } else {
            Self::INVALID
        }
    }
}

/// How one source is weighted, selected once per session.
///
/// Alpha and ROI are mutually exclusive; when both are configured alpha wins. A no-data range
/// can accompany any strategy and always dominates it.
#[derive(Clone)]
pub enum WeightStrategy {
    /// Every sample is valid with weight 1.
    None,
    /// Samples inside the range are excluded, all others weigh 1.
    NoData(NoDataRange),
    /// Weight comes from a single-band alpha plane.
    Alpha {
        /// Alpha plane, extended with zero outside the source bounds.
        channel: Arc<dyn RasterSource>,
        /// Optional no-data range over the image samples.
        no_data: Option<NoDataRange>,
    },
    /// Weight is 1 inside the mask and 0 outside.
    Roi {
        /// Inclusion mask, clipped to the source bounds.
        mask: Arc<dyn Roi>,
        /// Optional no-data range over the image samples.
        no_data: Option<NoDataRange>,
    },
}

impl WeightStrategy {
    /// No-data range checked before the weighting signal.
    pub fn no_data(&self) -> Option<&NoDataRange> {
        match self {
            Self::None => None,
            Self::NoData(range) => Some(range),
            Self::Alpha { no_data, .. } | Self::Roi { no_data, .. } => no_data.as_ref(),
        }
    }

    /// Return `true` when the source is weighted by a ROI mask.
    pub fn has_roi(&self) -> bool {
        matches!(self, Self::Roi { .. })
    }

    /// Return `true` when the source is weighted by an alpha plane.
    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Alpha { .. })
    }

    /// Return `true` when the source declares a no-data range.
    pub fn has_no_data(&self) -> bool {
        self.no_data().is_some()
    }

    /// Short name used in logs and the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::NoData(_) => "no_data",
            Self::Alpha { .. } => "alpha",
            Self::Roi { .. } => "roi",
        }
    }
}

impl fmt::Debug for WeightStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightStrategy")
            .field("kind", &self.kind())
            .field("no_data", &self.no_data())
            .finish()
    }
}

/// Weighting signal of one source at one pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Signal {
    /// No alpha and no ROI.
    Uniform,
    /// Alpha weight, already normalized by [`alpha_weight`].
    Alpha(f64),
    /// Whether the pixel is inside the ROI.
    Roi(bool),
}

/// Classify one sample.
///
/// A sample inside `no_data` is invalid regardless of the signal. Otherwise the signal decides:
/// alpha weights are used as-is, ROI membership weighs 1 or 0, and a uniform source weighs 1.
#[inline]
pub fn classify<T: Lane>(
    sample: T,
    no_data: Option<&NoDataRange>,
    signal: Signal,
) -> PixelDecision {
    if let Some(range) = no_data
        && range.contains_sample(sample)
    {
        return PixelDecision::INVALID;
    }
    match signal {
        Signal::Uniform => PixelDecision::FULL,
        Signal::Alpha(w) => PixelDecision::weighted(w),
        Signal::Roi(true) => PixelDecision::FULL,
        Signal::Roi(false) => PixelDecision::INVALID,
    }
}

/// Weight of alpha sample `a`.
///
/// Binary alpha maps every positive sample to 1. Linear alpha divides integer lanes by their
/// maximum value and uses float samples directly. The result is never negative; NaN weighs 0
/// and infinite alpha weighs [`MAX_ALPHA_WEIGHT`].
#[inline]
pub fn alpha_weight<T: Lane>(a: T, binary: bool) -> f64 {
    let v = a.to_f64();
    if v.is_nan() || v <= 0.0 {
        return 0.0;
    }
    if binary {
        1.0
    } else {
        (v / T::alpha_scale()).min(MAX_ALPHA_WEIGHT)
    }
}

/// Upper bound of a linear alpha weight; keeps weighted sums finite.
pub const MAX_ALPHA_WEIGHT: f64 = 1.0e12;

#[cfg(test)]
#[path = "../../tests/unit/mosaic/classify.rs"]
mod tests;
