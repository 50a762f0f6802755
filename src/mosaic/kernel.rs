//! Compositing kernels.
//!
//! One generic kernel per mode, instantiated for every lane: `composite::<T, Overlay>` and
//! `composite::<T, Blend>` form the mode by lane cross product.

use crate::raster::buffer::{TileView, TileViewMut};
use crate::raster::lane::Lane;
use crate::raster::nodata::NoDataRange;

use super::classify::{PixelDecision, Signal, classify};

/// Per-pixel weighting data of one source over the current tile.
#[derive(Clone, Copy, Debug)]
pub(crate) enum WeightPlane<'a> {
    Uniform,
    /// Normalized alpha weights, row-major, one per pixel.
    Alpha(&'a [f64]),
    /// ROI membership, row-major, one byte per pixel.
    Roi(&'a [u8]),
}

/// One present source, ready for the inner loop.
#[derive(Clone, Debug)]
pub(crate) struct SourcePlane<'a, T> {
    pub(crate) image: TileView<'a, T>,
    pub(crate) weight: WeightPlane<'a>,
    pub(crate) no_data: Option<NoDataRange>,
    /// Per pixel and band no-data flags computed from raw samples.
    pub(crate) excluded: Option<&'a [u8]>,
}

impl<T: Lane> SourcePlane<'_, T> {
    #[inline]
    fn decide(&self, sample: T, px: usize, band: usize) -> PixelDecision {
        if let Some(flags) = self.excluded
            && flags[px * self.image.bands() + band] != 0
        {
            return PixelDecision::INVALID;
        }
        let signal = match self.weight {
            WeightPlane::Uniform => Signal::Uniform,
            WeightPlane::Alpha(w) => Signal::Alpha(w[px]),
            WeightPlane::Roi(m) => Signal::Roi(m[px] != 0),
        };
        classify(sample, self.no_data.as_ref(), signal)
    }
}

/// Combination rule for the samples of one destination pixel.
pub(crate) trait Combine {
    /// Destination sample for pixel `(col, row)` of `band`, or `no_data` if no source is usable.
    fn pixel<T: Lane>(
        sources: &[SourcePlane<'_, T>],
        col: usize,
        row: usize,
        band: usize,
        px: usize,
        no_data: T,
    ) -> T;
}

/// First valid source wins.
pub(crate) struct Overlay;

/// Weighted average of all valid sources.
pub(crate) struct Blend;

impl Combine for Overlay {
    #[inline]
    fn pixel<T: Lane>(
        sources: &[SourcePlane<'_, T>],
        col: usize,
        row: usize,
        band: usize,
        px: usize,
        no_data: T,
    ) -> T {
        for s in sources {
            let v = s.image.get(col, row, band);
            if s.decide(v, px, band).valid {
                return v;
            }
        }
        no_data
    }
}

impl Combine for Blend {
    #[inline]
    fn pixel<T: Lane>(
        sources: &[SourcePlane<'_, T>],
        col: usize,
        row: usize,
        band: usize,
        px: usize,
        no_data: T,
    ) -> T {
        let mut sum = 0.0f64;
        let mut weights = 0.0f64;
        for s in sources {
            let v = s.image.get(col, row, band);
            let d = s.decide(v, px, band);
            if d.valid {
                sum += d.weight * v.to_f64();
                weights += d.weight;
            }
        }
        if weights == 0.0 {
            return no_data;
        }
        let out = sum / weights;
        if out.is_nan() {
            return no_data;
        }
        T::from_f64(out)
    }
}

/// Composite every band of `dst` from `sources`.
///
/// `no_data` holds one destination no-data sample per band.
pub(crate) fn composite<T: Lane, C: Combine>(
    sources: &[SourcePlane<'_, T>],
    dst: &mut TileViewMut<'_, T>,
    no_data: &[T],
) {
    for (band, &nd) in no_data.iter().enumerate().take(dst.bands()) {
        composite_band::<T, C>(sources, dst, band, nd);
    }
}

fn composite_band<T: Lane, C: Combine>(
    sources: &[SourcePlane<'_, T>],
    dst: &mut TileViewMut<'_, T>,
    band: usize,
    no_data: T,
) {
    let (width, height) = (dst.width(), dst.height());
    let stride = dst.pixel_stride();
    for row in 0..height {
        let line = dst.line_start(row, band);
        let px0 = row * width;
        for col in 0..width {
            let v = C::pixel(sources, col, row, band, px0 + col, no_data);
            dst.put(line + col * stride, v);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mosaic/kernel.rs"]
mod tests;
