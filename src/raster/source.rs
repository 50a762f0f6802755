//! Source and region-of-interest abstractions consumed by a mosaic session.
//!
//! A [`RasterSource`] answers rectangle reads; a [`Roi`] answers point membership and can fill
//! a tile-sized mask.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::foundation::core::Rect;
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::buffer::Raster;
use crate::raster::lane::SampleType;
use crate::raster::layout::SampleLayout;

/// A read-only image that can hand out the data of any rectangle inside its bounds.
///
/// Implementations must be safe to call concurrently for different rectangles: tiles of one
/// mosaic are computed in parallel against the same sources.
pub trait RasterSource: Send + Sync + fmt::Debug {
    /// Rectangle of image space covered by the source.
    fn bounds(&self) -> Rect;

    /// Band count, lane and color interpretation of the samples.
    fn layout(&self) -> &SampleLayout;

    /// Data covering at least `rect`.
    ///
    /// The returned raster may be larger than `rect` (for example the whole in-memory image);
    /// callers address it through [`Raster::view`].
    fn read(&self, rect: Rect) -> MosaicResult<Cow<'_, Raster>>;
}

impl RasterSource for Raster {
    fn bounds(&self) -> Rect {
        Raster::bounds(self)
    }

    fn layout(&self) -> &SampleLayout {
        Raster::layout(self)
    }

    fn read(&self, rect: Rect) -> MosaicResult<Cow<'_, Raster>> {
        if !Raster::bounds(self).contains_rect(rect) {
            return Err(MosaicError::tile(format!(
                "requested {rect:?} outside source bounds {:?}",
                Raster::bounds(self)
            )));
        }
        Ok(Cow::Borrowed(self))
    }
}

impl<S: RasterSource + ?Sized> RasterSource for Arc<S> {
    fn bounds(&self) -> Rect {
        (**self).bounds()
    }

    fn layout(&self) -> &SampleLayout {
        (**self).layout()
    }

    fn read(&self, rect: Rect) -> MosaicResult<Cow<'_, Raster>> {
        (**self).read(rect)
    }
}

/// Region of interest: a per-pixel inclusion mask.
pub trait Roi: Send + Sync + fmt::Debug {
    /// Rectangle outside of which no pixel is included.
    fn bounds(&self) -> Rect;

    /// Return `true` when pixel `(x, y)` is included.
    fn contains(&self, x: i32, y: i32) -> bool;

    /// Write 1 for included and 0 for excluded pixels of `rect` into `mask` (row-major, one byte
    /// per pixel).
    fn fill_mask(&self, rect: Rect, mask: &mut [u8]) {
        let w = rect.width as usize;
        for (row, line) in mask.chunks_exact_mut(w.max(1)).enumerate() {
            let y = rect.y + row as i32;
            for (col, m) in line.iter_mut().enumerate() {
                *m = u8::from(self.contains(rect.x + col as i32, y));
            }
        }
    }

    /// Materialize the mask of `rect` as a single-band 8-bit raster.
    fn to_raster(&self, rect: Rect) -> MosaicResult<Raster> {
        let mut mask = vec![0u8; rect.area() as usize];
        self.fill_mask(rect, &mut mask);
        Raster::from_vec(rect, SampleLayout::gray(SampleType::U8), mask)
    }
}

/// ROI made of a union of rectangles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoiRects {
    rects: Vec<Rect>,
    bounds: Rect,
}

impl RoiRects {
    /// Union of `rects`.
    pub fn new(rects: Vec<Rect>) -> Self {
        let bounds = rects.iter().fold(Rect::default(), |acc, r| acc.union(*r));
        Self { rects, bounds }
    }

    /// Single-rectangle ROI.
    pub fn rect(rect: Rect) -> Self {
        Self::new(vec![rect])
    }

    /// Member rectangles.
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }
}

impl Roi for RoiRects {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.contains(x, y))
    }

    fn fill_mask(&self, rect: Rect, mask: &mut [u8]) {
        mask.fill(0);
        let w = rect.width as usize;
        for r in &self.rects {
            let hit = r.intersect(rect);
            if hit.is_empty() {
                continue;
            }
            let col0 = (i64::from(hit.x) - i64::from(rect.x)) as usize;
            let row0 = (i64::from(hit.y) - i64::from(rect.y)) as usize;
            for row in row0..row0 + hit.height as usize {
                let start = row * w + col0;
                mask[start..start + hit.width as usize].fill(1);
            }
        }
    }
}

/// ROI defined by a single-band raster: pixels whose sample is at least `threshold` are
/// included.
#[derive(Clone, Debug)]
pub struct RoiMask {
    raster: Arc<Raster>,
    threshold: f64,
}

impl RoiMask {
    /// Mask from a single-band raster.
    pub fn new(raster: Arc<Raster>, threshold: f64) -> MosaicResult<Self> {
        if raster.bands() != 1 {
            return Err(MosaicError::validation(format!(
                "ROI raster must have 1 band, got {}",
                raster.bands()
            )));
        }
        Ok(Self { raster, threshold })
    }
}

impl Roi for RoiMask {
    fn bounds(&self) -> Rect {
        self.raster.bounds()
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        self.raster
            .sample(x, y, 0)
            .is_some_and(|v| v >= self.threshold)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/source.rs"]
mod tests;
