//! Virtual extension of sources to the destination bounds.
//!
//! Extension is a property of the source: reads outside the data area return a constant fill,
//! so the compositing loops never test pixel coordinates against source bounds.

use std::borrow::Cow;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::foundation::core::Rect;
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::buffer::{Raster, broadcast_fill};
use crate::raster::layout::SampleLayout;
use crate::raster::source::{RasterSource, Roi};

/// Source decorator answering reads over `bounds` with constant fill outside the data area.
#[derive(Debug)]
pub struct Extended {
    inner: Arc<dyn RasterSource>,
    bounds: Rect,
    data: Rect,
    fill: SmallVec<[f64; 4]>,
}

impl Extended {
    /// Extend `inner` to `bounds`. Data is taken from `inner` only inside `limit` (clipped to the
    /// inner bounds); every other pixel reads as `fill` (one value or one per band).
    pub fn new(
        inner: Arc<dyn RasterSource>,
        bounds: Rect,
        limit: Rect,
        fill: &[f64],
    ) -> MosaicResult<Self> {
        let fill = broadcast_fill(fill, inner.layout().bands)?;
        let data = inner.bounds().intersect(limit).intersect(bounds);
        Ok(Self {
            inner,
            bounds,
            data,
            fill,
        })
    }

    /// Rectangle where reads return source data.
    pub fn data_bounds(&self) -> Rect {
        self.data
    }
}

impl RasterSource for Extended {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn layout(&self) -> &SampleLayout {
        self.inner.layout()
    }

    fn read(&self, rect: Rect) -> MosaicResult<Cow<'_, Raster>> {
        if !self.bounds.contains_rect(rect) {
            return Err(MosaicError::tile(format!(
                "requested {rect:?} outside extended bounds {:?}",
                self.bounds
            )));
        }
        if self.data.contains_rect(rect) {
            return self.inner.read(rect);
        }
        let mut out = Raster::filled(rect, self.layout().clone(), &self.fill)?;
        let overlap = rect.intersect(self.data);
        if !overlap.is_empty() {
            let tile = self.inner.read(overlap)?;
            out.copy_from(&tile, overlap)?;
        }
        Ok(Cow::Owned(out))
    }
}

/// Extend `source` so it can be read anywhere inside `to`, keeping only data inside `limit`.
///
/// Returns the source unchanged when it already covers `to` and `limit` does not clip it.
pub fn extend_source(
    source: Arc<dyn RasterSource>,
    to: Rect,
    limit: Rect,
    fill: &[f64],
) -> MosaicResult<Arc<dyn RasterSource>> {
    let covered = source.bounds().contains_rect(to) && limit.contains_rect(to);
    if covered {
        return Ok(source);
    }
    Ok(Arc::new(Extended::new(source, to, limit, fill)?))
}

/// ROI restricted to a rectangle; pixels outside `limit` are always excluded.
#[derive(Debug)]
pub struct BoundedRoi {
    roi: Arc<dyn Roi>,
    limit: Rect,
}

impl BoundedRoi {
    /// Restrict `roi` to `limit`.
    pub fn new(roi: Arc<dyn Roi>, limit: Rect) -> Self {
        Self { roi, limit }
    }
}

impl Roi for BoundedRoi {
    fn bounds(&self) -> Rect {
        self.roi.bounds().intersect(self.limit)
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        self.limit.contains(x, y) && self.roi.contains(x, y)
    }

    fn fill_mask(&self, rect: Rect, mask: &mut [u8]) {
        let inside = rect.intersect(self.limit);
        if inside.is_empty() {
            mask.fill(0);
            return;
        }
        self.roi.fill_mask(rect, mask);
        if inside == rect {
            return;
        }
        let w = rect.width as usize;
        for (row, line) in mask.chunks_exact_mut(w).enumerate() {
            let y = rect.y + row as i32;
            for (col, m) in line.iter_mut().enumerate() {
                if !self.limit.contains(rect.x + col as i32, y) {
                    *m = 0;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/setup/border.rs"]
mod tests;
