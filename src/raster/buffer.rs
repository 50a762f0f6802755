//! Owned rasters and strided tile views.
//!
//! A [`Raster`] stores pixel-interleaved samples for a rectangle in image space. A [`TileView`]
//! addresses a sub-rectangle of a raster through line stride, pixel stride and per-band offsets
//! without copying, so borrowed source data and freshly computed tiles are read the same way.

use smallvec::SmallVec;

use crate::foundation::core::Rect;
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::lane::{Lane, SampleType, Samples, dispatch_lane};
use crate::raster::layout::SampleLayout;

/// Pixel data for a rectangle of image space.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    bounds: Rect,
    layout: SampleLayout,
    samples: Samples,
}

impl Raster {
    /// Wrap existing samples. The sample count must equal `width * height * bands` and the
    /// storage lane must match the layout.
    pub fn new(bounds: Rect, layout: SampleLayout, samples: Samples) -> MosaicResult<Self> {
        layout.validate()?;
        if samples.sample_type() != layout.sample_type {
            return Err(MosaicError::validation(format!(
                "samples are {} but layout declares {}",
                samples.sample_type(),
                layout.sample_type
            )));
        }
        let expected = sample_count(bounds, layout.bands)?;
        if samples.len() != expected {
            return Err(MosaicError::validation(format!(
                "raster {}x{}x{} expects {expected} samples, got {}",
                bounds.width,
                bounds.height,
                layout.bands,
                samples.len()
            )));
        }
        Ok(Self {
            bounds,
            layout,
            samples,
        })
    }

    /// Allocate a raster with every band set to its entry in `fill`.
    ///
    /// `fill` holds either one value for all bands or one value per band.
    pub fn filled(bounds: Rect, layout: SampleLayout, fill: &[f64]) -> MosaicResult<Self> {
        layout.validate()?;
        let bands = layout.bands;
        let fill = broadcast_fill(fill, bands)?;
        let len = sample_count(bounds, bands)?;
        let samples = dispatch_lane!(layout.sample_type, T => {
            let per_band: SmallVec<[T; 4]> = fill.iter().map(|v| T::from_f64(*v)).collect();
            let mut v = Vec::with_capacity(len);
            for _ in 0..len / bands {
                v.extend_from_slice(&per_band);
            }
            T::into_samples(v)
        });
        Ok(Self {
            bounds,
            layout,
            samples,
        })
    }

    /// Build a raster from typed, pixel-interleaved samples.
    pub fn from_vec<T: Lane>(
        bounds: Rect,
        layout: SampleLayout,
        data: Vec<T>,
    ) -> MosaicResult<Self> {
        Self::new(bounds, layout, T::into_samples(data))
    }

    /// Covered rectangle.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Sample layout.
    pub fn layout(&self) -> &SampleLayout {
        &self.layout
    }

    /// Samples per pixel.
    pub fn bands(&self) -> usize {
        self.layout.bands
    }

    /// Storage lane.
    pub fn sample_type(&self) -> SampleType {
        self.layout.sample_type
    }

    /// Raw sample storage.
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Consume the raster and return its storage.
    pub fn into_samples(self) -> Samples {
        self.samples
    }

    /// Typed sample slice, if the raster stores lane `T`.
    pub fn data<T: Lane>(&self) -> Option<&[T]> {
        T::samples(&self.samples)
    }

    /// Sample at image coordinate `(x, y)` widened to `f64`.
    pub fn sample(&self, x: i32, y: i32, band: usize) -> Option<f64> {
        if band >= self.bands() {
            return None;
        }
        let (col, row) = self.bounds.local(x, y)?;
        self.samples.get_f64(self.index(col, row, band))
    }

    /// Overwrite the sample at image coordinate `(x, y)`.
    pub fn set_sample(&mut self, x: i32, y: i32, band: usize, value: f64) -> MosaicResult<()> {
        let (col, row) = self
            .bounds
            .local(x, y)
            .filter(|_| band < self.bands())
            .ok_or_else(|| {
                MosaicError::validation(format!("sample ({x},{y},{band}) out of range"))
            })?;
        let idx = self.index(col, row, band);
        self.samples.set_f64(idx, value);
        Ok(())
    }

    /// Replace the layout's color interpretation while keeping bands and lane.
    pub fn with_layout(mut self, layout: SampleLayout) -> MosaicResult<Self> {
        layout.validate()?;
        if layout.bands != self.layout.bands || layout.sample_type != self.layout.sample_type {
            return Err(MosaicError::validation(format!(
                "cannot relabel {} raster as {layout}",
                self.layout
            )));
        }
        self.layout = layout;
        Ok(self)
    }

    /// Read-only strided view of `rect`, which must lie inside the raster bounds.
    pub fn view<T: Lane>(&self, rect: Rect) -> MosaicResult<TileView<'_, T>> {
        let data = T::samples(&self.samples).ok_or_else(|| {
            MosaicError::tile(format!(
                "raster stores {} samples, {} requested",
                self.sample_type(),
                T::TYPE
            ))
        })?;
        let offset = self.view_offset(rect)?;
        Ok(TileView {
            data,
            width: rect.width as usize,
            height: rect.height as usize,
            offset,
            line_stride: self.line_stride(),
            pixel_stride: self.bands(),
            band_offsets: (0..self.bands()).collect(),
        })
    }

    /// Writable strided view of the whole raster.
    pub fn view_mut<T: Lane>(&mut self) -> MosaicResult<TileViewMut<'_, T>> {
        let line_stride = self.line_stride();
        let bands = self.bands();
        let (width, height) = (self.bounds.width as usize, self.bounds.height as usize);
        let stored = self.sample_type();
        let data = T::samples_mut(&mut self.samples).ok_or_else(|| {
            MosaicError::tile(format!("raster stores {stored} samples, {} requested", T::TYPE))
        })?;
        Ok(TileViewMut {
            data,
            width,
            height,
            line_stride,
            pixel_stride: bands,
            band_offsets: (0..bands).collect(),
        })
    }

    /// Copy `region` from `src` into `self`, clipped to both rasters. Both rasters must share
    /// bands and lane.
    pub fn copy_from(&mut self, src: &Raster, region: Rect) -> MosaicResult<()> {
        if src.bands() != self.bands() || src.sample_type() != self.sample_type() {
            return Err(MosaicError::tile(format!(
                "cannot copy {} raster into {} raster",
                src.layout, self.layout
            )));
        }
        let overlap = self.bounds.intersect(src.bounds).intersect(region);
        if overlap.is_empty() {
            return Ok(());
        }
        dispatch_lane!(self.sample_type(), T => copy_typed::<T>(self, src, overlap))
    }

    fn line_stride(&self) -> usize {
        self.bounds.width as usize * self.bands()
    }

    fn index(&self, col: usize, row: usize, band: usize) -> usize {
        row * self.line_stride() + col * self.bands() + band
    }

    fn view_offset(&self, rect: Rect) -> MosaicResult<usize> {
        if !self.bounds.contains_rect(rect) {
            return Err(MosaicError::tile(format!(
                "rect {rect:?} is outside raster bounds {:?}",
                self.bounds
            )));
        }
        if rect.is_empty() {
            return Ok(0);
        }
        let col = (i64::from(rect.x) - i64::from(self.bounds.x)) as usize;
        let row = (i64::from(rect.y) - i64::from(self.bounds.y)) as usize;
        Ok(self.index(col, row, 0))
    }
}

fn copy_typed<T: Lane>(dst: &mut Raster, src: &Raster, overlap: Rect) -> MosaicResult<()> {
    let from = src.view::<T>(overlap)?;
    let col0 = (i64::from(overlap.x) - i64::from(dst.bounds.x)) as usize;
    let row0 = (i64::from(overlap.y) - i64::from(dst.bounds.y)) as usize;
    let row_len = overlap.width as usize * dst.bands();
    let line_stride = dst.line_stride();
    let bands = dst.bands();
    let to = T::samples_mut(&mut dst.samples)
        .ok_or_else(|| MosaicError::tile("destination lane changed during copy"))?;
    for row in 0..from.height() {
        let d = (row0 + row) * line_stride + col0 * bands;
        let s = from.line_start(row, 0);
        to[d..d + row_len].copy_from_slice(&from.data[s..s + row_len]);
    }
    Ok(())
}

fn sample_count(bounds: Rect, bands: usize) -> MosaicResult<usize> {
    (bounds.width as usize)
        .checked_mul(bounds.height as usize)
        .and_then(|v| v.checked_mul(bands))
        .ok_or_else(|| MosaicError::validation("raster size overflow"))
}

pub(crate) fn broadcast_fill(fill: &[f64], bands: usize) -> MosaicResult<SmallVec<[f64; 4]>> {
    match fill.len() {
        1 => Ok(SmallVec::from_elem(fill[0], bands)),
        n if n == bands => Ok(fill.iter().copied().collect()),
        n => Err(MosaicError::validation(format!(
            "expected 1 or {bands} fill values, got {n}"
        ))),
    }
}

/// Read-only strided access to one rectangle of samples.
#[derive(Clone, Debug)]
pub struct TileView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    offset: usize,
    line_stride: usize,
    pixel_stride: usize,
    band_offsets: SmallVec<[usize; 4]>,
}

impl<'a, T: Lane> TileView<'a, T> {
    /// Bands per pixel.
    pub fn bands(&self) -> usize {
        self.band_offsets.len()
    }

    /// Columns in the view.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows in the view.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance between consecutive pixels of one row.
    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    /// Index of the first sample of `band` in `row`.
    #[inline]
    pub fn line_start(&self, row: usize, band: usize) -> usize {
        self.offset + row * self.line_stride + self.band_offsets[band]
    }

    /// Sample at absolute index `idx` (from [`TileView::line_start`] plus strides).
    #[inline]
    pub fn at(&self, idx: usize) -> T {
        self.data[idx]
    }

    /// Sample at view-relative `(col, row)`.
    #[inline]
    pub fn get(&self, col: usize, row: usize, band: usize) -> T {
        self.data[self.line_start(row, band) + col * self.pixel_stride]
    }
}

/// Writable strided access to a destination tile.
#[derive(Debug)]
pub struct TileViewMut<'a, T> {
    data: &'a mut [T],
    width: usize,
    height: usize,
    line_stride: usize,
    pixel_stride: usize,
    band_offsets: SmallVec<[usize; 4]>,
}

impl<T: Lane> TileViewMut<'_, T> {
    /// Columns in the view.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows in the view.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of bands per pixel.
    pub fn bands(&self) -> usize {
        self.band_offsets.len()
    }

    /// Distance between consecutive pixels of one row.
    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    /// Index of the first sample of `band` in `row`.
    #[inline]
    pub fn line_start(&self, row: usize, band: usize) -> usize {
        row * self.line_stride + self.band_offsets[band]
    }

    /// Write the sample at absolute index `idx`.
    #[inline]
    pub fn put(&mut self, idx: usize, value: T) {
        self.data[idx] = value;
    }

    /// Set every sample of `band` to `value`.
    pub fn fill_band(&mut self, band: usize, value: T) {
        for row in 0..self.height {
            let start = self.line_start(row, band);
            for col in 0..self.width {
                self.data[start + col * self.pixel_stride] = value;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/buffer.rs"]
mod tests;
