//! Single-table per-pixel remapping.
//!
//! Shares the mosaic conventions: pixels outside the ROI, samples inside the no-data range and
//! samples that fall outside the table all receive the destination no-data value.

use std::borrow::Cow;
use std::sync::Arc;

use crate::foundation::core::Rect;
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::buffer::Raster;
use crate::raster::lane::{Lane, SampleType, dispatch_lane};
use crate::raster::layout::{ColorSpace, SampleLayout};
use crate::raster::nodata::NoDataRange;
use crate::raster::source::{RasterSource, Roi};

/// Lookup table indexed by integer sample value minus `offset`.
#[derive(Clone, Debug, PartialEq)]
pub struct LookupTable {
    offset: i64,
    tables: Vec<Vec<f64>>,
    sample_type: SampleType,
}

impl LookupTable {
    /// Table with one entry list per band, all of equal length, producing `sample_type` samples.
    pub fn new(offset: i64, tables: Vec<Vec<f64>>, sample_type: SampleType) -> MosaicResult<Self> {
        let Some(first) = tables.first() else {
            return Err(MosaicError::validation("lookup table needs at least one band"));
        };
        if first.is_empty() || tables.iter().any(|t| t.len() != first.len()) {
            return Err(MosaicError::validation(
                "lookup table bands must be non-empty and of equal length",
            ));
        }
        Ok(Self {
            offset,
            tables,
            sample_type,
        })
    }

    /// Single-band table.
    pub fn single(offset: i64, entries: Vec<f64>, sample_type: SampleType) -> MosaicResult<Self> {
        Self::new(offset, vec![entries], sample_type)
    }

    /// Number of table bands.
    pub fn bands(&self) -> usize {
        self.tables.len()
    }

    /// Lane of the produced samples.
    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Entry for `value` in `band`; bands past the last reuse the last table.
    #[inline]
    pub fn lookup(&self, band: usize, value: i64) -> Option<f64> {
        let table = &self.tables[band.min(self.tables.len() - 1)];
        let idx = usize::try_from(value.checked_sub(self.offset)?).ok()?;
        table.get(idx).copied()
    }
}

/// A source remapped through a [`LookupTable`].
#[derive(Debug)]
pub struct LookupOp {
    source: Arc<dyn RasterSource>,
    table: LookupTable,
    layout: SampleLayout,
    roi: Option<Arc<dyn Roi>>,
    no_data: Option<NoDataRange>,
    dest_no_data: f64,
}

impl LookupOp {
    /// Remap `source` through `table`.
    ///
    /// The source must use an integer lane. A single-band source with a multi-band table
    /// produces one output band per table band; otherwise table and source band counts must
    /// agree or the table must have one band.
    pub fn new(source: Arc<dyn RasterSource>, table: LookupTable) -> MosaicResult<Self> {
        let src = source.layout();
        src.validate()?;
        if src.sample_type.is_floating() {
            return Err(MosaicError::unsupported(format!(
                "lookup needs integer samples, source is {}",
                src.sample_type
            )));
        }
        let bands = match (src.bands, table.bands()) {
            (s, 1) => s,
            (1, t) => t,
            (s, t) if s == t => s,
            (s, t) => {
                return Err(MosaicError::validation(format!(
                    "lookup table has {t} bands for a {s}-band source"
                )));
            }
        };
        let color = if bands == src.bands && !src.is_indexed() {
            src.color.clone()
        } else {
            match bands {
                1 => ColorSpace::Gray,
                3 => ColorSpace::Rgb,
                _ => ColorSpace::Multiband,
            }
        };
        let layout = SampleLayout {
            bands,
            sample_type: table.sample_type(),
            color,
        };
        layout.validate()?;
        let dest_no_data = table.sample_type().min_value();
        Ok(Self {
            source,
            table,
            layout,
            roi: None,
            no_data: None,
            dest_no_data,
        })
    }

    /// Only remap pixels inside `roi`.
    pub fn with_roi(mut self, roi: Arc<dyn Roi>) -> Self {
        self.roi = Some(roi);
        self
    }

    /// Treat source samples inside `range` as missing.
    pub fn with_no_data(mut self, range: NoDataRange) -> Self {
        self.no_data = Some(range);
        self
    }

    /// Value written for excluded pixels (defaults to the lane minimum).
    pub fn with_dest_no_data(mut self, value: f64) -> Self {
        self.dest_no_data = value;
        self
    }

    fn remap<S: Lane, D: Lane>(
        &self,
        src: &Raster,
        rect: Rect,
        out: &mut Raster,
    ) -> MosaicResult<()> {
        let view = src.view::<S>(rect)?;
        let src_bands = src.bands();
        let mut mask = None;
        if let Some(roi) = &self.roi {
            let mut m = vec![0u8; rect.area() as usize];
            roi.fill_mask(rect, &mut m);
            mask = Some(m);
        }
        let no_data = D::from_f64(self.dest_no_data);
        let mut dst = out.view_mut::<D>()?;
        let (width, stride) = (dst.width(), dst.pixel_stride());
        for band in 0..dst.bands() {
            let src_band = if src_bands == 1 { 0 } else { band };
            for row in 0..dst.height() {
                let line = dst.line_start(row, band);
                for col in 0..width {
                    let inside = mask.as_ref().is_none_or(|m| m[row * width + col] != 0);
                    let v = view.get(col, row, src_band);
                    let mapped = if !inside || self.no_data.is_some_and(|r| r.contains_sample(v)) {
                        None
                    } else {
                        self.table.lookup(band, v.to_f64() as i64)
                    };
                    dst.put(line + col * stride, mapped.map_or(no_data, D::from_f64));
                }
            }
        }
        Ok(())
    }
}

impl RasterSource for LookupOp {
    fn bounds(&self) -> Rect {
        self.source.bounds()
    }

    fn layout(&self) -> &SampleLayout {
        &self.layout
    }

    fn read(&self, rect: Rect) -> MosaicResult<Cow<'_, Raster>> {
        if !self.bounds().contains_rect(rect) {
            return Err(MosaicError::tile(format!(
                "requested {rect:?} outside lookup bounds {:?}",
                self.bounds()
            )));
        }
        let src = self.source.read(rect)?;
        let mut out = Raster::filled(rect, self.layout.clone(), &[0.0])?;
        dispatch_lane!(src.sample_type(), S => {
            dispatch_lane!(self.layout.sample_type, D => self.remap::<S, D>(&src, rect, &mut out))
        })?;
        Ok(Cow::Owned(out))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lookup/table.rs"]
mod tests;
