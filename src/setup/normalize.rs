//! Per-source sample conversion into the combined layout.
//!
//! Conversions are planned once at session setup, so unrepresentable sources fail before any
//! tile is touched. The [`Normalized`] decorator then applies the plan lazily, one tile at a
//! time.

use std::borrow::Cow;
use std::sync::Arc;

use crate::foundation::core::Rect;
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::buffer::{Raster, TileView};
use crate::raster::lane::{Lane, SampleType, dispatch_lane};
use crate::raster::layout::{ColorSpace, Palette, SampleLayout};
use crate::raster::nodata::NoDataRange;
use crate::raster::source::RasterSource;

#[derive(Clone, Debug, PartialEq, Eq)]
enum BandMap {
    Identity,
    ExpandGray,
    Palette(Palette),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SampleMap {
    Identity,
    Cast,
    Rescale16To8,
}

/// Planned conversion from one source layout into the combined layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    to: SampleLayout,
    bands: BandMap,
    samples: SampleMap,
}

impl Conversion {
    /// Plan the conversion of `from` into `to`.
    ///
    /// Fails with a layout error when band or color component counts cannot be mapped and with
    /// an unsupported error when samples cannot be represented in the target lane.
    pub fn plan(from: &SampleLayout, to: &SampleLayout) -> MosaicResult<Self> {
        from.validate()?;
        to.validate()?;

        if from == to {
            return Ok(Self {
                to: to.clone(),
                bands: BandMap::Identity,
                samples: SampleMap::Identity,
            });
        }

        if to.is_indexed() {
            return Err(MosaicError::layout(format!(
                "cannot convert {from} into indexed layout {to}"
            )));
        }

        if let ColorSpace::Indexed(palette) = &from.color {
            if to.bands != 3 {
                return Err(MosaicError::layout(format!(
                    "palette colors have 3 components, destination {to} has {}",
                    to.bands
                )));
            }
            return Ok(Self {
                to: to.clone(),
                bands: BandMap::Palette(palette.clone()),
                samples: sample_map(SampleType::U8, to.sample_type)?,
            });
        }

        let bands = if from.bands == to.bands {
            BandMap::Identity
        } else if from.bands == 1 {
            BandMap::ExpandGray
        } else {
            return Err(MosaicError::layout(format!(
                "cannot map {} source bands onto {} destination bands",
                from.bands, to.bands
            )));
        };

        Ok(Self {
            to: to.clone(),
            bands,
            samples: sample_map(from.sample_type, to.sample_type)?,
        })
    }

    /// Return `true` when the conversion leaves samples untouched.
    pub fn is_identity(&self) -> bool {
        self.bands == BandMap::Identity && self.samples == SampleMap::Identity
    }

    /// Return `true` when every converted sample keeps the value of the raw sample it came from.
    ///
    /// Palette lookup and 16 to 8 bit rescaling change values, so no-data ranges of such sources
    /// must be tested before conversion with [`Conversion::exclusion`].
    pub fn preserves_values(&self) -> bool {
        !matches!(self.bands, BandMap::Palette(_)) && self.samples != SampleMap::Rescale16To8
    }

    /// Layout produced by the conversion.
    pub fn target(&self) -> &SampleLayout {
        &self.to
    }

    /// Convert the `rect` portion of `src` into a new raster in the target layout.
    pub fn apply(&self, src: &Raster, rect: Rect) -> MosaicResult<Raster> {
        let mut out = Raster::filled(rect, self.to.clone(), &[0.0])?;
        dispatch_lane!(src.sample_type(), S => {
            let view = src.view::<S>(rect)?;
            dispatch_lane!(self.to.sample_type, D => self.convert::<S, D>(&view, &mut out))
        })?;
        Ok(out)
    }

    /// Mark the raw samples of `src` over `rect` that fall in `range`.
    ///
    /// `plane` is pixel-interleaved with one entry per target band; an entry is 1 when the raw
    /// sample feeding that band is no-data.
    pub(crate) fn exclusion(
        &self,
        src: &Raster,
        rect: Rect,
        range: &NoDataRange,
        plane: &mut [u8],
    ) -> MosaicResult<()> {
        dispatch_lane!(src.sample_type(), S => {
            let view = src.view::<S>(rect)?;
            self.mark_excluded::<S>(&view, range, plane);
        });
        Ok(())
    }

    fn mark_excluded<S: Lane>(
        &self,
        src: &TileView<'_, S>,
        range: &NoDataRange,
        plane: &mut [u8],
    ) {
        let bands = self.to.bands;
        let width = src.width();
        for row in 0..src.height() {
            for col in 0..width {
                let base = (row * width + col) * bands;
                for (b, flag) in plane[base..base + bands].iter_mut().enumerate() {
                    let raw_band = match self.bands {
                        BandMap::Identity => b,
                        BandMap::ExpandGray | BandMap::Palette(_) => 0,
                    };
                    *flag = u8::from(range.contains_sample(src.get(col, row, raw_band)));
                }
            }
        }
    }

    fn convert<S: Lane, D: Lane>(
        &self,
        src: &TileView<'_, S>,
        out: &mut Raster,
    ) -> MosaicResult<()> {
        let mut dst = out.view_mut::<D>()?;
        let bands = dst.bands();
        let stride = dst.pixel_stride();
        for row in 0..src.height() {
            let line = dst.line_start(row, 0);
            for col in 0..src.width() {
                let base = line + col * stride;
                match &self.bands {
                    BandMap::Identity => {
                        for b in 0..bands {
                            dst.put(base + b, self.map_sample(src.get(col, row, b)));
                        }
                    }
                    BandMap::ExpandGray => {
                        let v: D = self.map_sample(src.get(col, row, 0));
                        for b in 0..bands {
                            dst.put(base + b, v);
                        }
                    }
                    BandMap::Palette(palette) => {
                        let index = src.get(col, row, 0).to_f64().max(0.0) as usize;
                        for (b, c) in palette.rgb(index).into_iter().enumerate() {
                            dst.put(base + b, self.map_sample(c));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    #[inline]
    fn map_sample<S: Lane, D: Lane>(&self, v: S) -> D {
        match self.samples {
            SampleMap::Identity | SampleMap::Cast => D::from_f64(v.to_f64()),
            SampleMap::Rescale16To8 => D::from_f64(v.to_f64() * 255.0 / 65535.0),
        }
    }
}

fn sample_map(from: SampleType, to: SampleType) -> MosaicResult<SampleMap> {
    if from == to {
        Ok(SampleMap::Identity)
    } else if to.can_represent(from) {
        Ok(SampleMap::Cast)
    } else if from == SampleType::U16 && to == SampleType::U8 {
        Ok(SampleMap::Rescale16To8)
    } else {
        Err(MosaicError::unsupported(format!(
            "{from} samples cannot be represented as {to}"
        )))
    }
}

/// Source decorator presenting another source in the combined layout.
#[derive(Debug)]
pub struct Normalized {
    inner: Arc<dyn RasterSource>,
    conversion: Conversion,
}

impl RasterSource for Normalized {
    fn bounds(&self) -> Rect {
        self.inner.bounds()
    }

    fn layout(&self) -> &SampleLayout {
        self.conversion.target()
    }

    fn read(&self, rect: Rect) -> MosaicResult<Cow<'_, Raster>> {
        let tile = self.inner.read(rect)?;
        Ok(Cow::Owned(self.conversion.apply(&tile, rect)?))
    }
}

/// Wrap `source` so it reads in the conversion's target layout. Identity conversions return the
/// source unchanged.
pub fn normalize_source(
    source: Arc<dyn RasterSource>,
    conversion: Conversion,
) -> Arc<dyn RasterSource> {
    if conversion.is_identity() {
        return source;
    }
    Arc::new(Normalized {
        inner: source,
        conversion,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/setup/normalize.rs"]
mod tests;
