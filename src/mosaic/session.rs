use std::sync::Arc;

use smallvec::SmallVec;

use crate::foundation::core::Rect;
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::buffer::{Raster, broadcast_fill};
use crate::raster::layout::SampleLayout;
use crate::raster::nodata::NoDataRange;
use crate::raster::source::{RasterSource, Roi, RoiRects};
use crate::setup::border::{BoundedRoi, extend_source};
use crate::setup::normalize::{Conversion, normalize_source};
use crate::setup::reconcile::{CombinedLayout, reconcile_layouts};

use super::classify::WeightStrategy;
use super::driver::{TileOutput, compute_tile};
use super::pool::TileScratch;

/// How valid source samples are combined into one destination sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MosaicMode {
    /// The first valid source in index order wins.
    #[default]
    Overlay,
    /// Weighted average of all valid sources.
    Blend,
}

/// Session configuration.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MosaicOpts {
    /// Combination mode.
    pub mode: MosaicMode,
    /// Destination no-data: one value for all bands or one per band. Defaults to the lane
    /// minimum.
    pub dest_no_data: Option<Vec<f64>>,
    /// Treat alpha as a 0/1 bitmask instead of a linear weight.
    pub binary_alpha: bool,
    /// Destination layout; reconciled from the sources when absent.
    pub target_layout: Option<SampleLayout>,
    /// Destination bounds; the union of source bounds when absent.
    pub bounds: Option<Rect>,
}

/// Caller-supplied description of one source.
#[derive(Clone, Debug)]
pub struct SourceSpec {
    /// Image data.
    pub image: Arc<dyn RasterSource>,
    /// Optional region of interest.
    pub roi: Option<Arc<dyn Roi>>,
    /// Optional single-band alpha plane.
    pub alpha: Option<Arc<dyn RasterSource>>,
    /// Optional no-data range over the image samples.
    pub no_data: Option<NoDataRange>,
}

impl SourceSpec {
    /// Source without auxiliary data.
    pub fn new(image: Arc<dyn RasterSource>) -> Self {
        Self {
            image,
            roi: None,
            alpha: None,
            no_data: None,
        }
    }

    /// Attach a region of interest.
    pub fn with_roi(mut self, roi: Arc<dyn Roi>) -> Self {
        self.roi = Some(roi);
        self
    }

    /// Attach an alpha plane.
    pub fn with_alpha(mut self, alpha: Arc<dyn RasterSource>) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Attach a no-data range.
    pub fn with_no_data(mut self, no_data: NoDataRange) -> Self {
        self.no_data = Some(no_data);
        self
    }
}

/// No-data test on unconverted samples, for sources whose conversion changes values.
#[derive(Clone, Debug)]
pub(crate) struct RawNoData {
    /// Source image before conversion, extended to the session bounds.
    pub(crate) image: Arc<dyn RasterSource>,
    pub(crate) conversion: Conversion,
    pub(crate) range: NoDataRange,
}

/// A source prepared for tile computation.
#[derive(Clone, Debug)]
pub struct SourceDescriptor {
    image: Arc<dyn RasterSource>,
    bounds: Rect,
    strategy: WeightStrategy,
    raw_no_data: Option<RawNoData>,
}

impl SourceDescriptor {
    /// Image normalized to the combined layout and extended to the session bounds.
    pub fn image(&self) -> &Arc<dyn RasterSource> {
        &self.image
    }

    /// Bounds of the original source data.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Weighting strategy chosen at setup.
    pub fn strategy(&self) -> &WeightStrategy {
        &self.strategy
    }

    pub(crate) fn raw_no_data(&self) -> Option<&RawNoData> {
        self.raw_no_data.as_ref()
    }

    /// Return `true` when the source is weighted by a ROI (explicit or implied by its bounds).
    pub fn has_roi(&self) -> bool {
        self.strategy.has_roi()
    }

    /// Return `true` when the source is weighted by alpha.
    pub fn has_alpha(&self) -> bool {
        self.strategy.has_alpha()
    }

    /// Return `true` when the source declares a no-data range.
    pub fn has_no_data(&self) -> bool {
        self.strategy.has_no_data()
    }
}

/// One compositing operation: reconciled layout, prepared sources and destination settings.
///
/// All setup work and all structural validation happen in [`MosaicSession::new`]; tiles can then
/// be computed in any order and in parallel.
#[derive(Debug)]
pub struct MosaicSession {
    mode: MosaicMode,
    binary_alpha: bool,
    bounds: Rect,
    layout: CombinedLayout,
    dest_no_data: SmallVec<[f64; 4]>,
    sources: Vec<SourceDescriptor>,
}

impl MosaicSession {
    /// Set up a session over `sources`.
    #[tracing::instrument(skip_all, fields(sources = sources.len(), mode = ?opts.mode))]
    pub fn new(sources: Vec<SourceSpec>, opts: MosaicOpts) -> MosaicResult<Self> {
        let bounds = match opts.bounds {
            Some(b) => b,
            None => sources
                .iter()
                .fold(Rect::default(), |acc, s| acc.union(s.image.bounds())),
        };
        if bounds.is_empty() {
            return Err(MosaicError::validation(
                "mosaic bounds are empty (no sources and no explicit bounds)",
            ));
        }

        for (i, s) in sources.iter().enumerate() {
            if let Some(alpha) = &s.alpha
                && alpha.layout().bands != 1
            {
                return Err(MosaicError::validation(format!(
                    "alpha of source {i} must have 1 band, got {}",
                    alpha.layout().bands
                )));
            }
        }

        let layouts: Vec<&SampleLayout> = sources.iter().map(|s| s.image.layout()).collect();
        let ranges: Vec<Option<NoDataRange>> = sources.iter().map(|s| s.no_data).collect();
        let layout = reconcile_layouts(&layouts, &ranges, opts.target_layout.as_ref())?;
        tracing::debug!(layout = %layout.layout, rule = ?layout.rule, "reconciled layout");

        let dest_no_data = match &opts.dest_no_data {
            Some(values) => broadcast_fill(values, layout.layout.bands)?,
            None => SmallVec::from_elem(layout.layout.sample_type.min_value(), layout.layout.bands),
        };

        let conversions = sources
            .iter()
            .map(|s| Conversion::plan(s.image.layout(), &layout.layout))
            .collect::<MosaicResult<Vec<_>>>()?;

        let mut prepared = Vec::with_capacity(sources.len());
        for (i, (spec, conversion)) in sources.into_iter().zip(conversions).enumerate() {
            let src = prepare_source(spec, conversion, bounds, &dest_no_data)?;
            tracing::debug!(
                source = i,
                strategy = src.strategy.kind(),
                no_data = src.has_no_data(),
                bounds = ?src.bounds,
                "prepared source"
            );
            prepared.push(src);
        }

        Ok(Self {
            mode: opts.mode,
            binary_alpha: opts.binary_alpha,
            bounds,
            layout,
            dest_no_data,
            sources: prepared,
        })
    }

    /// Set up a session from parallel arrays.
    ///
    /// Each auxiliary array must be absent or hold exactly one entry per image.
    pub fn from_parts(
        images: Vec<Arc<dyn RasterSource>>,
        rois: Option<Vec<Option<Arc<dyn Roi>>>>,
        alphas: Option<Vec<Option<Arc<dyn RasterSource>>>>,
        no_data: Option<Vec<Option<NoDataRange>>>,
        opts: MosaicOpts,
    ) -> MosaicResult<Self> {
        let n = images.len();
        check_len("ROI", rois.as_ref().map(Vec::len), n)?;
        check_len("alpha", alphas.as_ref().map(Vec::len), n)?;
        check_len("no-data", no_data.as_ref().map(Vec::len), n)?;

        let mut rois = rois.map(Vec::into_iter);
        let mut alphas = alphas.map(Vec::into_iter);
        let mut no_data = no_data.map(Vec::into_iter);
        let specs = images
            .into_iter()
            .map(|image| SourceSpec {
                image,
                roi: rois.as_mut().and_then(Iterator::next).flatten(),
                alpha: alphas.as_mut().and_then(Iterator::next).flatten(),
                no_data: no_data.as_mut().and_then(Iterator::next).flatten(),
            })
            .collect();
        Self::new(specs, opts)
    }

    /// Combination mode.
    pub fn mode(&self) -> MosaicMode {
        self.mode
    }

    /// Whether alpha is treated as a bitmask.
    pub fn binary_alpha(&self) -> bool {
        self.binary_alpha
    }

    /// Destination bounds.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Reconciled destination layout.
    pub fn layout(&self) -> &CombinedLayout {
        &self.layout
    }

    /// Destination no-data value of every band.
    pub fn dest_no_data(&self) -> &[f64] {
        &self.dest_no_data
    }

    /// Prepared sources in index order.
    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Destination raster filled with no-data, ready to receive tiles.
    pub fn blank_destination(&self) -> MosaicResult<Raster> {
        Raster::filled(self.bounds, self.layout.layout.clone(), &self.dest_no_data)
    }

    /// Compute one destination tile. `rect` must lie inside [`MosaicSession::bounds`].
    pub fn compute_tile(&self, rect: Rect) -> MosaicResult<Raster> {
        let mut scratch = TileScratch::default();
        self.compute_tile_with(rect, &mut scratch)
            .map(|TileOutput { raster, .. }| raster)
    }

    /// Compute one destination tile, reusing `scratch` planes across calls.
    pub fn compute_tile_with(
        &self,
        rect: Rect,
        scratch: &mut TileScratch,
    ) -> MosaicResult<TileOutput> {
        compute_tile(self, rect, scratch)
    }
}

fn check_len(what: &str, len: Option<usize>, expected: usize) -> MosaicResult<()> {
    match len {
        Some(n) if n != expected => Err(MosaicError::validation(format!(
            "{what} array has {n} entries for {expected} sources"
        ))),
        _ => Ok(()),
    }
}

fn prepare_source(
    spec: SourceSpec,
    conversion: Conversion,
    bounds: Rect,
    dest_no_data: &[f64],
) -> MosaicResult<SourceDescriptor> {
    let src_bounds = spec.image.bounds();
    let covers = src_bounds.contains_rect(bounds);

    // Ranges apply to raw samples; after a value-changing conversion the fill must come from
    // the destination instead.
    let raw_range = spec.no_data.filter(|_| !conversion.preserves_values());
    let fill: SmallVec<[f64; 4]> = match spec.no_data {
        Some(range) if raw_range.is_none() => SmallVec::from_elem(range.representative(), 1),
        _ => dest_no_data.iter().copied().collect(),
    };
    let raw_no_data = match raw_range {
        Some(range) => Some(RawNoData {
            image: extend_source(
                spec.image.clone(),
                bounds,
                src_bounds,
                &[range.representative()],
            )?,
            conversion: conversion.clone(),
            range,
        }),
        None => None,
    };
    let image = normalize_source(spec.image, conversion);
    let image = extend_source(image, bounds, src_bounds, &fill)?;

    let strategy = if let Some(alpha) = spec.alpha {
        WeightStrategy::Alpha {
            channel: extend_source(alpha, bounds, src_bounds, &[0.0])?,
            no_data: spec.no_data,
        }
    } else if let Some(roi) = spec.roi {
        WeightStrategy::Roi {
            mask: Arc::new(BoundedRoi::new(roi, src_bounds)),
            no_data: spec.no_data,
        }
    } else if !covers {
        WeightStrategy::Roi {
            mask: Arc::new(RoiRects::rect(src_bounds)),
            no_data: spec.no_data,
        }
    } else if let Some(range) = spec.no_data {
        WeightStrategy::NoData(range)
    } else {
        WeightStrategy::None
    };

    Ok(SourceDescriptor {
        image,
        bounds: src_bounds,
        strategy,
        raw_no_data,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/mosaic/session.rs"]
mod tests;
