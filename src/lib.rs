//! Mosaic engine: tiled compositing of many raster sources into one destination raster.
//!
//! Sources may differ in bounds, band count and sample type. Each source can carry a region of
//! interest, an alpha plane and a no-data range. The public API is session-oriented:
//!
//! - Describe sources with [`SourceSpec`] and options with [`MosaicOpts`]
//! - Create a [`MosaicSession`]; layout reconciliation and all structural checks happen here
//! - Compute single tiles with [`MosaicSession::compute_tile`] or stream the whole destination
//!   into a [`TileSink`] with [`render`]
//!
//! Two combination modes are available: [`MosaicMode::Overlay`] keeps the first valid source
//! per pixel and [`MosaicMode::Blend`] takes the weighted average of all valid sources.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod io;
pub(crate) mod job;
pub(crate) mod lookup;
pub(crate) mod mosaic;
pub(crate) mod raster;
pub(crate) mod setup;

pub use crate::foundation::core::{Rect, TileGrid};
pub use crate::foundation::error::{MosaicError, MosaicResult};

pub use crate::io::image::{
    LoadedRaster, load_raster, raster_from_image, raster_to_image, save_raster,
};
pub use crate::job::{AlphaSource, JobSource, MosaicJob};
pub use crate::lookup::table::{LookupOp, LookupTable};
pub use crate::mosaic::classify::{
    MAX_ALPHA_WEIGHT, PixelDecision, Signal, WeightStrategy, alpha_weight, classify,
};
pub use crate::mosaic::driver::{TileOutcome, TileOutput};
pub use crate::mosaic::pipeline::{
    RasterSink, RenderReport, RenderStats, RenderThreading, TileFailure, TileSink, render,
    render_to_raster,
};
pub use crate::mosaic::pool::TileScratch;
pub use crate::mosaic::session::{
    MosaicMode, MosaicOpts, MosaicSession, SourceDescriptor, SourceSpec,
};
pub use crate::raster::buffer::{Raster, TileView, TileViewMut};
pub use crate::raster::lane::{Lane, SampleType, Samples};
pub use crate::raster::layout::{ColorSpace, Palette, SampleLayout};
pub use crate::raster::nodata::NoDataRange;
pub use crate::raster::source::{RasterSource, Roi, RoiMask, RoiRects};
pub use crate::setup::border::{BoundedRoi, Extended, extend_source};
pub use crate::setup::normalize::{Conversion, Normalized, normalize_source};
pub use crate::setup::reconcile::{CombinedLayout, ReconcileRule, reconcile_layouts};
