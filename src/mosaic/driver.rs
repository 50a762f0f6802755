//! Per-tile compute driver: collect sources, classify and composite, finalize.

use std::borrow::Cow;

use smallvec::SmallVec;

use crate::foundation::core::Rect;
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::buffer::Raster;
use crate::raster::lane::{Lane, dispatch_lane};
use crate::raster::nodata::NoDataRange;

use super::classify::{WeightStrategy, alpha_weight};
use super::kernel::{Blend, Overlay, SourcePlane, WeightPlane, composite};
use super::pool::TileScratch;
use super::session::{MosaicMode, MosaicSession};

/// How a tile was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileOutcome {
    /// No source intersected the tile; it was filled with destination no-data.
    Empty,
    /// The tile was composited from `sources` present sources.
    Computed {
        /// Number of sources intersecting the tile.
        sources: usize,
    },
}

/// A finished destination tile.
#[derive(Debug)]
pub struct TileOutput {
    /// Destination samples covering exactly the requested rectangle.
    pub raster: Raster,
    /// How the tile was produced.
    pub outcome: TileOutcome,
}

enum Weights {
    Uniform,
    Alpha(Vec<f64>),
    Roi(Vec<u8>),
}

/// Source data acquired for one tile.
struct Acquired<'s> {
    image: Cow<'s, Raster>,
    weights: Weights,
    no_data: Option<NoDataRange>,
    /// Raw-sample exclusions (plane width, flags per pixel and band); replaces `no_data`.
    excluded: Option<(u32, Vec<u8>)>,
}

impl Acquired<'_> {
    fn plane<T: Lane>(&self, rect: Rect) -> MosaicResult<SourcePlane<'_, T>> {
        Ok(SourcePlane {
            image: self.image.view::<T>(rect)?,
            weight: match &self.weights {
                Weights::Uniform => WeightPlane::Uniform,
                Weights::Alpha(w) => WeightPlane::Alpha(w),
                Weights::Roi(m) => WeightPlane::Roi(m),
            },
            no_data: self.no_data,
            excluded: self.excluded.as_ref().map(|(_, flags)| flags.as_slice()),
        })
    }
}

/// Compute the destination tile covering `rect`.
///
/// Failures to acquire source data are reported as tile errors naming the source; they never
/// affect other tiles.
pub(crate) fn compute_tile(
    session: &MosaicSession,
    rect: Rect,
    scratch: &mut TileScratch,
) -> MosaicResult<TileOutput> {
    if !session.bounds().contains_rect(rect) {
        return Err(MosaicError::validation(format!(
            "tile {rect:?} is outside mosaic bounds {:?}",
            session.bounds()
        )));
    }
    let layout = session.layout().layout.clone();

    // collect-sources
    let present: SmallVec<[usize; 8]> = session
        .sources()
        .iter()
        .enumerate()
        .filter(|(_, s)| s.bounds().intersects(rect))
        .map(|(i, _)| i)
        .collect();

    if present.is_empty() {
        tracing::trace!(?rect, "empty tile");
        let raster = Raster::filled(rect, layout, session.dest_no_data())?;
        return Ok(TileOutput {
            raster,
            outcome: TileOutcome::Empty,
        });
    }

    let mut acquired: SmallVec<[Acquired<'_>; 8]> = SmallVec::with_capacity(present.len());
    for &i in &present {
        match acquire(session, i, rect, scratch) {
            Ok(a) => acquired.push(a),
            Err(e) => {
                recycle(&mut acquired, rect, scratch);
                return Err(e);
            }
        }
    }

    // classify-and-composite
    let mut raster = Raster::filled(rect, layout, &[0.0])?;
    let result = dispatch_lane!(raster.sample_type(), T => {
        composite_tile::<T>(session, &acquired, rect, &mut raster)
    });

    // finalize
    recycle(&mut acquired, rect, scratch);
    result?;
    tracing::trace!(?rect, sources = present.len(), "computed tile");
    Ok(TileOutput {
        raster,
        outcome: TileOutcome::Computed {
            sources: present.len(),
        },
    })
}

fn acquire<'s>(
    session: &'s MosaicSession,
    index: usize,
    rect: Rect,
    scratch: &mut TileScratch,
) -> MosaicResult<Acquired<'s>> {
    let source = &session.sources()[index];
    let tile_err = |what: &str, e: MosaicError| {
        MosaicError::tile(format!("source {index}: cannot read {what} for {rect:?}: {e}"))
    };

    let image = source
        .image()
        .read(rect)
        .map_err(|e| tile_err("image", e))?;

    let weights = match source.strategy() {
        WeightStrategy::None | WeightStrategy::NoData(_) => Weights::Uniform,
        WeightStrategy::Roi { mask, .. } => {
            let mut plane = scratch.masks.borrow(rect.width, rect.height);
            mask.fill_mask(rect, &mut plane);
            Weights::Roi(plane)
        }
        WeightStrategy::Alpha { channel, .. } => {
            let alpha = channel.read(rect).map_err(|e| tile_err("alpha", e))?;
            let mut plane = scratch.weights.borrow(rect.width, rect.height);
            let binary = session.binary_alpha();
            let filled = dispatch_lane!(alpha.sample_type(), A => {
                fill_weights::<A>(&alpha, rect, binary, &mut plane)
            });
            if let Err(e) = filled {
                scratch.weights.release(rect.width, rect.height, plane);
                return Err(tile_err("alpha", e));
            }
            Weights::Alpha(plane)
        }
    };

    let mut acquired = Acquired {
        image,
        weights,
        no_data: source.strategy().no_data().copied(),
        excluded: None,
    };
    if let Some(raw) = source.raw_no_data() {
        let width = rect.width * raw.conversion.target().bands as u32;
        let mut plane = scratch.masks.borrow(width, rect.height);
        let marked = raw
            .image
            .read(rect)
            .and_then(|tile| raw.conversion.exclusion(&tile, rect, &raw.range, &mut plane));
        if let Err(e) = marked {
            scratch.masks.release(width, rect.height, plane);
            release_weights(acquired.weights, rect, scratch);
            return Err(tile_err("raw samples", e));
        }
        acquired.no_data = None;
        acquired.excluded = Some((width, plane));
    }
    Ok(acquired)
}

fn fill_weights<A: Lane>(
    alpha: &Raster,
    rect: Rect,
    binary: bool,
    plane: &mut [f64],
) -> MosaicResult<()> {
    let view = alpha.view::<A>(rect)?;
    let width = view.width();
    for row in 0..view.height() {
        let start = view.line_start(row, 0);
        let stride = view.pixel_stride();
        for (col, w) in plane[row * width..(row + 1) * width].iter_mut().enumerate() {
            *w = alpha_weight(view.at(start + col * stride), binary);
        }
    }
    Ok(())
}

fn composite_tile<T: Lane>(
    session: &MosaicSession,
    acquired: &[Acquired<'_>],
    rect: Rect,
    out: &mut Raster,
) -> MosaicResult<()> {
    let planes = acquired
        .iter()
        .map(|a| a.plane::<T>(rect))
        .collect::<MosaicResult<SmallVec<[SourcePlane<'_, T>; 8]>>>()?;
    let no_data: SmallVec<[T; 4]> = session
        .dest_no_data()
        .iter()
        .map(|&v| T::from_f64(v))
        .collect();

    let mut dst = out.view_mut::<T>()?;
    match session.mode() {
        MosaicMode::Overlay => composite::<T, Overlay>(&planes, &mut dst, &no_data),
        MosaicMode::Blend => composite::<T, Blend>(&planes, &mut dst, &no_data),
    }
    Ok(())
}

fn recycle(acquired: &mut SmallVec<[Acquired<'_>; 8]>, rect: Rect, scratch: &mut TileScratch) {
    for a in acquired.drain(..) {
        if let Some((width, plane)) = a.excluded {
            scratch.masks.release(width, rect.height, plane);
        }
        release_weights(a.weights, rect, scratch);
    }
}

fn release_weights(weights: Weights, rect: Rect, scratch: &mut TileScratch) {
    match weights {
        Weights::Uniform => {}
        Weights::Alpha(plane) => scratch.weights.release(rect.width, rect.height, plane),
        Weights::Roi(plane) => scratch.masks.release(rect.width, rect.height, plane),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mosaic/driver.rs"]
mod tests;
