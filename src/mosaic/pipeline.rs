use rayon::prelude::*;

use crate::foundation::core::{Rect, TileGrid};
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::buffer::Raster;

use super::driver::{TileOutcome, TileOutput, compute_tile};
use super::pool::TileScratch;
use super::session::MosaicSession;

/// Destination for finished tiles.
///
/// Tiles arrive in row-major grid order, each exactly once, covering the session bounds.
pub trait TileSink {
    /// Accept the computed samples for `rect`.
    fn accept(&mut self, rect: Rect, tile: &Raster) -> MosaicResult<()>;
}

/// Sink assembling tiles into one in-memory raster.
#[derive(Debug)]
pub struct RasterSink {
    raster: Raster,
}

impl RasterSink {
    /// Sink writing into `raster`; pixels of failed tiles keep their initial values.
    pub fn new(raster: Raster) -> Self {
        Self { raster }
    }

    /// Sink over a no-data-filled destination for `session`.
    pub fn for_session(session: &MosaicSession) -> MosaicResult<Self> {
        Ok(Self::new(session.blank_destination()?))
    }

    /// Assembled raster.
    pub fn into_raster(self) -> Raster {
        self.raster
    }
}

impl TileSink for RasterSink {
    fn accept(&mut self, rect: Rect, tile: &Raster) -> MosaicResult<()> {
        self.raster.copy_from(tile, rect)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Threading, tiling and chunking controls for rendering a mosaic.
pub struct RenderThreading {
    /// Enable parallel tile computation when `true`.
    pub parallel: bool,
    /// Chunk size in tiles for batched scheduling.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
            tile_width: 256,
            tile_height: 256,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Aggregated rendering counters.
pub struct RenderStats {
    /// Tiles in the grid.
    pub tiles_total: u64,
    /// Tiles composited from at least one source.
    pub tiles_computed: u64,
    /// Tiles filled through the no-source fast path.
    pub tiles_empty: u64,
    /// Tiles whose computation failed.
    pub tiles_failed: u64,
}

/// A tile that could not be computed.
#[derive(Debug)]
pub struct TileFailure {
    /// Destination rectangle of the tile.
    pub tile: Rect,
    /// Cause.
    pub error: MosaicError,
}

/// Outcome of [`render`].
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Counters.
    pub stats: RenderStats,
    /// Failed tiles in grid order.
    pub failures: Vec<TileFailure>,
}

impl RenderReport {
    /// Return `true` when every tile was delivered to the sink.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(
        &mut self,
        rect: Rect,
        result: MosaicResult<TileOutput>,
        sink: &mut dyn TileSink,
    ) -> MosaicResult<()> {
        self.stats.tiles_total += 1;
        match result {
            Ok(out) => {
                match out.outcome {
                    TileOutcome::Empty => self.stats.tiles_empty += 1,
                    TileOutcome::Computed { .. } => self.stats.tiles_computed += 1,
                }
                sink.accept(rect, &out.raster)
            }
            Err(error) => {
                tracing::warn!(tile = ?rect, %error, "tile failed");
                self.stats.tiles_failed += 1;
                self.failures.push(TileFailure { tile: rect, error });
                Ok(())
            }
        }
    }
}

/// Compute every tile of `session` and hand the results to `sink`.
///
/// Tile failures are collected in the report and do not stop the render; sink errors and invalid
/// threading settings do.
#[tracing::instrument(
    skip_all,
    fields(bounds = ?session.bounds(), parallel = threading.parallel)
)]
pub fn render(
    session: &MosaicSession,
    sink: &mut dyn TileSink,
    threading: &RenderThreading,
) -> MosaicResult<RenderReport> {
    let grid = TileGrid::new(
        session.bounds(),
        threading.tile_width,
        threading.tile_height,
    )?;
    let mut report = RenderReport::default();

    if !threading.parallel {
        let mut scratch = TileScratch::default();
        for rect in grid.tiles() {
            let result = compute_tile(session, rect, &mut scratch);
            report.record(rect, result, sink)?;
        }
        tracing::debug!(
            stats = ?report.stats,
            scratch = ?scratch.counters(),
            "render finished"
        );
        return Ok(report);
    }

    let pool = build_thread_pool(threading.threads)?;
    let chunk_size = normalized_chunk_size(threading.chunk_size);
    let tiles: Vec<Rect> = grid.tiles().collect();
    for chunk in tiles.chunks(chunk_size) {
        let results = pool.install(|| {
            chunk
                .par_iter()
                .map_init(TileScratch::default, |scratch, rect| {
                    compute_tile(session, *rect, scratch)
                })
                .collect::<Vec<_>>()
        });
        for (rect, result) in chunk.iter().zip(results) {
            report.record(*rect, result, sink)?;
        }
    }
    tracing::debug!(stats = ?report.stats, "render finished");
    Ok(report)
}

/// Render `session` into a new raster, failing on the first failed tile.
pub fn render_to_raster(
    session: &MosaicSession,
    threading: &RenderThreading,
) -> MosaicResult<Raster> {
    let mut sink = RasterSink::for_session(session)?;
    let mut report = render(session, &mut sink, threading)?;
    if let Some(failure) = report.failures.drain(..).next() {
        return Err(failure.error);
    }
    Ok(sink.into_raster())
}

fn build_thread_pool(threads: Option<usize>) -> MosaicResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MosaicError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MosaicError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> usize {
    chunk_size.max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/mosaic/pipeline.rs"]
mod tests;
