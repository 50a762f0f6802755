//! JSON job descriptions for the command-line front end.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::Rect;
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::io::image::load_raster;
use crate::mosaic::pipeline::RenderThreading;
use crate::mosaic::session::{MosaicOpts, MosaicSession, SourceSpec};
use crate::raster::buffer::Raster;
use crate::raster::layout::SampleLayout;
use crate::raster::nodata::NoDataRange;
use crate::raster::source::RoiRects;

/// Where a source's alpha plane comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaSource {
    /// The alpha channel of the source file, if it has one.
    #[default]
    Embedded,
    /// Ignore any alpha channel.
    Ignore,
    /// First channel of a separate image file.
    File(PathBuf),
}

/// One source entry of a job.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobSource {
    /// Image file.
    pub path: PathBuf,
    /// Image-space position of the top-left pixel.
    #[serde(default)]
    pub origin: [i32; 2],
    /// Optional no-data range over the image samples.
    #[serde(default)]
    pub no_data: Option<NoDataRange>,
    /// Optional ROI as a union of rectangles in image space.
    #[serde(default)]
    pub roi: Option<Vec<Rect>>,
    /// Alpha plane selection.
    #[serde(default)]
    pub alpha: AlphaSource,
}

/// A complete mosaic job: sources, session options and render threading.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MosaicJob {
    /// Sources in priority order.
    pub sources: Vec<JobSource>,
    /// Session options.
    #[serde(default)]
    pub opts: MosaicOpts,
    /// Render threading and tiling.
    #[serde(default)]
    pub threading: RenderThreading,
}

impl MosaicJob {
    /// Parse a job from JSON text. Paths are kept as written.
    pub fn from_json_str(s: &str) -> MosaicResult<Self> {
        serde_json::from_str(s).map_err(|e| MosaicError::serde(format!("parse job JSON: {e}")))
    }

    /// Read a job file. Relative paths are resolved against the file's directory.
    pub fn load(path: &Path) -> MosaicResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read job '{}'", path.display()))?;
        let mut job = Self::from_json_str(&text)?;
        job.resolve_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        Ok(job)
    }

    /// Make every relative path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for s in &mut self.sources {
            s.path = resolve(base, &s.path);
            if let AlphaSource::File(p) = &mut s.alpha {
                *p = resolve(base, p);
            }
        }
    }

    /// Decode all sources and set up the session.
    #[tracing::instrument(skip_all, fields(sources = self.sources.len()))]
    pub fn build_session(&self) -> MosaicResult<MosaicSession> {
        let mut specs = Vec::with_capacity(self.sources.len());
        for s in &self.sources {
            let origin = (s.origin[0], s.origin[1]);
            let loaded = load_raster(&s.path, origin)?;
            let mut spec = SourceSpec::new(Arc::new(loaded.image));
            match &s.alpha {
                AlphaSource::Embedded => {
                    if let Some(alpha) = loaded.alpha {
                        spec = spec.with_alpha(Arc::new(alpha));
                    }
                }
                AlphaSource::Ignore => {}
                AlphaSource::File(p) => {
                    let alpha = load_raster(p, origin)?.image;
                    spec = spec.with_alpha(Arc::new(first_band(alpha)?));
                }
            }
            if let Some(rects) = &s.roi {
                spec = spec.with_roi(Arc::new(RoiRects::new(rects.clone())));
            }
            if let Some(range) = s.no_data {
                spec = spec.with_no_data(range);
            }
            specs.push(spec);
        }
        MosaicSession::new(specs, self.opts.clone())
    }
}

fn resolve(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn first_band(raster: Raster) -> MosaicResult<Raster> {
    if raster.bands() == 1 {
        return Ok(raster);
    }
    let bounds = raster.bounds();
    let layout = SampleLayout::gray(raster.sample_type());
    let mut out = Raster::filled(bounds, layout, &[0.0])?;
    for y in bounds.y..bounds.y + bounds.height as i32 {
        for x in bounds.x..bounds.x + bounds.width as i32 {
            if let Some(v) = raster.sample(x, y, 0) {
                out.set_sample(x, y, 0, v)?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../tests/unit/job.rs"]
mod tests;
