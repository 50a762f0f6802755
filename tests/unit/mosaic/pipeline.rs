use std::borrow::Cow;
use std::sync::Arc;

use super::*;
use crate::mosaic::session::{MosaicOpts, SourceSpec};
use crate::raster::lane::SampleType;
use crate::raster::layout::SampleLayout;
use crate::raster::source::RasterSource;

/// Source that fails for every read touching the column `x = bad_x`.
#[derive(Debug)]
struct Flaky {
    inner: Raster,
    bad_x: i32,
}

impl RasterSource for Flaky {
    fn bounds(&self) -> Rect {
        self.inner.bounds()
    }

    fn layout(&self) -> &SampleLayout {
        self.inner.layout()
    }

    fn read(&self, rect: Rect) -> MosaicResult<Cow<'_, Raster>> {
        if rect.contains(self.bad_x, rect.y) {
            return Err(MosaicError::tile("bad column"));
        }
        Ok(Cow::Borrowed(&self.inner))
    }
}

fn ramp(w: u32, h: u32) -> Raster {
    let data: Vec<u16> = (0..w * h).map(|i| i as u16).collect();
    Raster::from_vec(
        Rect::from_size(w, h),
        SampleLayout::gray(SampleType::U16),
        data,
    )
    .unwrap()
}

fn small_tiles(parallel: bool) -> RenderThreading {
    RenderThreading {
        parallel,
        threads: Some(2),
        chunk_size: 3,
        tile_width: 4,
        tile_height: 3,
    }
}

#[test]
fn sequential_render_reproduces_single_source() {
    let src = ramp(10, 7);
    let session = MosaicSession::new(
        vec![SourceSpec::new(Arc::new(src.clone()))],
        MosaicOpts::default(),
    )
    .unwrap();
    let out = render_to_raster(&session, &small_tiles(false)).unwrap();
    assert_eq!(out.data::<u16>(), src.data::<u16>());
}

#[test]
fn parallel_render_matches_sequential() {
    let session = MosaicSession::new(
        vec![
            SourceSpec::new(Arc::new(ramp(10, 7))),
            SourceSpec::new(Arc::new(
                Raster::filled(
                    Rect::new(12, 0, 4, 4),
                    SampleLayout::gray(SampleType::U16),
                    &[9.0],
                )
                .unwrap(),
            )),
        ],
        MosaicOpts::default(),
    )
    .unwrap();
    let seq = render_to_raster(&session, &small_tiles(false)).unwrap();
    let par = render_to_raster(&session, &small_tiles(true)).unwrap();
    assert_eq!(seq.data::<u16>(), par.data::<u16>());
    assert_eq!(seq.sample(11, 0, 0), Some(0.0));
    assert_eq!(seq.sample(12, 0, 0), Some(9.0));
}

#[test]
fn stats_count_empty_tiles() {
    let session = MosaicSession::new(
        vec![SourceSpec::new(Arc::new(ramp(4, 3)))],
        MosaicOpts {
            bounds: Some(Rect::from_size(8, 6)),
            ..MosaicOpts::default()
        },
    )
    .unwrap();
    let mut sink = RasterSink::for_session(&session).unwrap();
    let report = render(&session, &mut sink, &small_tiles(true)).unwrap();
    assert!(report.is_complete());
    assert_eq!(
        report.stats,
        RenderStats {
            tiles_total: 4,
            tiles_computed: 1,
            tiles_empty: 3,
            tiles_failed: 0,
        }
    );
}

#[test]
fn failed_tiles_do_not_stop_the_render() {
    let flaky = Flaky {
        inner: ramp(8, 3),
        bad_x: 5,
    };
    let session =
        MosaicSession::new(vec![SourceSpec::new(Arc::new(flaky))], MosaicOpts::default()).unwrap();
    for parallel in [false, true] {
        let mut sink = RasterSink::for_session(&session).unwrap();
        let report = render(&session, &mut sink, &small_tiles(parallel)).unwrap();
        assert_eq!(report.stats.tiles_failed, 1);
        assert_eq!(report.failures[0].tile, Rect::new(4, 0, 4, 3));
        let out = sink.into_raster();
        assert_eq!(out.sample(3, 0, 0), Some(3.0));
        assert_eq!(out.sample(4, 0, 0), Some(0.0));
    }
    assert!(render_to_raster(&session, &small_tiles(false)).is_err());
}

#[test]
fn zero_threads_are_rejected() {
    let session =
        MosaicSession::new(vec![SourceSpec::new(Arc::new(ramp(2, 2)))], MosaicOpts::default())
            .unwrap();
    let threading = RenderThreading {
        parallel: true,
        threads: Some(0),
        ..RenderThreading::default()
    };
    assert!(matches!(
        render_to_raster(&session, &threading),
        Err(MosaicError::Validation(_))
    ));
}
