use std::sync::Arc;

use super::*;
use crate::mosaic::session::{MosaicOpts, SourceSpec};
use crate::raster::lane::SampleType;
use crate::raster::layout::SampleLayout;
use crate::raster::source::{RasterSource, RoiRects};

#[derive(Debug)]
struct Offline {
    bounds: Rect,
    layout: SampleLayout,
}

impl RasterSource for Offline {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn layout(&self) -> &SampleLayout {
        &self.layout
    }

    fn read(&self, _rect: Rect) -> MosaicResult<Cow<'_, Raster>> {
        Err(MosaicError::tile("storage offline"))
    }
}

fn gray8(bounds: Rect, fill: u8) -> Arc<dyn RasterSource> {
    Arc::new(
        Raster::filled(bounds, SampleLayout::gray(SampleType::U8), &[f64::from(fill)]).unwrap(),
    )
}

#[test]
fn tile_without_sources_takes_fast_path() {
    let session = MosaicSession::new(
        vec![SourceSpec::new(gray8(Rect::new(0, 0, 4, 4), 9))],
        MosaicOpts {
            bounds: Some(Rect::from_size(8, 8)),
            dest_no_data: Some(vec![3.0]),
            ..MosaicOpts::default()
        },
    )
    .unwrap();
    let mut scratch = TileScratch::default();
    let out = compute_tile(&session, Rect::new(4, 4, 4, 4), &mut scratch).unwrap();
    assert_eq!(out.outcome, TileOutcome::Empty);
    assert!(out.raster.data::<u8>().unwrap().iter().all(|&v| v == 3));

    let out = compute_tile(&session, Rect::new(2, 2, 4, 4), &mut scratch).unwrap();
    assert_eq!(out.outcome, TileOutcome::Computed { sources: 1 });
    assert_eq!(out.raster.sample(3, 3, 0), Some(9.0));
    assert_eq!(out.raster.sample(4, 3, 0), Some(3.0));
}

#[test]
fn source_failures_name_the_source() {
    let offline: Arc<dyn RasterSource> = Arc::new(Offline {
        bounds: Rect::from_size(4, 4),
        layout: SampleLayout::gray(SampleType::U8),
    });
    let session = MosaicSession::new(
        vec![
            SourceSpec::new(gray8(Rect::from_size(4, 4), 1)),
            SourceSpec::new(offline),
        ],
        MosaicOpts::default(),
    )
    .unwrap();
    let err = compute_tile(&session, Rect::from_size(2, 2), &mut TileScratch::default())
        .unwrap_err();
    assert!(matches!(err, MosaicError::Tile(_)));
    assert!(err.to_string().contains("source 1"));
    assert!(!err.is_structural());
}

#[test]
fn tiles_outside_bounds_are_rejected() {
    let src = SourceSpec::new(gray8(Rect::from_size(4, 4), 1));
    let session = MosaicSession::new(vec![src], MosaicOpts::default()).unwrap();
    assert!(compute_tile(&session, Rect::new(2, 2, 4, 4), &mut TileScratch::default()).is_err());
}

#[test]
fn roi_planes_are_recycled_between_tiles() {
    let src = SourceSpec::new(gray8(Rect::from_size(8, 8), 5))
        .with_roi(Arc::new(RoiRects::rect(Rect::from_size(3, 3))));
    let session = MosaicSession::new(vec![src], MosaicOpts::default()).unwrap();
    let mut scratch = TileScratch::default();
    for rect in [Rect::new(0, 0, 4, 4), Rect::new(4, 0, 4, 4), Rect::new(0, 4, 4, 4)] {
        compute_tile(&session, rect, &mut scratch).unwrap();
    }
    let counters = scratch.masks.counters();
    assert_eq!((counters.allocated, counters.reused), (1, 2));
    assert_eq!(counters.retained_bytes, 16);
}

#[test]
fn raw_no_data_flags_are_pooled_per_band() {
    let wide = Arc::new(
        Raster::filled(
            Rect::from_size(8, 8),
            SampleLayout::rgb(SampleType::U16),
            &[1000.0, 2000.0, 1000.0],
        )
        .unwrap(),
    );
    let src = SourceSpec::new(wide).with_no_data(NoDataRange::point(1000.0).unwrap());
    let under = SourceSpec::new(gray8(Rect::from_size(8, 8), 9));
    let session = MosaicSession::new(vec![src, under], MosaicOpts::default()).unwrap();
    assert!(session.sources()[0].raw_no_data().is_some());
    assert!(session.sources()[1].raw_no_data().is_none());

    let mut scratch = TileScratch::default();
    for rect in [Rect::new(0, 0, 4, 4), Rect::new(4, 4, 4, 4)] {
        let out = compute_tile(&session, rect, &mut scratch).unwrap();
        let x = rect.x;
        assert_eq!(out.raster.sample(x, rect.y, 0), Some(9.0));
        assert_eq!(out.raster.sample(x, rect.y, 1), Some(8.0));
        assert_eq!(out.raster.sample(x, rect.y, 2), Some(9.0));
    }
    let counters = scratch.masks.counters();
    assert_eq!((counters.allocated, counters.reused), (1, 1));
    assert_eq!(counters.retained_bytes, 4 * 3 * 4);
}

#[test]
fn alpha_weights_use_the_alpha_lane() {
    let image = Arc::new(
        Raster::from_vec(
            Rect::from_size(2, 1),
            SampleLayout::gray(SampleType::U16),
            vec![1000u16, 1000],
        )
        .unwrap(),
    );
    let alpha = Arc::new(
        Raster::from_vec(
            Rect::from_size(2, 1),
            SampleLayout::gray(SampleType::U8),
            vec![0u8, 128],
        )
        .unwrap(),
    );
    let session = MosaicSession::new(
        vec![SourceSpec::new(image).with_alpha(alpha)],
        MosaicOpts {
            dest_no_data: Some(vec![7.0]),
            ..MosaicOpts::default()
        },
    )
    .unwrap();
    let tile = session.compute_tile(Rect::from_size(2, 1)).unwrap();
    assert_eq!(tile.data::<u16>().unwrap(), &[7, 1000]);
}
