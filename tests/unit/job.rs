use super::*;
use crate::io::image::save_raster;
use crate::mosaic::session::MosaicMode;
use crate::raster::lane::SampleType;

const JOB: &str = r#"{
    "sources": [
        { "path": "a.png", "no_data": { "min": 0, "max": 0 } },
        { "path": "/abs/b.png", "origin": [4, 0],
          "roi": [{ "x": 4, "y": 0, "width": 2, "height": 2 }],
          "alpha": { "file": "mask.png" } }
    ],
    "opts": { "mode": "blend", "dest_no_data": [255] },
    "threading": { "parallel": true, "tile_width": 32, "tile_height": 32 }
}"#;

#[test]
fn parses_job_with_defaults() {
    let job = MosaicJob::from_json_str(JOB).unwrap();
    assert_eq!(job.sources.len(), 2);
    assert_eq!(job.sources[0].origin, [0, 0]);
    assert_eq!(job.sources[0].alpha, AlphaSource::Embedded);
    assert_eq!(job.sources[0].no_data, NoDataRange::point(0.0).ok());
    assert_eq!(job.sources[1].alpha, AlphaSource::File("mask.png".into()));
    assert_eq!(job.opts.mode, MosaicMode::Blend);
    assert!(job.threading.parallel);
    assert_eq!(job.threading.chunk_size, 64);
}

#[test]
fn relative_paths_resolve_against_base() {
    let mut job = MosaicJob::from_json_str(JOB).unwrap();
    job.resolve_paths(Path::new("/jobs"));
    assert_eq!(job.sources[0].path, PathBuf::from("/jobs/a.png"));
    assert_eq!(job.sources[1].path, PathBuf::from("/abs/b.png"));
    assert_eq!(
        job.sources[1].alpha,
        AlphaSource::File(PathBuf::from("/jobs/mask.png"))
    );
}

#[test]
fn malformed_json_is_a_serde_error() {
    assert!(matches!(
        MosaicJob::from_json_str("{ \"sources\": 3 }"),
        Err(MosaicError::Serde(_))
    ));
}

#[test]
fn builds_session_from_files() {
    let dir = std::env::temp_dir().join(format!("mosaic_job_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let tile = Raster::filled(
        Rect::from_size(4, 4),
        SampleLayout::gray(SampleType::U8),
        &[50.0],
    )
    .unwrap();
    save_raster(&tile, &dir.join("a.png")).unwrap();
    let json = r#"{ "sources": [ { "path": "a.png" }, { "path": "a.png", "origin": [4, 0] } ] }"#;
    std::fs::write(dir.join("job.json"), json).unwrap();

    let job = MosaicJob::load(&dir.join("job.json")).unwrap();
    let session = job.build_session().unwrap();
    let _ = std::fs::remove_dir_all(&dir);

    assert_eq!(session.bounds(), Rect::from_size(8, 4));
    assert_eq!(session.sources().len(), 2);
    assert!(session.sources().iter().all(|s| s.has_roi()));
}
