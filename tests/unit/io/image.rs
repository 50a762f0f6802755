use super::*;
use image::{GrayAlphaImage, LumaA, Rgb, RgbImage};

#[test]
fn gray_alpha_is_split_into_two_planes() {
    let mut img = GrayAlphaImage::new(2, 1);
    img.put_pixel(0, 0, LumaA([10, 255]));
    img.put_pixel(1, 0, LumaA([20, 0]));
    let loaded = raster_from_image(DynamicImage::ImageLumaA8(img), (5, -2)).unwrap();
    assert_eq!(loaded.image.bounds(), Rect::new(5, -2, 2, 1));
    assert_eq!(loaded.image.layout(), &SampleLayout::gray(SampleType::U8));
    assert_eq!(loaded.image.data::<u8>().unwrap(), &[10, 20]);
    let alpha = loaded.alpha.unwrap();
    assert_eq!(alpha.data::<u8>().unwrap(), &[255, 0]);
    assert_eq!(alpha.bounds(), loaded.image.bounds());
}

#[test]
fn rgb_has_no_alpha() {
    let mut img = RgbImage::new(1, 1);
    img.put_pixel(0, 0, Rgb([1, 2, 3]));
    let loaded = raster_from_image(DynamicImage::ImageRgb8(img), (0, 0)).unwrap();
    assert!(loaded.alpha.is_none());
    assert_eq!(loaded.image.layout(), &SampleLayout::rgb(SampleType::U8));
}

#[test]
fn export_round_trips_through_png() {
    let raster = Raster::from_vec(
        Rect::from_size(2, 1),
        SampleLayout::gray(SampleType::U16),
        vec![7u16, 60_000],
    )
    .unwrap();
    let path = std::env::temp_dir().join(format!("mosaic_io_{}.png", std::process::id()));
    save_raster(&raster, &path).unwrap();
    let loaded = load_raster(&path, (0, 0)).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded.image, raster);
}

#[test]
fn unsupported_layouts_are_rejected() {
    let raster = Raster::filled(
        Rect::from_size(1, 1),
        SampleLayout::gray(SampleType::F64),
        &[0.0],
    )
    .unwrap();
    assert!(matches!(
        raster_to_image(&raster),
        Err(MosaicError::Unsupported(_))
    ));
}
