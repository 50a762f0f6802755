use super::*;
use crate::foundation::core::Rect;
use crate::raster::buffer::Raster;
use crate::raster::layout::SampleLayout;

fn raster<T: Lane>(w: u32, h: u32, bands: usize, data: Vec<T>) -> Raster {
    Raster::from_vec(
        Rect::from_size(w, h),
        SampleLayout::multiband(bands, T::TYPE),
        data,
    )
    .unwrap()
}

fn plane<'a, T: Lane>(
    r: &'a Raster,
    weight: WeightPlane<'a>,
    no_data: Option<NoDataRange>,
) -> SourcePlane<'a, T> {
    SourcePlane {
        image: r.view::<T>(r.bounds()).unwrap(),
        weight,
        no_data,
        excluded: None,
    }
}

fn run<T: Lane, C: Combine>(sources: &[SourcePlane<'_, T>], w: u32, h: u32, nd: T) -> Vec<T> {
    let mut out = raster::<T>(w, h, 1, vec![T::default(); (w * h) as usize]);
    composite::<T, C>(sources, &mut out.view_mut::<T>().unwrap(), &[nd]);
    out.data::<T>().unwrap().to_vec()
}

#[test]
fn overlay_takes_first_valid_source() {
    let a = raster(3, 1, 1, vec![0u8, 5, 0]);
    let b = raster(3, 1, 1, vec![7u8, 8, 0]);
    let nd = NoDataRange::point(0.0).ok();
    let sources = [
        plane::<u8>(&a, WeightPlane::Uniform, nd),
        plane::<u8>(&b, WeightPlane::Uniform, nd),
    ];
    assert_eq!(run::<u8, Overlay>(&sources, 3, 1, 99), vec![7, 5, 99]);
}

#[test]
fn overlay_ignores_weight_magnitude() {
    let a = raster(2, 1, 1, vec![1.0f32, 2.0]);
    let b = raster(2, 1, 1, vec![9.0f32, 9.0]);
    let weights = [0.01, 100.0];
    let sources = [
        plane::<f32>(&a, WeightPlane::Alpha(&weights), None),
        plane::<f32>(&b, WeightPlane::Uniform, None),
    ];
    assert_eq!(run::<f32, Overlay>(&sources, 2, 1, -1.0), vec![1.0, 2.0]);
}

#[test]
fn blend_is_weighted_average() {
    let a = raster(1, 1, 1, vec![10.0f64]);
    let b = raster(1, 1, 1, vec![20.0f64]);
    let (wa, wb) = ([1.0], [3.0]);
    let sources = [
        plane::<f64>(&a, WeightPlane::Alpha(&wa), None),
        plane::<f64>(&b, WeightPlane::Alpha(&wb), None),
    ];
    assert_eq!(run::<f64, Blend>(&sources, 1, 1, 0.0), vec![17.5]);
}

#[test]
fn blend_rounds_integer_lanes() {
    let a = raster(2, 1, 1, vec![1u8, 254]);
    let b = raster(2, 1, 1, vec![2u8, 255]);
    let sources = [
        plane::<u8>(&a, WeightPlane::Uniform, None),
        plane::<u8>(&b, WeightPlane::Uniform, None),
    ];
    assert_eq!(run::<u8, Blend>(&sources, 2, 1, 0), vec![2, 255]);
}

#[test]
fn blend_with_zero_weight_writes_no_data() {
    let a = raster(2, 1, 1, vec![4i16, 4]);
    let mask = [0u8, 1];
    let sources = [plane::<i16>(&a, WeightPlane::Roi(&mask), None)];
    assert_eq!(run::<i16, Blend>(&sources, 2, 1, -7), vec![-7, 4]);
}

#[test]
fn blend_nan_result_writes_no_data() {
    let a = raster(1, 1, 1, vec![f32::NAN]);
    let sources = [plane::<f32>(&a, WeightPlane::Uniform, None)];
    assert_eq!(run::<f32, Blend>(&sources, 1, 1, -1.0), vec![-1.0]);
}

#[test]
fn no_sources_fill_every_band_with_its_no_data() {
    let mut out = raster::<u16>(2, 1, 3, vec![0; 6]);
    composite::<u16, Overlay>(&[], &mut out.view_mut::<u16>().unwrap(), &[1, 2, 3]);
    assert_eq!(out.data::<u16>().unwrap(), &[1, 2, 3, 1, 2, 3]);
}

#[test]
fn no_data_is_checked_per_band() {
    let a = raster(1, 1, 2, vec![0u8, 50]);
    let b = raster(1, 1, 2, vec![9u8, 9]);
    let nd = NoDataRange::point(0.0).ok();
    let sources = [
        plane::<u8>(&a, WeightPlane::Uniform, nd),
        plane::<u8>(&b, WeightPlane::Uniform, None),
    ];
    let mut out = raster::<u8>(1, 1, 2, vec![0; 2]);
    composite::<u8, Overlay>(&sources, &mut out.view_mut::<u8>().unwrap(), &[255, 255]);
    assert_eq!(out.data::<u8>().unwrap(), &[9, 50]);
}

#[test]
fn raw_exclusions_override_converted_samples() {
    let a = raster(2, 1, 3, vec![10u8, 20, 30, 10, 20, 30]);
    let b = raster(2, 1, 3, vec![200u8, 200, 200, 200, 200, 200]);
    let flags = [1u8, 1, 1, 0, 0, 0];
    let mut first = plane::<u8>(&a, WeightPlane::Uniform, None);
    first.excluded = Some(&flags);
    let sources = [first, plane::<u8>(&b, WeightPlane::Uniform, None)];

    let mut out = raster::<u8>(2, 1, 3, vec![0; 6]);
    composite::<u8, Overlay>(&sources, &mut out.view_mut::<u8>().unwrap(), &[0, 0, 0]);
    assert_eq!(out.data::<u8>().unwrap(), &[200, 200, 200, 10, 20, 30]);

    let mut out = raster::<u8>(2, 1, 3, vec![0; 6]);
    composite::<u8, Blend>(&sources, &mut out.view_mut::<u8>().unwrap(), &[0, 0, 0]);
    assert_eq!(out.data::<u8>().unwrap(), &[200, 200, 200, 105, 110, 115]);
}
