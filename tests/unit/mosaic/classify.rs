use super::*;
use crate::foundation::core::Rect;
use crate::raster::source::RoiRects;

#[test]
fn no_data_dominates_every_signal() {
    let nd = NoDataRange::point(0.0).unwrap();
    for signal in [Signal::Uniform, Signal::Alpha(1.0), Signal::Roi(true)] {
        assert_eq!(classify(0u8, Some(&nd), signal), PixelDecision::INVALID);
    }
    assert_eq!(classify(1u8, Some(&nd), Signal::Uniform), PixelDecision::FULL);
}

#[test]
fn nan_samples_follow_the_range() {
    let nd = NoDataRange::nan();
    assert!(!classify(f32::NAN, Some(&nd), Signal::Uniform).valid);
    assert!(classify(f32::NAN, None, Signal::Uniform).valid);
}

#[test]
fn alpha_weight_is_used_directly() {
    let d = classify(5i32, None, Signal::Alpha(0.25));
    assert!(d.valid);
    assert_eq!(d.weight, 0.25);
    assert_eq!(classify(5i32, None, Signal::Alpha(0.0)), PixelDecision::INVALID);
}

#[test]
fn roi_membership_weighs_one_or_zero() {
    assert_eq!(classify(9u16, None, Signal::Roi(true)), PixelDecision::FULL);
    assert_eq!(classify(9u16, None, Signal::Roi(false)), PixelDecision::INVALID);
}

#[test]
fn linear_alpha_scales_integer_lanes() {
    assert_eq!(alpha_weight(255u8, false), 1.0);
    assert_eq!(alpha_weight(0u8, false), 0.0);
    assert!((alpha_weight(32768u16, false) - 0.5).abs() < 1e-4);
    assert_eq!(alpha_weight(-4i16, false), 0.0);
}

#[test]
fn linear_alpha_keeps_float_values() {
    assert_eq!(alpha_weight(3.0f32, false), 3.0);
    assert_eq!(alpha_weight(-1.0f64, false), 0.0);
    assert_eq!(alpha_weight(f64::NAN, false), 0.0);
}

#[test]
fn infinite_alpha_is_capped() {
    assert_eq!(alpha_weight(f32::INFINITY, false), MAX_ALPHA_WEIGHT);
    assert_eq!(alpha_weight(f64::INFINITY, true), 1.0);
    assert!(classify(5u8, None, Signal::Alpha(alpha_weight(f64::INFINITY, false))).valid);
}

#[test]
fn binary_alpha_is_a_bitmask() {
    assert_eq!(alpha_weight(1u8, true), 1.0);
    assert_eq!(alpha_weight(0.001f32, true), 1.0);
    assert_eq!(alpha_weight(0u16, true), 0.0);
}

#[test]
fn strategy_flags() {
    let nd = NoDataRange::point(3.0).unwrap();
    let roi = WeightStrategy::Roi {
        mask: Arc::new(RoiRects::rect(Rect::from_size(2, 2))),
        no_data: Some(nd),
    };
    assert!(roi.has_roi() && roi.has_no_data() && !roi.has_alpha());
    assert_eq!(roi.kind(), "roi");
    assert!(!WeightStrategy::None.has_no_data());
    assert_eq!(WeightStrategy::NoData(nd).no_data(), Some(&nd));
}
