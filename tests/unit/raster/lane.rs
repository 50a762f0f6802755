use super::*;

#[test]
fn integer_lanes_round_and_saturate() {
    assert_eq!(u8::from_f64(2.5), 3);
    assert_eq!(u8::from_f64(2.49), 2);
    assert_eq!(u8::from_f64(-4.0), 0);
    assert_eq!(u8::from_f64(300.0), 255);
    assert_eq!(u16::from_f64(70_000.0), u16::MAX);
    assert_eq!(i16::from_f64(-2.5), -3);
    assert_eq!(i16::from_f64(-40_000.0), i16::MIN);
    assert_eq!(i32::from_f64(f64::INFINITY), i32::MAX);
    assert_eq!(i32::from_f64(f64::NAN), 0);
}

#[test]
fn float_lanes_clamp_infinities_only() {
    assert_eq!(f32::from_f64(17.25), 17.25);
    assert_eq!(f32::from_f64(f64::INFINITY), f32::MAX);
    assert_eq!(f32::from_f64(f64::NEG_INFINITY), f32::MIN);
    assert_eq!(f32::from_f64(1e300), f32::MAX);
    assert!(f32::from_f64(f64::NAN).is_nan());
    assert_eq!(f64::from_f64(f64::INFINITY), f64::MAX);
    assert_eq!(f64::from_f64(0.1), 0.1);
}

#[test]
fn promotion_picks_narrowest_exact_lane() {
    use SampleType::*;
    assert_eq!(U8.promote(U8), U8);
    assert_eq!(U8.promote(U16), U16);
    assert_eq!(U8.promote(S16), S16);
    assert_eq!(U16.promote(S16), I32);
    assert_eq!(S16.promote(F32), F32);
    assert_eq!(I32.promote(F32), F64);
    assert_eq!(F64.promote(U8), F64);
}

#[test]
fn representability_is_exact() {
    use SampleType::*;
    assert!(F32.can_represent(U16));
    assert!(!F32.can_represent(I32));
    assert!(!U16.can_represent(S16));
    assert!(!U8.can_represent(U16));
}

#[test]
fn samples_fill_and_access() {
    let mut s = Samples::filled(SampleType::S16, 4, -7.6);
    assert_eq!(s.sample_type(), SampleType::S16);
    assert_eq!(s.len(), 4);
    assert_eq!(s.get_f64(3), Some(-8.0));
    assert!(s.set_f64(1, 12.0));
    assert!(!s.set_f64(9, 12.0));
    assert_eq!(i16::samples(&s), Some(&[-8i16, 12, -8, -8][..]));
    assert!(u8::samples(&s).is_none());
}

#[test]
fn alpha_scale_per_lane() {
    assert_eq!(u8::alpha_scale(), 255.0);
    assert_eq!(u16::alpha_scale(), 65535.0);
    assert_eq!(f32::alpha_scale(), 1.0);
}
