use super::*;

#[test]
fn closed_and_open_ends() {
    let closed = NoDataRange::closed(0.0, 10.0).unwrap();
    assert!(closed.contains(0.0));
    assert!(closed.contains(10.0));
    assert!(!closed.contains(10.5));

    let open = NoDataRange::new(0.0, 10.0, false, false).unwrap();
    assert!(!open.contains(0.0));
    assert!(open.contains(0.5));
    assert!(!open.contains(10.0));
}

#[test]
fn point_range_matches_one_value() {
    let r = NoDataRange::point(0.0).unwrap();
    assert!(r.contains_sample(0u8));
    assert!(!r.contains_sample(1u8));
    assert_eq!(r.representative(), 0.0);
}

#[test]
fn nan_membership_is_explicit() {
    let r = NoDataRange::closed(-1.0, 1.0).unwrap();
    assert!(!r.contains(f64::NAN));
    assert!(r.with_nan().contains(f64::NAN));
    assert!(r.with_nan().contains_sample(0.5f32));

    let only_nan = NoDataRange::nan();
    assert!(only_nan.contains(f64::NAN));
    assert!(!only_nan.contains(0.0));
    assert!(!only_nan.contains(f64::INFINITY));
}

#[test]
fn invalid_ranges_are_rejected() {
    assert!(NoDataRange::closed(2.0, 1.0).is_err());
    assert!(NoDataRange::new(1.0, 1.0, true, false).is_err());
    assert!(NoDataRange::closed(f64::NAN, 1.0).is_err());
}

#[test]
fn representative_lies_inside() {
    let r = NoDataRange::new(0.0, 4.0, false, true).unwrap();
    assert!(r.contains(r.representative()));
    let r = NoDataRange::new(0.0, 4.0, false, false).unwrap();
    assert!(r.contains(r.representative()));
}

#[test]
fn deserializes_from_json() {
    let r: NoDataRange = serde_json::from_str(r#"{"min": 0}"#).unwrap();
    assert_eq!(r, NoDataRange::point(0.0).unwrap());

    let r: NoDataRange =
        serde_json::from_str(r#"{"min": 1, "max": 5, "max_included": false, "nan": true}"#)
            .unwrap();
    assert!(r.contains(1.0));
    assert!(!r.contains(5.0));
    assert!(r.contains(f64::NAN));

    assert!(serde_json::from_str::<NoDataRange>(r#"{"min": 3, "max": 1}"#).is_err());
    assert!(serde_json::from_str::<NoDataRange>("{}").is_err());
}
