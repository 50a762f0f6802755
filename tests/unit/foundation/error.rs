use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MosaicError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(MosaicError::layout("x").to_string().contains("layout error:"));
    assert!(
        MosaicError::unsupported("x")
            .to_string()
            .contains("unsupported sample type:")
    );
    assert!(MosaicError::tile("x").to_string().contains("tile error:"));
    assert!(
        MosaicError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn structural_errors_are_classified() {
    assert!(MosaicError::validation("x").is_structural());
    assert!(MosaicError::layout("x").is_structural());
    assert!(MosaicError::unsupported("x").is_structural());
    assert!(!MosaicError::tile("x").is_structural());
    assert!(!MosaicError::serde("x").is_structural());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MosaicError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
