//! Layout reconciliation across heterogeneous sources.

use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::layout::{ColorSpace, SampleLayout};
use crate::raster::nodata::NoDataRange;

/// Which reconciliation rule produced a [`CombinedLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileRule {
    /// The caller supplied the destination layout.
    Explicit,
    /// Exactly one source; its layout is adopted unchanged.
    Single,
    /// All sources share lane, band count and (for palettes) identical color tables.
    Identical,
    /// All sources are single-band and non-indexed; the lanes are promoted to the narrowest lane
    /// that represents every source exactly, which may be a lane no source uses (u16 and s16
    /// give i32).
    WidestGray,
    /// Baseline 3-band 8-bit truecolor.
    Fallback,
}

/// Destination layout shared by all normalized sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombinedLayout {
    /// Reconciled layout.
    pub layout: SampleLayout,
    /// Rule that produced it.
    pub rule: ReconcileRule,
}

/// Compute one destination layout for `sources`.
///
/// `no_data` holds one optional range per source (or is empty); it only matters when comparing
/// palette-indexed sources, whose no-data ranges must agree for the palette to be kept. Whether
/// each source can actually be converted into the result is checked by
/// [`crate::setup::normalize::Conversion::plan`].
pub fn reconcile_layouts(
    sources: &[&SampleLayout],
    no_data: &[Option<NoDataRange>],
    target: Option<&SampleLayout>,
) -> MosaicResult<CombinedLayout> {
    for layout in sources {
        layout.validate()?;
    }

    if let Some(target) = target {
        target.validate()?;
        return Ok(CombinedLayout {
            layout: target.clone(),
            rule: ReconcileRule::Explicit,
        });
    }

    let Some(first) = sources.first() else {
        return Err(MosaicError::validation(
            "mosaic without sources needs an explicit target layout",
        ));
    };

    if sources.len() == 1 {
        return Ok(CombinedLayout {
            layout: (*first).clone(),
            rule: ReconcileRule::Single,
        });
    }

    let same_shape = sources
        .iter()
        .all(|l| l.sample_type == first.sample_type && l.bands == first.bands);
    let all_indexed = sources.iter().all(|l| l.is_indexed());
    let none_indexed = sources.iter().all(|l| !l.is_indexed());

    if same_shape && none_indexed {
        let color = if sources.iter().all(|l| l.color == first.color) {
            first.color.clone()
        } else {
            ColorSpace::Multiband
        };
        return Ok(CombinedLayout {
            layout: SampleLayout {
                bands: first.bands,
                sample_type: first.sample_type,
                color,
            },
            rule: ReconcileRule::Identical,
        });
    }

    if same_shape && all_indexed && palettes_match(sources, no_data) {
        return Ok(CombinedLayout {
            layout: (*first).clone(),
            rule: ReconcileRule::Identical,
        });
    }

    if none_indexed && sources.iter().all(|l| l.bands == 1) {
        let sample_type = sources
            .iter()
            .skip(1)
            .fold(first.sample_type, |acc, l| acc.promote(l.sample_type));
        return Ok(CombinedLayout {
            layout: SampleLayout::gray(sample_type),
            rule: ReconcileRule::WidestGray,
        });
    }

    tracing::warn!(
        sources = sources.len(),
        "source layouts differ; falling back to 3-band 8-bit truecolor"
    );
    Ok(CombinedLayout {
        layout: SampleLayout::truecolor8(),
        rule: ReconcileRule::Fallback,
    })
}

fn palettes_match(sources: &[&SampleLayout], no_data: &[Option<NoDataRange>]) -> bool {
    let first = sources[0].palette();
    let palettes_equal = sources.iter().all(|l| l.palette() == first);
    let ranges_equal = no_data.iter().all(|r| *r == no_data[0]);
    palettes_equal && ranges_equal
}

#[cfg(test)]
#[path = "../../tests/unit/setup/reconcile.rs"]
mod tests;
