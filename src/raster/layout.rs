//! Sample layouts: band count, lane and color interpretation.

use std::fmt;

use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::lane::SampleType;

/// Color lookup table for indexed rasters.
///
/// Holds one component table per color channel (red, green, blue and optionally alpha), all of
/// equal length.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Palette {
    components: Vec<Vec<u8>>,
}

impl Palette {
    /// Create a palette from 3 (RGB) or 4 (RGBA) component tables.
    pub fn new(components: Vec<Vec<u8>>) -> MosaicResult<Self> {
        if !(3..=4).contains(&components.len()) {
            return Err(MosaicError::layout(format!(
                "palette needs 3 or 4 component tables, got {}",
                components.len()
            )));
        }
        let len = components[0].len();
        if len == 0 || components.iter().any(|c| c.len() != len) {
            return Err(MosaicError::layout(
                "palette component tables must be non-empty and of equal length",
            ));
        }
        Ok(Self { components })
    }

    /// Build an RGB palette from `[r, g, b]` entries.
    pub fn from_rgb(entries: &[[u8; 3]]) -> MosaicResult<Self> {
        let mut comps = vec![Vec::with_capacity(entries.len()); 3];
        for e in entries {
            for (c, v) in comps.iter_mut().zip(e) {
                c.push(*v);
            }
        }
        Self::new(comps)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.components[0].len()
    }

    /// Return `true` when the palette has no entries (never true for a validated palette).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of color components (3 or 4).
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Color of entry `index`. Indices past the end map to the last entry.
    pub fn rgb(&self, index: usize) -> [u8; 3] {
        let i = index.min(self.len() - 1);
        [
            self.components[0][i],
            self.components[1][i],
            self.components[2][i],
        ]
    }
}

/// Color interpretation of a raster's bands.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// One luminance band.
    Gray,
    /// Three bands: red, green, blue.
    Rgb,
    /// One band of palette indices.
    Indexed(Palette),
    /// Bands without color interpretation.
    Multiband,
}

/// Band count, sample lane and color interpretation of a raster.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SampleLayout {
    /// Samples per pixel.
    pub bands: usize,
    /// Storage lane shared by all bands.
    pub sample_type: SampleType,
    /// Color interpretation.
    pub color: ColorSpace,
}

impl SampleLayout {
    /// Single-band gray layout.
    pub fn gray(sample_type: SampleType) -> Self {
        Self {
            bands: 1,
            sample_type,
            color: ColorSpace::Gray,
        }
    }

    /// Three-band RGB layout.
    pub fn rgb(sample_type: SampleType) -> Self {
        Self {
            bands: 3,
            sample_type,
            color: ColorSpace::Rgb,
        }
    }

    /// `bands` bands without color interpretation.
    pub fn multiband(bands: usize, sample_type: SampleType) -> Self {
        Self {
            bands,
            sample_type,
            color: ColorSpace::Multiband,
        }
    }

    /// Single band of palette indices.
    pub fn indexed(sample_type: SampleType, palette: Palette) -> Self {
        Self {
            bands: 1,
            sample_type,
            color: ColorSpace::Indexed(palette),
        }
    }

    /// Baseline truecolor layout used when sources cannot be reconciled otherwise.
    pub fn truecolor8() -> Self {
        Self::rgb(SampleType::U8)
    }

    /// Return `true` for palette-indexed layouts.
    pub fn is_indexed(&self) -> bool {
        matches!(self.color, ColorSpace::Indexed(_))
    }

    /// Palette of an indexed layout.
    pub fn palette(&self) -> Option<&Palette> {
        match &self.color {
            ColorSpace::Indexed(p) => Some(p),
            _ => None,
        }
    }

    /// Check that band count, lane and color interpretation agree.
    pub fn validate(&self) -> MosaicResult<()> {
        if self.bands == 0 {
            return Err(MosaicError::validation("layout must have at least one band"));
        }
        match &self.color {
            ColorSpace::Gray if self.bands != 1 => Err(MosaicError::layout(format!(
                "gray layout must have 1 band, got {}",
                self.bands
            ))),
            ColorSpace::Rgb if self.bands != 3 => Err(MosaicError::layout(format!(
                "rgb layout must have 3 bands, got {}",
                self.bands
            ))),
            ColorSpace::Indexed(_) if self.bands != 1 => Err(MosaicError::layout(format!(
                "indexed layout must have 1 band, got {}",
                self.bands
            ))),
            ColorSpace::Indexed(_)
                if !matches!(self.sample_type, SampleType::U8 | SampleType::U16) =>
            {
                Err(MosaicError::unsupported(format!(
                    "indexed layout requires u8 or u16 indices, got {}",
                    self.sample_type
                )))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for SampleLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color = match &self.color {
            ColorSpace::Gray => "gray".to_string(),
            ColorSpace::Rgb => "rgb".to_string(),
            ColorSpace::Indexed(p) => format!("indexed[{}]", p.len()),
            ColorSpace::Multiband => "multiband".to_string(),
        };
        write!(f, "{}x{} {}", self.bands, self.sample_type, color)
    }
}
