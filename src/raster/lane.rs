//! Numeric pixel lanes.
//!
//! A lane is one of the six supported sample representations. Each lane knows how to widen a
//! sample to `f64` for classification and blending, and how to narrow a computed `f64` back into
//! its own storage type.

use std::fmt;

/// Run `$body` with `$t` bound to the storage type of the runtime lane `$ty`.
macro_rules! dispatch_lane {
    ($ty:expr, $t:ident => $body:expr) => {
        match $ty {
            $crate::raster::lane::SampleType::U8 => {
                type $t = u8;
                $body
            }
            $crate::raster::lane::SampleType::U16 => {
                type $t = u16;
                $body
            }
            $crate::raster::lane::SampleType::S16 => {
                type $t = i16;
                $body
            }
            $crate::raster::lane::SampleType::I32 => {
                type $t = i32;
                $body
            }
            $crate::raster::lane::SampleType::F32 => {
                type $t = f32;
                $body
            }
            $crate::raster::lane::SampleType::F64 => {
                type $t = f64;
                $body
            }
        }
    };
}
pub(crate) use dispatch_lane;

/// Sample representation of a raster band.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SampleType {
    /// Unsigned 8-bit.
    U8,
    /// Unsigned 16-bit.
    U16,
    /// Signed 16-bit.
    S16,
    /// Signed 32-bit.
    I32,
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
}

impl SampleType {
    /// All lanes, ordered from narrowest to widest storage.
    pub const ALL: [SampleType; 6] = [
        SampleType::U8,
        SampleType::U16,
        SampleType::S16,
        SampleType::I32,
        SampleType::F32,
        SampleType::F64,
    ];

    /// Return `true` for the floating-point lanes.
    pub fn is_floating(self) -> bool {
        matches!(self, SampleType::F32 | SampleType::F64)
    }

    /// Storage width in bits.
    pub fn bits(self) -> u32 {
        match self {
            SampleType::U8 => 8,
            SampleType::U16 | SampleType::S16 => 16,
            SampleType::I32 | SampleType::F32 => 32,
            SampleType::F64 => 64,
        }
    }

    /// Smallest representable value (lowest finite value for floats).
    pub fn min_value(self) -> f64 {
        match self {
            SampleType::U8 | SampleType::U16 => 0.0,
            SampleType::S16 => f64::from(i16::MIN),
            SampleType::I32 => f64::from(i32::MIN),
            SampleType::F32 => f64::from(f32::MIN),
            SampleType::F64 => f64::MIN,
        }
    }

    /// Largest representable value (highest finite value for floats).
    pub fn max_value(self) -> f64 {
        match self {
            SampleType::U8 => f64::from(u8::MAX),
            SampleType::U16 => f64::from(u16::MAX),
            SampleType::S16 => f64::from(i16::MAX),
            SampleType::I32 => f64::from(i32::MAX),
            SampleType::F32 => f64::from(f32::MAX),
            SampleType::F64 => f64::MAX,
        }
    }

    /// Return `true` when every value of `other` is exactly representable in `self`.
    pub fn can_represent(self, other: SampleType) -> bool {
        use SampleType::*;
        match (self, other) {
            (a, b) if a == b => true,
            (F64, _) => true,
            (F32, U8 | U16 | S16) => true,
            (I32, U8 | U16 | S16) => true,
            (U16 | S16, U8) => true,
            _ => false,
        }
    }

    /// Narrowest lane that represents both `self` and `other` exactly.
    pub fn promote(self, other: SampleType) -> SampleType {
        SampleType::ALL
            .into_iter()
            .find(|t| t.can_represent(self) && t.can_represent(other))
            .unwrap_or(SampleType::F64)
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleType::U8 => "u8",
            SampleType::U16 => "u16",
            SampleType::S16 => "s16",
            SampleType::I32 => "i32",
            SampleType::F32 => "f32",
            SampleType::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// Typed sample storage, one variant per lane.
///
/// Samples are pixel-interleaved: `bands` consecutive values form one pixel.
#[derive(Clone, Debug, PartialEq)]
pub enum Samples {
    /// Unsigned 8-bit samples.
    U8(Vec<u8>),
    /// Unsigned 16-bit samples.
    U16(Vec<u16>),
    /// Signed 16-bit samples.
    S16(Vec<i16>),
    /// Signed 32-bit samples.
    I32(Vec<i32>),
    /// 32-bit float samples.
    F32(Vec<f32>),
    /// 64-bit float samples.
    F64(Vec<f64>),
}

impl Samples {
    /// Allocate `len` samples of `ty`, all set to `value` (narrowed with lane rules).
    pub fn filled(ty: SampleType, len: usize, value: f64) -> Self {
        dispatch_lane!(ty, T => T::into_samples(vec![T::from_f64(value); len]))
    }

    /// Lane of the stored samples.
    pub fn sample_type(&self) -> SampleType {
        match self {
            Samples::U8(_) => SampleType::U8,
            Samples::U16(_) => SampleType::U16,
            Samples::S16(_) => SampleType::S16,
            Samples::I32(_) => SampleType::I32,
            Samples::F32(_) => SampleType::F32,
            Samples::F64(_) => SampleType::F64,
        }
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::U16(v) => v.len(),
            Samples::S16(v) => v.len(),
            Samples::I32(v) => v.len(),
            Samples::F32(v) => v.len(),
            Samples::F64(v) => v.len(),
        }
    }

    /// Return `true` when no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `idx` widened to `f64`.
    pub fn get_f64(&self, idx: usize) -> Option<f64> {
        match self {
            Samples::U8(v) => v.get(idx).map(|s| s.to_f64()),
            Samples::U16(v) => v.get(idx).map(|s| s.to_f64()),
            Samples::S16(v) => v.get(idx).map(|s| s.to_f64()),
            Samples::I32(v) => v.get(idx).map(|s| s.to_f64()),
            Samples::F32(v) => v.get(idx).map(|s| s.to_f64()),
            Samples::F64(v) => v.get(idx).map(|s| s.to_f64()),
        }
    }

    /// Overwrite the sample at `idx` with `value` narrowed to the lane. Returns `false` when out
    /// of range.
    pub fn set_f64(&mut self, idx: usize, value: f64) -> bool {
        dispatch_lane!(self.sample_type(), T => {
            match T::samples_mut(self).and_then(|s| s.get_mut(idx)) {
                Some(slot) => {
                    *slot = T::from_f64(value);
                    true
                }
                None => false,
            }
        })
    }
}

/// Storage type of one lane.
///
/// The compositing kernels are written once against this trait and instantiated for each lane.
pub trait Lane:
    Copy + PartialEq + PartialOrd + Default + Send + Sync + fmt::Debug + 'static
{
    /// Lane tag of this storage type.
    const TYPE: SampleType;

    /// Widen a sample to `f64`.
    fn to_f64(self) -> f64;

    /// Narrow an `f64` into the lane.
    ///
    /// Integer lanes round half away from zero and saturate at the lane bounds. Float lanes clamp
    /// infinities to the finite range and pass everything else through.
    fn from_f64(v: f64) -> Self;

    /// Divisor mapping an alpha sample into a linear weight.
    fn alpha_scale() -> f64;

    /// Borrow typed samples if `samples` stores this lane.
    fn samples(samples: &Samples) -> Option<&[Self]>;

    /// Mutably borrow typed samples if `samples` stores this lane.
    fn samples_mut(samples: &mut Samples) -> Option<&mut [Self]>;

    /// Wrap a typed vector.
    fn into_samples(v: Vec<Self>) -> Samples;
}

macro_rules! impl_int_lane {
    ($t:ty, $variant:ident) => {
        impl Lane for $t {
            const TYPE: SampleType = SampleType::$variant;

            #[inline]
            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                // `as` saturates and maps NaN to zero.
                v.round() as $t
            }

            fn alpha_scale() -> f64 {
                f64::from(<$t>::MAX)
            }

            fn samples(samples: &Samples) -> Option<&[Self]> {
                match samples {
                    Samples::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn samples_mut(samples: &mut Samples) -> Option<&mut [Self]> {
                match samples {
                    Samples::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_samples(v: Vec<Self>) -> Samples {
                Samples::$variant(v)
            }
        }
    };
}

impl_int_lane!(u8, U8);
impl_int_lane!(u16, U16);
impl_int_lane!(i16, S16);
impl_int_lane!(i32, I32);

impl Lane for f32 {
    const TYPE: SampleType = SampleType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            return f32::NAN;
        }
        v.clamp(f64::from(f32::MIN), f64::from(f32::MAX)) as f32
    }

    fn alpha_scale() -> f64 {
        1.0
    }

    fn samples(samples: &Samples) -> Option<&[Self]> {
        match samples {
            Samples::F32(v) => Some(v),
            _ => None,
        }
    }

    fn samples_mut(samples: &mut Samples) -> Option<&mut [Self]> {
        match samples {
            Samples::F32(v) => Some(v),
            _ => None,
        }
    }

    fn into_samples(v: Vec<Self>) -> Samples {
        Samples::F32(v)
    }
}

impl Lane for f64 {
    const TYPE: SampleType = SampleType::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            return f64::NAN;
        }
        v.clamp(f64::MIN, f64::MAX)
    }

    fn alpha_scale() -> f64 {
        1.0
    }

    fn samples(samples: &Samples) -> Option<&[Self]> {
        match samples {
            Samples::F64(v) => Some(v),
            _ => None,
        }
    }

    fn samples_mut(samples: &mut Samples) -> Option<&mut [Self]> {
        match samples {
            Samples::F64(v) => Some(v),
            _ => None,
        }
    }

    fn into_samples(v: Vec<Self>) -> Samples {
        Samples::F64(v)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/lane.rs"]
mod tests;
