//! Raster import and export through the `image` crate.

use std::path::Path;

use anyhow::Context;
use image::{DynamicImage, ImageBuffer};

use crate::foundation::core::Rect;
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::raster::buffer::Raster;
use crate::raster::lane::{Lane, SampleType};
use crate::raster::layout::SampleLayout;

/// A decoded image: color samples plus the alpha channel, if the file had one.
#[derive(Clone, Debug)]
pub struct LoadedRaster {
    /// Gray or RGB samples.
    pub image: Raster,
    /// Single-band alpha in the same lane as `image`.
    pub alpha: Option<Raster>,
}

/// Decode the image file at `path`, placing its top-left pixel at `origin`.
pub fn load_raster(path: &Path, origin: (i32, i32)) -> MosaicResult<LoadedRaster> {
    let img = image::open(path).with_context(|| format!("decode image {}", path.display()))?;
    raster_from_image(img, origin)
}

/// Convert a decoded image into rasters placed at `origin`.
///
/// Gray and RGB images keep their 8-bit, 16-bit or 32-bit float samples; any other pixel
/// format is converted to 8-bit RGBA first.
pub fn raster_from_image(img: DynamicImage, origin: (i32, i32)) -> MosaicResult<LoadedRaster> {
    let bounds = Rect::new(origin.0, origin.1, img.width(), img.height());
    match img {
        DynamicImage::ImageLuma8(b) => split(bounds, b.into_raw(), 1, false),
        DynamicImage::ImageLumaA8(b) => split(bounds, b.into_raw(), 1, true),
        DynamicImage::ImageRgb8(b) => split(bounds, b.into_raw(), 3, false),
        DynamicImage::ImageRgba8(b) => split(bounds, b.into_raw(), 3, true),
        DynamicImage::ImageLuma16(b) => split(bounds, b.into_raw(), 1, false),
        DynamicImage::ImageLumaA16(b) => split(bounds, b.into_raw(), 1, true),
        DynamicImage::ImageRgb16(b) => split(bounds, b.into_raw(), 3, false),
        DynamicImage::ImageRgba16(b) => split(bounds, b.into_raw(), 3, true),
        DynamicImage::ImageRgb32F(b) => split(bounds, b.into_raw(), 3, false),
        DynamicImage::ImageRgba32F(b) => split(bounds, b.into_raw(), 3, true),
        other => split(bounds, other.to_rgba8().into_raw(), 3, true),
    }
}

fn split<T: Lane>(
    bounds: Rect,
    data: Vec<T>,
    colors: usize,
    has_alpha: bool,
) -> MosaicResult<LoadedRaster> {
    let layout = if colors == 1 {
        SampleLayout::gray(T::TYPE)
    } else {
        SampleLayout::rgb(T::TYPE)
    };
    if !has_alpha {
        return Ok(LoadedRaster {
            image: Raster::from_vec(bounds, layout, data)?,
            alpha: None,
        });
    }
    let channels = colors + 1;
    let mut color = Vec::with_capacity(data.len() / channels * colors);
    let mut alpha = Vec::with_capacity(data.len() / channels);
    for px in data.chunks_exact(channels) {
        color.extend_from_slice(&px[..colors]);
        alpha.push(px[colors]);
    }
    Ok(LoadedRaster {
        image: Raster::from_vec(bounds, layout, color)?,
        alpha: Some(Raster::from_vec(bounds, SampleLayout::gray(T::TYPE), alpha)?),
    })
}

/// Convert a raster into an image buffer.
///
/// Supported: 1 or 3 bands of u8 or u16, and 3 bands of f32. Other layouts are unsupported.
pub fn raster_to_image(raster: &Raster) -> MosaicResult<DynamicImage> {
    let (w, h) = (raster.bounds().width, raster.bounds().height);
    let size_err = || MosaicError::validation("raster size does not match image buffer");
    let img = match (raster.bands(), raster.sample_type()) {
        (1, SampleType::U8) => DynamicImage::ImageLuma8(
            ImageBuffer::from_raw(w, h, owned::<u8>(raster)?).ok_or_else(size_err)?,
        ),
        (3, SampleType::U8) => DynamicImage::ImageRgb8(
            ImageBuffer::from_raw(w, h, owned::<u8>(raster)?).ok_or_else(size_err)?,
        ),
        (1, SampleType::U16) => DynamicImage::ImageLuma16(
            ImageBuffer::from_raw(w, h, owned::<u16>(raster)?).ok_or_else(size_err)?,
        ),
        (3, SampleType::U16) => DynamicImage::ImageRgb16(
            ImageBuffer::from_raw(w, h, owned::<u16>(raster)?).ok_or_else(size_err)?,
        ),
        (3, SampleType::F32) => DynamicImage::ImageRgb32F(
            ImageBuffer::from_raw(w, h, owned::<f32>(raster)?).ok_or_else(size_err)?,
        ),
        (bands, ty) => {
            return Err(MosaicError::unsupported(format!(
                "cannot export {bands}-band {ty} raster as an image"
            )));
        }
    };
    Ok(img)
}

/// Encode `raster` to `path`; the format follows the file extension.
pub fn save_raster(raster: &Raster, path: &Path) -> MosaicResult<()> {
    let img = raster_to_image(raster)?;
    img.save(path)
        .with_context(|| format!("encode image {}", path.display()))?;
    Ok(())
}

fn owned<T: Lane>(raster: &Raster) -> MosaicResult<Vec<T>> {
    raster
        .data::<T>()
        .map(<[T]>::to_vec)
        .ok_or_else(|| MosaicError::unsupported(format!("raster does not store {}", T::TYPE)))
}

#[cfg(test)]
#[path = "../../tests/unit/io/image.rs"]
mod tests;
