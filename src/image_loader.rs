//! PNG decoding into the converter's pixel convention.

use std::path::Path;

use image::{imageops, Rgba, RgbaImage};

use crate::error::ConvertError;

/// RGBA8 pixels in row-major order with the bottom-left pixel first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba<u8>>,
}

impl DecodedImage {
    /// Converts a top-left-origin image buffer to lower-left origin.
    pub fn from_rgba_image(image: &RgbaImage) -> Self {
        let flipped = imageops::flip_vertical(image);
        DecodedImage {
            width: flipped.width(),
            height: flipped.height(),
            pixels: flipped.pixels().copied().collect(),
        }
    }

    /// Inverse of [`DecodedImage::from_rgba_image`].
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        let raw: Vec<u8> = self.pixels.iter().flat_map(|p| p.0).collect();
        let lower_left = RgbaImage::from_raw(self.width, self.height, raw)?;
        Some(imageops::flip_vertical(&lower_left))
    }
}

pub fn load_png<P: AsRef<Path>>(path: P) -> Result<DecodedImage, ConvertError> {
    let image = image::open(path.as_ref())?.to_rgba8();
    Ok(DecodedImage::from_rgba_image(&image))
}
