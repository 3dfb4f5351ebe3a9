//! Palette extraction and subset lookup.

use image::Rgba;

use crate::error::CapacityError;
use crate::ppu::{Palette, PALETTE_SIZE, TRANSPARENT};

/// Builds the palette of one image in first-seen colour order.
///
/// Slot 0 is always transparent, whether or not the image contains it. Unused trailing slots are
/// padded with transparent. The scan order fixes the slot order, which in turn fixes the tile
/// encoding, so callers must pass pixels in the same order on every run.
pub fn get_palette(pixels: &[Rgba<u8>]) -> Result<Palette, CapacityError> {
    let mut colours = Vec::with_capacity(PALETTE_SIZE);
    colours.push(TRANSPARENT);

    for &colour in pixels {
        if !colours.contains(&colour) {
            colours.push(colour);
            if colours.len() > PALETTE_SIZE {
                return Err(CapacityError::TooManyColours {
                    found: colours.len(),
                });
            }
        }
    }

    let mut palette = Palette::default();
    palette.0[..colours.len()].copy_from_slice(&colours);
    Ok(palette)
}

/// Index of the first palette that contains every colour of `candidate`, in any slot.
pub fn search_palette(palettes: &[Palette], candidate: &Palette) -> Option<usize> {
    palettes
        .iter()
        .position(|existing| existing.contains_all(candidate))
}
