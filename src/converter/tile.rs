//! Tile splitting, encoding and deduplication.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use image::Rgba;
use twox_hash::XxHash64;

use crate::error::{CapacityError, ConvertError};
use crate::ppu::{Palette, Tile, MAX_TILES, PIXELS_PER_TILE, TILE_DIM};

/// The 64 pixels of one 8x8 block, row-major from the block's bottom-left corner.
pub type Block = [Rgba<u8>; PIXELS_PER_TILE];

/// Splits a lower-left-origin image into 8x8 blocks.
///
/// Blocks are returned row-major starting with the bottom-left block, which is also the order of
/// an asset's tile indices.
pub fn split_png_data(
    pixels: &[Rgba<u8>],
    width: u32,
    height: u32,
) -> Result<Vec<Block>, ConvertError> {
    let (w, h) = (width as usize, height as usize);
    if w % TILE_DIM != 0 || h % TILE_DIM != 0 || pixels.len() != w * h {
        return Err(ConvertError::Dimensions {
            width,
            height,
            pixels: pixels.len(),
        });
    }

    let cols = w / TILE_DIM;
    let rows = h / TILE_DIM;
    let mut blocks = Vec::with_capacity(cols * rows);

    for row in 0..rows {
        for col in 0..cols {
            let mut block = [Rgba([0, 0, 0, 0]); PIXELS_PER_TILE];
            for y in 0..TILE_DIM {
                let src = (row * TILE_DIM + y) * w + col * TILE_DIM;
                block[y * TILE_DIM..(y + 1) * TILE_DIM].copy_from_slice(&pixels[src..src + TILE_DIM]);
            }
            blocks.push(block);
        }
    }

    Ok(blocks)
}

/// Encodes a block through `palette`, which must be the palette the asset resolved to.
pub fn get_tile(block: &Block, palette: &Palette) -> Result<Tile, ConvertError> {
    let mut tile = Tile::default();

    for y in 0..TILE_DIM {
        for x in 0..TILE_DIM {
            let colour = block[y * TILE_DIM + x];
            let slot = palette
                .slot_of(colour)
                .ok_or(ConvertError::ColourNotInPalette { colour: colour.0 })?;
            tile.set_colour_index(x, y, slot as u8);
        }
    }

    Ok(tile)
}

/// Append-only tile table with an `XxHash64` index for structural lookup.
#[derive(Debug, Default)]
pub struct TileTable {
    tiles: Vec<Tile>,
    lookup: HashMap<Tile, usize, BuildHasherDefault<XxHash64>>,
}

impl TileTable {
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn search_tile(&self, tile: &Tile) -> Option<usize> {
        self.lookup.get(tile).copied()
    }

    /// Returns the index of an equal tile, appending `tile` if there is none.
    pub fn insert(&mut self, tile: Tile) -> Result<usize, CapacityError> {
        if let Some(index) = self.search_tile(&tile) {
            return Ok(index);
        }
        if self.tiles.len() >= MAX_TILES {
            return Err(CapacityError::TooManyTiles {
                needed: self.tiles.len() + 1,
            });
        }
        let index = self.tiles.len();
        self.tiles.push(tile);
        self.lookup.insert(tile, index);
        Ok(index)
    }
}
