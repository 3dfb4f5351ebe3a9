//! Palette/tile extraction.
//!
//! A [`ConversionContext`] owns the tile and palette tables for one conversion run and folds images
//! into them one at a time, in manifest order.

use log::debug;

use crate::error::{CapacityError, ConvertError};
use crate::image_loader::DecodedImage;
use crate::ppu::{Palette, Tile, MAX_PALETTES, MAX_TILES};

pub mod asset_info;
pub mod palette;
pub mod tile;

pub use asset_info::AssetInfo;
use palette::{get_palette, search_palette};
use tile::{get_tile, split_png_data, TileTable};

#[derive(Debug, Default)]
pub struct ConversionContext {
    tiles: TileTable,
    palettes: Vec<Palette>,
    asset_infos: Vec<AssetInfo>,
}

impl ConversionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tiles(&self) -> &[Tile] {
        self.tiles.tiles()
    }

    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    pub fn asset_infos(&self) -> &[AssetInfo] {
        &self.asset_infos
    }

    /// Extracts one image and returns its asset index.
    ///
    /// Everything is resolved and capacity-checked before the tables change, so on error the
    /// context is left as it was.
    pub fn add_image(&mut self, image: &DecodedImage) -> Result<usize, ConvertError> {
        let blocks = split_png_data(&image.pixels, image.width, image.height)?;
        let candidate = get_palette(&image.pixels)?;

        // Tiles must be encoded through the palette the asset ends up using, which is the
        // existing one on a subset match.
        let (palette_index, palette, is_new_palette) =
            match search_palette(&self.palettes, &candidate) {
                Some(index) => {
                    debug!(
                        "  palette [{}] resolved to existing palette {}",
                        candidate.describe(),
                        index
                    );
                    (index, self.palettes[index], false)
                }
                None => {
                    if self.palettes.len() >= MAX_PALETTES {
                        return Err(CapacityError::TooManyPalettes {
                            needed: self.palettes.len() + 1,
                        }
                        .into());
                    }
                    debug!(
                        "  new palette {} [{}]",
                        self.palettes.len(),
                        candidate.describe()
                    );
                    (self.palettes.len(), candidate, true)
                }
            };

        let mut staged: Vec<Tile> = Vec::new();
        let mut tile_indices = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let tile = get_tile(block, &palette)?;
            let index = match self.tiles.search_tile(&tile) {
                Some(index) => index,
                None => match staged.iter().position(|t| *t == tile) {
                    Some(pos) => self.tiles.len() + pos,
                    None => {
                        staged.push(tile);
                        let needed = self.tiles.len() + staged.len();
                        if needed > MAX_TILES {
                            return Err(CapacityError::TooManyTiles { needed }.into());
                        }
                        needed - 1
                    }
                },
            };
            tile_indices.push(index as u8);
        }

        if is_new_palette {
            self.palettes.push(palette);
        }
        for tile in staged {
            self.tiles.insert(tile)?;
        }
        debug!(
            "  {} tiles ({} unique in table), palette {}",
            tile_indices.len(),
            self.tiles.len(),
            palette_index
        );

        self.asset_infos.push(AssetInfo {
            tile_indices,
            palette_index: palette_index as u8,
            width: image.width,
            height: image.height,
        });
        Ok(self.asset_infos.len() - 1)
    }
}
