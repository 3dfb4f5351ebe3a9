//! # Runtime tables
//!
//! Startup-side reader: loads the three chunk files into the fixed-capacity tile and palette
//! tables the game renders from, plus the asset list that indexes into them.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;

use crate::chunk::{read_chunk, FormatError, PALETTE_MAGIC, TILE_MAGIC};
use crate::config::{ASSET_INFO_CHUNK_FILE, PALETTE_CHUNK_FILE, TILE_CHUNK_FILE};
use crate::converter::asset_info::read_asset_info_chunk;
use crate::converter::AssetInfo;
use crate::error::ConvertError;
use crate::ppu::{Palette, Tile, MAX_PALETTES, MAX_TILES, TILE_DIM};

/// The three tables exactly as stored, before any capacity checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkTables {
    pub tiles: Vec<Tile>,
    pub palettes: Vec<Palette>,
    pub asset_infos: Vec<AssetInfo>,
}

impl ChunkTables {
    pub fn read_from<T: Read, P: Read, A: Read>(
        tile_src: &mut T,
        palette_src: &mut P,
        asset_src: &mut A,
    ) -> Result<Self, FormatError> {
        Ok(ChunkTables {
            tiles: read_chunk(tile_src, &TILE_MAGIC)?,
            palettes: read_chunk(palette_src, &PALETTE_MAGIC)?,
            asset_infos: read_asset_info_chunk(asset_src)?,
        })
    }

    pub fn read_from_dir(dir: &Path) -> Result<Self, ConvertError> {
        let open = |name: &str| -> Result<BufReader<File>, ConvertError> {
            Ok(BufReader::new(File::open(dir.join(name))?))
        };
        let mut tiles = open(TILE_CHUNK_FILE)?;
        let mut palettes = open(PALETTE_CHUNK_FILE)?;
        let mut assets = open(ASSET_INFO_CHUNK_FILE)?;
        Ok(Self::read_from(&mut tiles, &mut palettes, &mut assets)?)
    }
}

pub struct PpuTables {
    pub tiles: [Tile; MAX_TILES],
    pub palettes: [Palette; MAX_PALETTES],
    pub tile_count: usize,
    pub palette_count: usize,
    pub asset_infos: Vec<AssetInfo>,
}

impl PpuTables {
    pub fn load(dir: &Path) -> Result<Self, ConvertError> {
        info!("Loading chunk files from {}", dir.display());
        let tables = Self::from_chunk_tables(ChunkTables::read_from_dir(dir)?)?;
        info!(
            "  {} tiles, {} palettes, {} assets",
            tables.tile_count,
            tables.palette_count,
            tables.asset_infos.len()
        );
        Ok(tables)
    }

    /// Copies stored tables into hardware slots, rejecting anything that does not fit or that
    /// points outside the loaded tables.
    pub fn from_chunk_tables(stored: ChunkTables) -> Result<Self, FormatError> {
        if stored.tiles.len() > MAX_TILES {
            return Err(FormatError::TooManyRecords {
                magic: TILE_MAGIC,
                count: stored.tiles.len(),
                capacity: MAX_TILES,
            });
        }
        if stored.palettes.len() > MAX_PALETTES {
            return Err(FormatError::TooManyRecords {
                magic: PALETTE_MAGIC,
                count: stored.palettes.len(),
                capacity: MAX_PALETTES,
            });
        }

        for (asset, info) in stored.asset_infos.iter().enumerate() {
            validate_asset(asset, info, stored.tiles.len(), stored.palettes.len())?;
        }

        let mut tiles = [Tile::default(); MAX_TILES];
        tiles[..stored.tiles.len()].copy_from_slice(&stored.tiles);
        let mut palettes = [Palette::default(); MAX_PALETTES];
        palettes[..stored.palettes.len()].copy_from_slice(&stored.palettes);

        Ok(PpuTables {
            tiles,
            palettes,
            tile_count: stored.tiles.len(),
            palette_count: stored.palettes.len(),
            asset_infos: stored.asset_infos,
        })
    }

    pub fn loaded_tiles(&self) -> &[Tile] {
        &self.tiles[..self.tile_count]
    }

    pub fn loaded_palettes(&self) -> &[Palette] {
        &self.palettes[..self.palette_count]
    }
}

fn validate_asset(
    asset: usize,
    info: &AssetInfo,
    tile_count: usize,
    palette_count: usize,
) -> Result<(), FormatError> {
    let (w, h) = (info.width as usize, info.height as usize);
    if w % TILE_DIM != 0 || h % TILE_DIM != 0 || info.tile_indices.len() != (w / TILE_DIM) * (h / TILE_DIM)
    {
        return Err(FormatError::BadAssetShape {
            asset,
            width: info.width,
            height: info.height,
            tiles: info.tile_indices.len(),
        });
    }
    if info.palette_index as usize >= palette_count {
        return Err(FormatError::DanglingReference {
            asset,
            kind: "palette",
            index: info.palette_index as usize,
            count: palette_count,
        });
    }
    if let Some(&bad) = info
        .tile_indices
        .iter()
        .find(|&&index| index as usize >= tile_count)
    {
        return Err(FormatError::DanglingReference {
            asset,
            kind: "tile",
            index: bad as usize,
            count: tile_count,
        });
    }
    Ok(())
}
