//! JSON index of a conversion run, for tooling and for humans hunting down which asset got which
//! tiles.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::converter::ConversionContext;
use crate::error::ConvertError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub tile_count: usize,
    pub palette_count: usize,
    /// RGBA quadruples per palette, slot order.
    pub palettes: Vec<[[u8; 4]; 4]>,
    pub assets: Vec<AssetReport>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AssetReport {
    pub index: usize,
    pub name: String,
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub palette_index: u8,
    pub tile_indices: Vec<u8>,
}

impl ConversionReport {
    pub fn build(ctx: &ConversionContext, sources: &[(String, PathBuf)]) -> Self {
        let assets = ctx
            .asset_infos()
            .iter()
            .zip(sources)
            .enumerate()
            .map(|(index, (info, (name, source)))| AssetReport {
                index,
                name: name.clone(),
                source: source.clone(),
                width: info.width,
                height: info.height,
                palette_index: info.palette_index,
                tile_indices: info.tile_indices.clone(),
            })
            .collect();

        ConversionReport {
            tile_count: ctx.tiles().len(),
            palette_count: ctx.palettes().len(),
            palettes: ctx
                .palettes()
                .iter()
                .map(|p| p.0.map(|c| c.0))
                .collect(),
            assets,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConvertError> {
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
