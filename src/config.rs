//! Converter configuration and the ordered asset manifest.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

pub const TILE_CHUNK_FILE: &str = "tiles.chunk";
pub const PALETTE_CHUNK_FILE: &str = "palettes.chunk";
pub const ASSET_INFO_CHUNK_FILE: &str = "asset_infos.chunk";
pub const REPORT_FILE: &str = "asset_index.json";

/// The game's assets in allocation order. Reordering this list changes every index in the output.
pub const DEFAULT_ASSET_NAMES: [&str; 20] = [
    "char_stand",
    "char_crouch",
    "char_jump",
    "char_dead",
    "fire",
    "fire_2",
    "brick",
    "killer",
    "transparent",
    "spikedball",
    "score_0",
    "score_1",
    "score_2",
    "score_3",
    "score_4",
    "score_5",
    "score_6",
    "score_7",
    "score_8",
    "score_9",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    /// Source image, relative to the asset directory. Defaults to `<name>.png`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub assets: Vec<ManifestEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Manifest::from_names(DEFAULT_ASSET_NAMES)
    }
}

impl Manifest {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Manifest {
            assets: names
                .into_iter()
                .map(|name| ManifestEntry {
                    name: name.into(),
                    path: None,
                })
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// `(name, source path)` pairs in manifest order.
    pub fn resolve(&self, asset_dir: &Path) -> Vec<(String, PathBuf)> {
        self.assets
            .iter()
            .map(|entry| {
                let path = match &entry.path {
                    Some(path) => asset_dir.join(path),
                    None => asset_dir.join(format!("{}.png", entry.name)),
                };
                (entry.name.clone(), path)
            })
            .collect()
    }

    pub fn name_of(&self, index: usize) -> String {
        self.assets
            .get(index)
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| format!("asset_{}", index))
    }
}

/// Options for one conversion run
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    pub asset_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Where to write reconstructed PNGs of every asset, if anywhere.
    pub dump_dir: Option<PathBuf>,
    pub write_report: bool,
    pub optimise_pngs: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            output_dir: PathBuf::from("data"),
            dump_dir: None,
            write_report: false,
            optimise_pngs: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manifest_keeps_game_order() {
        let manifest = Manifest::default();
        assert_eq!(manifest.assets.len(), 20);
        assert_eq!(manifest.assets[0].name, "char_stand");
        assert_eq!(manifest.assets[8].name, "transparent");
        assert_eq!(manifest.assets[19].name, "score_9");
    }

    #[test]
    fn parses_json_with_optional_paths() {
        let json = r#"{
            "assets": [
                { "name": "brick" },
                { "name": "hero", "path": "sprites/hero_v2.png" }
            ]
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        let resolved = manifest.resolve(Path::new("art"));
        assert_eq!(resolved[0], ("brick".to_string(), PathBuf::from("art/brick.png")));
        assert_eq!(
            resolved[1],
            ("hero".to_string(), PathBuf::from("art/sprites/hero_v2.png"))
        );
    }

    #[test]
    fn unnamed_indices_get_placeholder_names() {
        let manifest = Manifest::from_names(["a"]);
        assert_eq!(manifest.name_of(0), "a");
        assert_eq!(manifest.name_of(3), "asset_3");
    }
}
