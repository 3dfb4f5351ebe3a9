//! Rebuilds asset images from the tile and palette tables for visual checking.

use std::fs;
use std::path::Path;

use image::{Rgba, RgbaImage};
use log::{info, warn};

use crate::converter::AssetInfo;
use crate::error::ConvertError;
use crate::image_loader::DecodedImage;
use crate::ppu::{Palette, Tile, PIXELS_PER_TILE, TILE_DIM, TRANSPARENT};

/// Decodes one tile through a palette into lower-left-origin pixels.
pub fn render_tile(tile: &Tile, palette: &Palette) -> [Rgba<u8>; PIXELS_PER_TILE] {
    let mut pixels = [TRANSPARENT; PIXELS_PER_TILE];
    for y in 0..TILE_DIM {
        for x in 0..TILE_DIM {
            pixels[y * TILE_DIM + x] = palette.0[tile.colour_index(x, y) as usize];
        }
    }
    pixels
}

/// Rebuilds a whole asset. Returns `None` if it references tiles or palettes that do not exist.
pub fn render_asset(info: &AssetInfo, tiles: &[Tile], palettes: &[Palette]) -> Option<DecodedImage> {
    let palette = palettes.get(info.palette_index as usize)?;
    let width = info.width as usize;
    let mut pixels = vec![TRANSPARENT; width * info.height as usize];

    for row in 0..info.tile_rows() {
        for col in 0..info.tile_columns() {
            let tile = tiles.get(info.tile_at(col, row)? as usize)?;
            let block = render_tile(tile, palette);
            for y in 0..TILE_DIM {
                let dst = (row * TILE_DIM + y) * width + col * TILE_DIM;
                pixels[dst..dst + TILE_DIM].copy_from_slice(&block[y * TILE_DIM..(y + 1) * TILE_DIM]);
            }
        }
    }

    Some(DecodedImage {
        width: info.width,
        height: info.height,
        pixels,
    })
}

/// Saves a PNG, optionally squeezing it with oxipng. Falls back to the plain file on failure.
pub fn save_png(image: &RgbaImage, path: &Path, optimise: bool) -> Result<(), ConvertError> {
    if !optimise {
        image.save(path)?;
        return Ok(());
    }

    let temp_path = path.with_extension("temp.png");
    image.save(&temp_path)?;

    let mut options = oxipng::Options::from_preset(2);
    options.bit_depth_reduction = true;

    let result = oxipng::optimize(
        &oxipng::InFile::Path(temp_path.clone()),
        &oxipng::OutFile::Path(Some(path.to_path_buf())),
        &options,
    );

    match result {
        Ok(()) => {
            if let Err(e) = fs::remove_file(&temp_path) {
                warn!("Failed to remove temporary file {}: {}", temp_path.display(), e);
            }
        }
        Err(e) => {
            warn!(
                "oxipng optimisation failed for {}: {}. File saved unoptimised.",
                path.display(),
                e
            );
            fs::rename(&temp_path, path)?;
        }
    }
    Ok(())
}

/// Writes `<name>.png` for every asset and `<name>_<n>.png` for each of its tiles.
pub fn dump_assets(
    names: &[String],
    infos: &[AssetInfo],
    tiles: &[Tile],
    palettes: &[Palette],
    dump_dir: &Path,
    optimise: bool,
) -> Result<usize, ConvertError> {
    fs::create_dir_all(dump_dir)?;
    let mut written = 0;

    for (index, info) in infos.iter().enumerate() {
        let fallback = format!("asset_{}", index);
        let name = names.get(index).unwrap_or(&fallback);

        let image = render_asset(info, tiles, palettes)
            .and_then(|decoded| decoded.to_rgba_image())
            .ok_or_else(|| {
                ConvertError::Consistency(format!(
                    "asset '{}' cannot be rebuilt from the loaded tables",
                    name
                ))
            })?;
        save_png(&image, &dump_dir.join(format!("{}.png", name)), optimise)?;
        written += 1;

        let palette = &palettes[info.palette_index as usize];
        for (n, &tile_index) in info.tile_indices.iter().enumerate() {
            let block = render_tile(&tiles[tile_index as usize], palette);
            let decoded = DecodedImage {
                width: TILE_DIM as u32,
                height: TILE_DIM as u32,
                pixels: block.to_vec(),
            };
            if let Some(tile_image) = decoded.to_rgba_image() {
                save_png(&tile_image, &dump_dir.join(format!("{}_{}.png", name, n)), optimise)?;
                written += 1;
            }
        }
    }

    info!("Saved {} debug images to {}", written, dump_dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn render_tile_uses_palette_slots() {
        let mut tile = Tile::default();
        tile.set_colour_index(2, 3, 1);
        let palette = Palette([TRANSPARENT, RED, TRANSPARENT, TRANSPARENT]);
        let pixels = render_tile(&tile, &palette);
        assert_eq!(pixels[3 * 8 + 2], RED);
        assert_eq!(pixels.iter().filter(|&&p| p == RED).count(), 1);
    }

    #[test]
    fn render_asset_places_tiles_from_bottom_left() {
        let solid = Tile {
            bit0: [0xFF; 8],
            bit1: [0; 8],
        };
        let tiles = vec![Tile::default(), solid];
        let palettes = vec![Palette([TRANSPARENT, RED, TRANSPARENT, TRANSPARENT])];
        let info = AssetInfo {
            tile_indices: vec![1, 0],
            palette_index: 0,
            width: 8,
            height: 16,
        };

        let image = render_asset(&info, &tiles, &palettes).unwrap();
        assert_eq!(image.pixels[0], RED);
        assert_eq!(image.pixels[8 * 8], TRANSPARENT);
    }

    #[test]
    fn render_asset_refuses_missing_palette() {
        let info = AssetInfo {
            tile_indices: vec![0],
            palette_index: 2,
            width: 8,
            height: 8,
        };
        assert!(render_asset(&info, &[Tile::default()], &[Palette::default()]).is_none());
    }

    #[test]
    fn dumps_asset_and_tile_pngs() {
        let dir = std::env::temp_dir().join(format!("ppu_dump_test_{}", std::process::id()));
        let tiles = vec![Tile {
            bit0: [0x0F; 8],
            bit1: [0; 8],
        }];
        let palettes = vec![Palette([TRANSPARENT, RED, TRANSPARENT, TRANSPARENT])];
        let infos = vec![AssetInfo {
            tile_indices: vec![0, 0],
            palette_index: 0,
            width: 16,
            height: 8,
        }];

        let written =
            dump_assets(&["brick".to_string()], &infos, &tiles, &palettes, &dir, false).unwrap();
        assert_eq!(written, 3);

        let whole = image::open(dir.join("brick.png")).unwrap().to_rgba8();
        assert_eq!(whole.dimensions(), (16, 8));
        // x 0..4 of every row is slot 1
        assert_eq!(*whole.get_pixel(0, 0), RED);
        assert_eq!(*whole.get_pixel(4, 0), TRANSPARENT);
        assert!(dir.join("brick_1.png").exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
