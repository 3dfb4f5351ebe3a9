//! # Conversion pipeline
//!
//! One linear pass: extract every manifest asset, write the tile, palette and asset info chunk
//! files, then read them back and compare against what was written. Any failure aborts the run.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::chunk::{write_chunk, PALETTE_MAGIC, TILE_MAGIC};
use crate::config::{
    ConverterConfig, Manifest, ASSET_INFO_CHUNK_FILE, PALETTE_CHUNK_FILE, REPORT_FILE,
    TILE_CHUNK_FILE,
};
use crate::converter::asset_info::write_asset_info_chunk;
use crate::converter::ConversionContext;
use crate::debug_render::dump_assets;
use crate::error::ConvertError;
use crate::image_loader::load_png;
use crate::report::ConversionReport;
use crate::runtime::ChunkTables;

#[derive(Debug)]
pub struct ConversionSummary {
    pub asset_count: usize,
    pub tile_count: usize,
    pub palette_count: usize,
    pub tile_file: PathBuf,
    pub palette_file: PathBuf,
    pub asset_info_file: PathBuf,
}

/// Decodes and extracts every asset in manifest order.
pub fn extract_assets(sources: &[(String, PathBuf)]) -> Result<ConversionContext, ConvertError> {
    let mut ctx = ConversionContext::new();

    for (name, path) in sources {
        info!("Parsing: {}", path.display());
        let wrap = |source: ConvertError| ConvertError::Asset {
            name: name.clone(),
            path: path.clone(),
            source: Box::new(source),
        };
        let image = load_png(path).map_err(wrap)?;
        ctx.add_image(&image).map_err(wrap)?;
    }

    info!(
        "Extracted {} assets: {} tiles, {} palettes",
        ctx.asset_infos().len(),
        ctx.tiles().len(),
        ctx.palettes().len()
    );
    Ok(ctx)
}

fn write_file<F>(path: &Path, write: F) -> Result<(), ConvertError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let mut out = BufWriter::new(File::create(path)?);
    write(&mut out)?;
    out.flush()?;
    Ok(())
}

/// Writes the three chunk files into `output_dir`, returning their paths.
pub fn write_chunk_files(
    ctx: &ConversionContext,
    output_dir: &Path,
) -> Result<(PathBuf, PathBuf, PathBuf), ConvertError> {
    fs::create_dir_all(output_dir)?;

    let tile_file = output_dir.join(TILE_CHUNK_FILE);
    write_file(&tile_file, |out| write_chunk(&TILE_MAGIC, ctx.tiles(), out))?;
    info!("Tile data output to {}", tile_file.display());

    let palette_file = output_dir.join(PALETTE_CHUNK_FILE);
    write_file(&palette_file, |out| {
        write_chunk(&PALETTE_MAGIC, ctx.palettes(), out)
    })?;
    info!("Palette data output to {}", palette_file.display());

    let asset_info_file = output_dir.join(ASSET_INFO_CHUNK_FILE);
    write_file(&asset_info_file, |out| {
        write_asset_info_chunk(ctx.asset_infos(), out)
    })?;
    info!("AssetInfo data output to {}", asset_info_file.display());

    Ok((tile_file, palette_file, asset_info_file))
}

/// Compares freshly read tables against the in-memory ones they were written from.
pub fn verify_round_trip(ctx: &ConversionContext, read: &ChunkTables) -> Result<(), ConvertError> {
    if read.tiles.len() != ctx.tiles().len() {
        return Err(ConvertError::Consistency(format!(
            "wrote {} tiles, read {}",
            ctx.tiles().len(),
            read.tiles.len()
        )));
    }
    if let Some(i) = (0..read.tiles.len()).find(|&i| read.tiles[i] != ctx.tiles()[i]) {
        return Err(ConvertError::Consistency(format!("tile {} differs", i)));
    }
    info!("Tiles check pass!");

    if read.palettes.len() != ctx.palettes().len() {
        return Err(ConvertError::Consistency(format!(
            "wrote {} palettes, read {}",
            ctx.palettes().len(),
            read.palettes.len()
        )));
    }
    if let Some(i) = (0..read.palettes.len()).find(|&i| read.palettes[i] != ctx.palettes()[i]) {
        return Err(ConvertError::Consistency(format!("palette {} differs", i)));
    }
    info!("Palette check pass!");

    if read.asset_infos.len() != ctx.asset_infos().len() {
        return Err(ConvertError::Consistency(format!(
            "wrote {} asset infos, read {}",
            ctx.asset_infos().len(),
            read.asset_infos.len()
        )));
    }
    for (i, (original, back)) in ctx.asset_infos().iter().zip(&read.asset_infos).enumerate() {
        let field = if original.tile_indices != back.tile_indices {
            Some("tile indices")
        } else if original.palette_index != back.palette_index {
            Some("palette index")
        } else if original.width != back.width || original.height != back.height {
            Some("dimensions")
        } else {
            None
        };
        if let Some(field) = field {
            return Err(ConvertError::Consistency(format!(
                "asset info {} has different {}",
                i, field
            )));
        }
    }
    info!("Asset info check pass!");

    Ok(())
}

/// Runs the whole conversion for `manifest`.
pub fn run(config: &ConverterConfig, manifest: &Manifest) -> Result<ConversionSummary, ConvertError> {
    let sources = manifest.resolve(&config.asset_dir);
    let ctx = extract_assets(&sources)?;

    let (tile_file, palette_file, asset_info_file) = write_chunk_files(&ctx, &config.output_dir)?;

    let read_back = ChunkTables::read_from_dir(&config.output_dir)?;
    verify_round_trip(&ctx, &read_back)?;

    if config.write_report {
        let report_path = config.output_dir.join(REPORT_FILE);
        ConversionReport::build(&ctx, &sources).save(&report_path)?;
        info!("Asset index written to {}", report_path.display());
    }

    if let Some(dump_dir) = &config.dump_dir {
        let names: Vec<String> = sources.iter().map(|(name, _)| name.clone()).collect();
        dump_assets(
            &names,
            &read_back.asset_infos,
            &read_back.tiles,
            &read_back.palettes,
            dump_dir,
            config.optimise_pngs,
        )?;
    }

    Ok(ConversionSummary {
        asset_count: ctx.asset_infos().len(),
        tile_count: ctx.tiles().len(),
        palette_count: ctx.palettes().len(),
        tile_file,
        palette_file,
        asset_info_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::FormatError;
    use crate::ppu::{Tile, TRANSPARENT};
    use crate::runtime::PpuTables;
    use image::{Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn scratch_dir(test: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "ppu_pipeline_{}_{}",
            test,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config_for(dir: &Path) -> ConverterConfig {
        ConverterConfig {
            asset_dir: dir.join("assets"),
            output_dir: dir.join("data"),
            ..ConverterConfig::default()
        }
    }

    fn save_asset(dir: &Path, name: &str, image: &RgbaImage) {
        let assets = dir.join("assets");
        fs::create_dir_all(&assets).unwrap();
        image.save(assets.join(format!("{}.png", name))).unwrap();
    }

    fn solid_png(width: u32, height: u32, colour: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(width, height, colour)
    }

    #[test]
    fn two_single_colour_images_end_to_end() {
        let dir = scratch_dir("two_solid");
        save_asset(&dir, "red", &solid_png(8, 8, RED));
        save_asset(&dir, "green", &solid_png(8, 8, GREEN));

        let config = config_for(&dir);
        let summary = run(&config, &Manifest::from_names(["red", "green"])).unwrap();
        assert_eq!(summary.asset_count, 2);
        assert_eq!(summary.palette_count, 2);
        assert_eq!(summary.tile_count, 1);

        let tables = PpuTables::load(&config.output_dir).unwrap();
        assert_eq!(tables.loaded_tiles(), &[Tile {
            bit0: [0xFF; 8],
            bit1: [0; 8],
        }]);
        assert_eq!(tables.palettes[1].0[1], GREEN);
        for info in &tables.asset_infos {
            assert_eq!(info.tile_indices.len(), 1);
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn multi_tile_image_uses_lower_left_origin() {
        let dir = scratch_dir("lower_left");
        // 8x16: top half blue, bottom half transparent
        let mut image = RgbaImage::from_pixel(8, 16, TRANSPARENT);
        for y in 0..8 {
            for x in 0..8 {
                image.put_pixel(x, y, BLUE);
            }
        }
        save_asset(&dir, "tower", &image);

        let config = config_for(&dir);
        run(&config, &Manifest::from_names(["tower"])).unwrap();

        let tables = PpuTables::load(&config.output_dir).unwrap();
        let info = &tables.asset_infos[0];
        assert_eq!((info.width, info.height), (8, 16));
        let bottom = tables.tiles[info.tile_at(0, 0).unwrap() as usize];
        let top = tables.tiles[info.tile_at(0, 1).unwrap() as usize];
        assert_eq!(bottom, Tile::default());
        assert_eq!(top.bit0, [0xFF; 8]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn reruns_produce_identical_files() {
        let dir = scratch_dir("determinism");
        let mut mixed = RgbaImage::from_pixel(16, 8, RED);
        for x in 0..8 {
            mixed.put_pixel(x, 3, GREEN);
        }
        save_asset(&dir, "mixed", &mixed);
        save_asset(&dir, "blue", &solid_png(8, 8, BLUE));
        let manifest = Manifest::from_names(["mixed", "blue"]);

        let first = config_for(&dir);
        let second = ConverterConfig {
            output_dir: dir.join("data_again"),
            ..config_for(&dir)
        };
        run(&first, &manifest).unwrap();
        run(&second, &manifest).unwrap();

        for name in [TILE_CHUNK_FILE, PALETTE_CHUNK_FILE, ASSET_INFO_CHUNK_FILE] {
            let a = fs::read(first.output_dir.join(name)).unwrap();
            let b = fs::read(second.output_dir.join(name)).unwrap();
            assert_eq!(a, b, "{} differs between runs", name);
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn too_many_colours_aborts_the_run() {
        let dir = scratch_dir("colours");
        let mut image = RgbaImage::from_pixel(8, 8, RED);
        image.put_pixel(1, 0, GREEN);
        image.put_pixel(2, 0, BLUE);
        image.put_pixel(3, 0, Rgba([9, 9, 9, 255]));
        save_asset(&dir, "noisy", &image);

        let config = config_for(&dir);
        let err = run(&config, &Manifest::from_names(["noisy"])).unwrap_err();
        match err {
            ConvertError::Asset { name, source, .. } => {
                assert_eq!(name, "noisy");
                assert!(matches!(*source, ConvertError::Capacity(_)));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!config.output_dir.join(TILE_CHUNK_FILE).exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_image_is_a_decode_error() {
        let dir = scratch_dir("missing");
        let config = config_for(&dir);
        let err = run(&config, &Manifest::from_names(["nowhere"])).unwrap_err();
        assert!(matches!(err, ConvertError::Asset { .. }));
    }

    #[test]
    fn verification_catches_tampered_tables() {
        let mut ctx = ConversionContext::new();
        ctx.add_image(&crate::image_loader::DecodedImage {
            width: 8,
            height: 8,
            pixels: vec![RED; 64],
        })
        .unwrap();

        let mut read = ChunkTables {
            tiles: ctx.tiles().to_vec(),
            palettes: ctx.palettes().to_vec(),
            asset_infos: ctx.asset_infos().to_vec(),
        };
        verify_round_trip(&ctx, &read).unwrap();

        read.asset_infos[0].palette_index = 3;
        assert!(matches!(
            verify_round_trip(&ctx, &read),
            Err(ConvertError::Consistency(_))
        ));

        read.asset_infos[0].palette_index = 0;
        read.tiles[0].bit1[4] ^= 1;
        assert!(matches!(
            verify_round_trip(&ctx, &read),
            Err(ConvertError::Consistency(_))
        ));
    }

    #[test]
    fn truncated_chunk_file_fails_to_load() {
        let dir = scratch_dir("truncated");
        save_asset(&dir, "red", &solid_png(8, 8, RED));
        let config = config_for(&dir);
        run(&config, &Manifest::from_names(["red"])).unwrap();

        let tile_path = config.output_dir.join(TILE_CHUNK_FILE);
        let bytes = fs::read(&tile_path).unwrap();
        fs::write(&tile_path, &bytes[..bytes.len() - 1]).unwrap();

        match PpuTables::load(&config.output_dir) {
            Err(ConvertError::Format(FormatError::UnexpectedEof { .. })) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("truncated file loaded"),
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn writes_report_and_debug_dump() {
        let dir = scratch_dir("extras");
        save_asset(&dir, "red", &solid_png(16, 8, RED));
        let config = ConverterConfig {
            dump_dir: Some(dir.join("dump")),
            write_report: true,
            optimise_pngs: false,
            ..config_for(&dir)
        };
        run(&config, &Manifest::from_names(["red"])).unwrap();

        let report: ConversionReport = serde_json::from_reader(
            File::open(config.output_dir.join(REPORT_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(report.assets[0].name, "red");
        assert_eq!(report.assets[0].tile_indices, vec![0, 0]);

        let rebuilt = image::open(dir.join("dump").join("red.png")).unwrap().to_rgba8();
        assert_eq!(rebuilt, solid_png(16, 8, RED));

        fs::remove_dir_all(&dir).unwrap();
    }
}
