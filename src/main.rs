mod binary_utils;
mod chunk;
mod config;
mod converter;
mod debug_render;
mod error;
mod image_loader;
mod pipeline;
mod ppu;
mod report;
mod runtime;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::{error, info};

use config::{ConverterConfig, Manifest};
use debug_render::dump_assets;
use error::ConvertError;
use runtime::PpuTables;

#[derive(Parser, Debug)]
#[command(
    name = "ppu_asset_baker",
    version,
    about = "Bakes PNG sprites into PPU tile, palette and asset info chunks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert the manifest's PNGs into chunk files and verify them
    Convert {
        /// Directory holding the source PNGs
        #[arg(long, default_value = "assets")]
        assets: PathBuf,
        /// Directory the chunk files are written to
        #[arg(long, default_value = "data")]
        out: PathBuf,
        /// JSON manifest; the built-in asset list is used when omitted
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Also rebuild every asset as PNGs into this directory
        #[arg(long)]
        dump_dir: Option<PathBuf>,
        /// Write asset_index.json next to the chunk files
        #[arg(long)]
        report: bool,
        /// Skip oxipng on debug PNGs
        #[arg(long)]
        no_optimise: bool,
    },
    /// Load chunk files the way the game does at startup and describe them
    Inspect {
        #[arg(long, default_value = "data")]
        data: PathBuf,
        /// Manifest used to name assets in the output
        #[arg(long)]
        manifest: Option<PathBuf>,
        #[arg(long)]
        dump_dir: Option<PathBuf>,
        /// Print every tile as a grid of colour indices
        #[arg(long)]
        tiles: bool,
    },
}

fn load_manifest(path: Option<&PathBuf>) -> Result<Manifest, ConvertError> {
    match path {
        Some(path) => {
            info!("Manifest: {}", path.display());
            Manifest::load(path)
        }
        None => Ok(Manifest::default()),
    }
}

fn run(cli: Cli) -> Result<(), ConvertError> {
    match cli.command {
        Command::Convert {
            assets,
            out,
            manifest,
            dump_dir,
            report,
            no_optimise,
        } => {
            let manifest = load_manifest(manifest.as_ref())?;
            let config = ConverterConfig {
                asset_dir: assets,
                output_dir: out,
                dump_dir,
                write_report: report,
                optimise_pngs: !no_optimise,
            };

            info!("Assets Dir: {:?}", config.asset_dir);
            info!("Output Dir: {:?}", config.output_dir);

            let summary = pipeline::run(&config, &manifest)?;
            info!(
                "Converted {} assets into {} tiles and {} palettes",
                summary.asset_count, summary.tile_count, summary.palette_count
            );
            info!(
                "Wrote {}, {}, {}",
                summary.tile_file.display(),
                summary.palette_file.display(),
                summary.asset_info_file.display()
            );
        }
        Command::Inspect {
            data,
            manifest,
            dump_dir,
            tiles,
        } => {
            let manifest = load_manifest(manifest.as_ref())?;
            let tables = PpuTables::load(&data)?;

            for (i, palette) in tables.loaded_palettes().iter().enumerate() {
                println!("palette {}: {}", i, palette.describe());
            }
            for (i, info) in tables.asset_infos.iter().enumerate() {
                println!(
                    "asset {} '{}': {}x{} palette {} tiles {:?}",
                    i,
                    manifest.name_of(i),
                    info.width,
                    info.height,
                    info.palette_index,
                    info.tile_indices
                );
            }
            if tiles {
                for (i, tile) in tables.loaded_tiles().iter().enumerate() {
                    println!("tile {}:\n{}", i, tile.to_index_grid());
                }
            }

            if let Some(dump_dir) = dump_dir {
                let names: Vec<String> = (0..tables.asset_infos.len())
                    .map(|i| manifest.name_of(i))
                    .collect();
                dump_assets(
                    &names,
                    &tables.asset_infos,
                    tables.loaded_tiles(),
                    tables.loaded_palettes(),
                    &dump_dir,
                    true,
                )?;
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        error!("{}", e);
        process::exit(1);
    }

    info!("Processing complete!");
}
