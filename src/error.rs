use std::{fmt, io, path::PathBuf};

use image::ImageError;

use crate::chunk::FormatError;
use crate::ppu::{MAX_PALETTES, MAX_TILES, PALETTE_SIZE};

/// Asset data does not fit the hardware tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    /// An image uses more colours than a palette holds (transparent included).
    TooManyColours { found: usize },
    TooManyTiles { needed: usize },
    TooManyPalettes { needed: usize },
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityError::TooManyColours { found } => write!(
                f,
                "image uses at least {} colours including transparent, a palette holds {}",
                found, PALETTE_SIZE
            ),
            CapacityError::TooManyTiles { needed } => write!(
                f,
                "{} unique tiles needed, the tile table holds {}",
                needed, MAX_TILES
            ),
            CapacityError::TooManyPalettes { needed } => write!(
                f,
                "{} palettes needed, the palette table holds {}",
                needed, MAX_PALETTES
            ),
        }
    }
}

#[derive(Debug)]
pub enum ConvertError {
    Io(io::Error),
    Image(ImageError),
    Json(serde_json::Error),
    Format(FormatError),
    Capacity(CapacityError),
    /// Image dimensions are not whole tiles, or the pixel buffer disagrees with them.
    Dimensions {
        width: u32,
        height: u32,
        pixels: usize,
    },
    ColourNotInPalette {
        colour: [u8; 4],
    },
    /// Read-back produced something other than what was written.
    Consistency(String),
    Asset {
        name: String,
        path: PathBuf,
        source: Box<ConvertError>,
    },
}

impl From<io::Error> for ConvertError {
    fn from(err: io::Error) -> Self {
        ConvertError::Io(err)
    }
}
impl From<ImageError> for ConvertError {
    fn from(err: ImageError) -> Self {
        ConvertError::Image(err)
    }
}
impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::Json(err)
    }
}
impl From<FormatError> for ConvertError {
    fn from(err: FormatError) -> Self {
        ConvertError::Format(err)
    }
}
impl From<CapacityError> for ConvertError {
    fn from(err: CapacityError) -> Self {
        ConvertError::Capacity(err)
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Io(err) => write!(f, "I/O error: {}", err),
            ConvertError::Image(err) => write!(f, "Image error: {}", err),
            ConvertError::Json(err) => write!(f, "JSON error: {}", err),
            ConvertError::Format(err) => write!(f, "Chunk format error: {}", err),
            ConvertError::Capacity(err) => write!(f, "Capacity exceeded: {}", err),
            ConvertError::Dimensions {
                width,
                height,
                pixels,
            } => write!(
                f,
                "Bad image dimensions {}x{} ({} pixels): width and height must be multiples of 8",
                width, height, pixels
            ),
            ConvertError::ColourNotInPalette { colour } => write!(
                f,
                "Colour {:?} is missing from the resolved palette",
                colour
            ),
            ConvertError::Consistency(msg) => write!(f, "Round-trip check failed: {}", msg),
            ConvertError::Asset { name, path, source } => {
                write!(f, "Asset '{}' ({}): {}", name, path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConvertError {}
