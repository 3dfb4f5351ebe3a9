//! # PPU data model
//!
//! The fixed-function picture unit works with 8x8 tiles of 2-bit colour indices and 4-colour
//! palettes. Tiles are stored as two bitplanes: for pixel (x, y), counted from the bottom-left,
//! bit x of `bit0[y]` is the low bit of the colour index and bit x of `bit1[y]` is the high bit.

use std::io::{self, Cursor};

use image::Rgba;

use crate::binary_utils::read_array;
use crate::chunk::ChunkRecord;

pub const TILE_DIM: usize = 8;
pub const PIXELS_PER_TILE: usize = TILE_DIM * TILE_DIM;
pub const PALETTE_SIZE: usize = 4;

/// Hardware tile table slots
pub const MAX_TILES: usize = 256;
/// Hardware palette table slots
pub const MAX_PALETTES: usize = 8;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tile {
    pub bit0: [u8; TILE_DIM],
    pub bit1: [u8; TILE_DIM],
}

impl Tile {
    pub fn colour_index(&self, x: usize, y: usize) -> u8 {
        ((self.bit0[y] >> x) & 1) | (((self.bit1[y] >> x) & 1) << 1)
    }

    pub fn set_colour_index(&mut self, x: usize, y: usize, index: u8) {
        let mask = 1u8 << x;
        self.bit0[y] = (self.bit0[y] & !mask) | ((index & 1) << x);
        self.bit1[y] = (self.bit1[y] & !mask) | (((index >> 1) & 1) << x);
    }

    /// Renders the tile as rows of colour indices, top row first.
    pub fn to_index_grid(&self) -> String {
        let mut out = String::with_capacity(TILE_DIM * (TILE_DIM * 2 + 1));
        for y in (0..TILE_DIM).rev() {
            let row: Vec<String> = (0..TILE_DIM)
                .map(|x| self.colour_index(x, y).to_string())
                .collect();
            out.push_str(&row.join(" "));
            out.push('\n');
        }
        out
    }
}

impl ChunkRecord for Tile {
    const RECORD_SIZE: usize = TILE_DIM * 2;

    fn write_record(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.bit0);
        out.extend_from_slice(&self.bit1);
    }

    fn read_record(cursor: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Tile {
            bit0: read_array(cursor)?,
            bit1: read_array(cursor)?,
        })
    }
}

/// Four RGBA colours. Slot 0 is transparent for every palette built by the converter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette(pub [Rgba<u8>; PALETTE_SIZE]);

impl Default for Palette {
    fn default() -> Self {
        Palette([TRANSPARENT; PALETTE_SIZE])
    }
}

impl Palette {
    pub fn slot_of(&self, colour: Rgba<u8>) -> Option<usize> {
        self.0.iter().position(|&c| c == colour)
    }

    /// True when every colour of `other` appears somewhere in `self`, in any slot.
    pub fn contains_all(&self, other: &Palette) -> bool {
        other.0.iter().all(|&c| self.slot_of(c).is_some())
    }

    pub fn describe(&self) -> String {
        self.0
            .iter()
            .map(|c| format!("({} {} {} {})", c[0], c[1], c[2], c[3]))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl ChunkRecord for Palette {
    const RECORD_SIZE: usize = PALETTE_SIZE * 4;

    fn write_record(&self, out: &mut Vec<u8>) {
        for colour in &self.0 {
            out.extend_from_slice(&colour.0);
        }
    }

    fn read_record(cursor: &mut Cursor<&[u8]>) -> io::Result<Self> {
        let mut palette = Palette::default();
        for colour in palette.0.iter_mut() {
            *colour = Rgba(read_array(cursor)?);
        }
        Ok(palette)
    }
}
