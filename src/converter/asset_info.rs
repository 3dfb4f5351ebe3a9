//! Per-asset metadata and its two-chunk storage form.
//!
//! On disk the tile indices of every asset are concatenated into one `tidx` byte stream, followed
//! by an `aset` chunk of fixed descriptors that point back into that stream.

use std::io::{self, Cursor, Read, Write};

use crate::binary_utils::{read_array, read_u32_le, read_u8, write_u32_le};
use crate::chunk::{read_chunk, write_chunk, ChunkRecord, FormatError, ASSET_INFO_MAGIC, TILE_IDX_MAGIC};
use crate::ppu::TILE_DIM;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetInfo {
    /// Indices into the tile table, row-major starting with the bottom-left tile.
    pub tile_indices: Vec<u8>,
    /// Every tile of an asset shares this palette.
    pub palette_index: u8,
    pub width: u32,
    pub height: u32,
}

impl AssetInfo {
    pub fn tile_columns(&self) -> usize {
        self.width as usize / TILE_DIM
    }

    pub fn tile_rows(&self) -> usize {
        self.height as usize / TILE_DIM
    }

    /// Tile index at block (`col`, `row`), row 0 being the bottom row.
    pub fn tile_at(&self, col: usize, row: usize) -> Option<u8> {
        if col >= self.tile_columns() || row >= self.tile_rows() {
            return None;
        }
        self.tile_indices
            .get(row * self.tile_columns() + col)
            .copied()
    }
}

/// Fixed descriptor record. The three bytes after `palette_index` are zero padding that keeps
/// `width` 4-byte aligned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoredAssetInfo {
    pub tile_idx_begin: u32,
    pub tile_idx_end: u32,
    pub palette_index: u8,
    pub width: u32,
    pub height: u32,
}

impl ChunkRecord for StoredAssetInfo {
    const RECORD_SIZE: usize = 20;

    fn write_record(&self, out: &mut Vec<u8>) {
        write_u32_le(out, self.tile_idx_begin);
        write_u32_le(out, self.tile_idx_end);
        out.push(self.palette_index);
        out.extend_from_slice(&[0u8; 3]);
        write_u32_le(out, self.width);
        write_u32_le(out, self.height);
    }

    fn read_record(cursor: &mut Cursor<&[u8]>) -> io::Result<Self> {
        let tile_idx_begin = read_u32_le(cursor)?;
        let tile_idx_end = read_u32_le(cursor)?;
        let palette_index = read_u8(cursor)?;
        let _padding: [u8; 3] = read_array(cursor)?;
        let width = read_u32_le(cursor)?;
        let height = read_u32_le(cursor)?;
        Ok(StoredAssetInfo {
            tile_idx_begin,
            tile_idx_end,
            palette_index,
            width,
            height,
        })
    }
}

/// Flattens `infos` into the index stream and descriptor table.
pub fn pack_asset_infos(infos: &[AssetInfo]) -> (Vec<u8>, Vec<StoredAssetInfo>) {
    let mut tile_indices = Vec::new();
    let mut stored = Vec::with_capacity(infos.len());

    for info in infos {
        let tile_idx_begin = tile_indices.len() as u32;
        tile_indices.extend_from_slice(&info.tile_indices);
        stored.push(StoredAssetInfo {
            tile_idx_begin,
            tile_idx_end: tile_indices.len() as u32,
            palette_index: info.palette_index,
            width: info.width,
            height: info.height,
        });
    }

    (tile_indices, stored)
}

pub fn write_asset_info_chunk<W: Write>(infos: &[AssetInfo], out: &mut W) -> io::Result<()> {
    let (tile_indices, stored) = pack_asset_infos(infos);
    write_chunk(&TILE_IDX_MAGIC, &tile_indices, out)?;
    write_chunk(&ASSET_INFO_MAGIC, &stored, out)
}

pub fn read_asset_info_chunk<R: Read>(input: &mut R) -> Result<Vec<AssetInfo>, FormatError> {
    let tile_indices: Vec<u8> = read_chunk(input, &TILE_IDX_MAGIC)?;
    let stored: Vec<StoredAssetInfo> = read_chunk(input, &ASSET_INFO_MAGIC)?;

    stored
        .iter()
        .enumerate()
        .map(|(asset, s)| {
            let (begin, end) = (s.tile_idx_begin as usize, s.tile_idx_end as usize);
            if begin > end || end > tile_indices.len() {
                return Err(FormatError::BadTileRange {
                    asset,
                    begin: s.tile_idx_begin,
                    end: s.tile_idx_end,
                    available: tile_indices.len(),
                });
            }
            Ok(AssetInfo {
                tile_indices: tile_indices[begin..end].to_vec(),
                palette_index: s.palette_index,
                width: s.width,
                height: s.height,
            })
        })
        .collect()
}
