//! # Chunk codec
//!
//! A chunk is a magic-tagged, length-prefixed block of homogeneous fixed-size records:
//!
//! ```text
//! [4 bytes magic][u32 LE payload length in bytes][record 0][record 1]...
//! ```
//!
//! The codec knows nothing about what the records mean. Several chunks may be concatenated in one
//! file; readers pull them back out in the order they were written.

use std::fmt;
use std::io::{self, Cursor, Read, Write};

use crate::binary_utils::read_u8;

pub type Magic = [u8; 4];

pub const TILE_MAGIC: Magic = *b"tile";
pub const PALETTE_MAGIC: Magic = *b"pale";
pub const TILE_IDX_MAGIC: Magic = *b"tidx";
pub const ASSET_INFO_MAGIC: Magic = *b"aset";

/// A plain-data record with a fixed on-disk size.
pub trait ChunkRecord: Sized {
    const RECORD_SIZE: usize;

    /// Appends exactly `RECORD_SIZE` bytes.
    fn write_record(&self, out: &mut Vec<u8>);

    fn read_record(cursor: &mut Cursor<&[u8]>) -> io::Result<Self>;
}

impl ChunkRecord for u8 {
    const RECORD_SIZE: usize = 1;

    fn write_record(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }

    fn read_record(cursor: &mut Cursor<&[u8]>) -> io::Result<Self> {
        read_u8(cursor)
    }
}

#[derive(Debug)]
pub enum FormatError {
    Io(io::Error),
    MagicMismatch {
        expected: Magic,
        found: Magic,
    },
    LengthNotMultiple {
        magic: Magic,
        length: u32,
        record_size: usize,
    },
    UnexpectedEof {
        magic: Magic,
        wanted: usize,
        got: usize,
    },
    TooManyRecords {
        magic: Magic,
        count: usize,
        capacity: usize,
    },
    BadTileRange {
        asset: usize,
        begin: u32,
        end: u32,
        available: usize,
    },
    DanglingReference {
        asset: usize,
        kind: &'static str,
        index: usize,
        count: usize,
    },
    BadAssetShape {
        asset: usize,
        width: u32,
        height: u32,
        tiles: usize,
    },
}

impl From<io::Error> for FormatError {
    fn from(err: io::Error) -> Self {
        FormatError::Io(err)
    }
}

fn magic_str(magic: &Magic) -> String {
    String::from_utf8_lossy(magic).into_owned()
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Io(err) => write!(f, "I/O error: {}", err),
            FormatError::MagicMismatch { expected, found } => write!(
                f,
                "magic mismatch: expected {:?}, found {:?}",
                magic_str(expected),
                magic_str(found)
            ),
            FormatError::LengthNotMultiple {
                magic,
                length,
                record_size,
            } => write!(
                f,
                "chunk {:?} declares {} bytes, not a multiple of record size {}",
                magic_str(magic),
                length,
                record_size
            ),
            FormatError::UnexpectedEof { magic, wanted, got } => write!(
                f,
                "unexpected end of input in chunk {:?}: wanted {} bytes, got {}",
                magic_str(magic),
                wanted,
                got
            ),
            FormatError::TooManyRecords {
                magic,
                count,
                capacity,
            } => write!(
                f,
                "chunk {:?} holds {} records but only {} slots exist",
                magic_str(magic),
                count,
                capacity
            ),
            FormatError::BadTileRange {
                asset,
                begin,
                end,
                available,
            } => write!(
                f,
                "asset {} tile range {}..{} is outside the {} stored tile indices",
                asset, begin, end, available
            ),
            FormatError::DanglingReference {
                asset,
                kind,
                index,
                count,
            } => write!(
                f,
                "asset {} references {} {} but only {} are loaded",
                asset, kind, index, count
            ),
            FormatError::BadAssetShape {
                asset,
                width,
                height,
                tiles,
            } => write!(
                f,
                "asset {} is {}x{} pixels but lists {} tiles",
                asset, width, height, tiles
            ),
        }
    }
}

impl std::error::Error for FormatError {}

/// Writes `magic`, the payload length, then every record back to back.
pub fn write_chunk<T: ChunkRecord, W: Write>(
    magic: &Magic,
    records: &[T],
    out: &mut W,
) -> io::Result<()> {
    let mut payload = Vec::with_capacity(records.len() * T::RECORD_SIZE);
    for record in records {
        record.write_record(&mut payload);
    }
    debug_assert_eq!(payload.len(), records.len() * T::RECORD_SIZE);

    let length = u32::try_from(payload.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("chunk {:?} payload too large", magic_str(magic)),
        )
    })?;

    out.write_all(magic)?;
    out.write_all(&length.to_le_bytes())?;
    out.write_all(&payload)?;
    Ok(())
}

/// Reads the exact number of bytes requested or reports how many were available.
fn read_full<R: Read>(input: &mut R, magic: &Magic, wanted: usize) -> Result<Vec<u8>, FormatError> {
    let mut buf = Vec::with_capacity(wanted.min(1 << 16));
    input.by_ref().take(wanted as u64).read_to_end(&mut buf)?;
    if buf.len() < wanted {
        return Err(FormatError::UnexpectedEof {
            magic: *magic,
            wanted,
            got: buf.len(),
        });
    }
    Ok(buf)
}

/// Reads one chunk tagged `expected`. Nothing is returned unless the whole chunk decodes.
pub fn read_chunk<T: ChunkRecord, R: Read>(
    input: &mut R,
    expected: &Magic,
) -> Result<Vec<T>, FormatError> {
    let header = read_full(input, expected, 8)?;

    let mut found = [0u8; 4];
    found.copy_from_slice(&header[0..4]);
    if &found != expected {
        return Err(FormatError::MagicMismatch {
            expected: *expected,
            found,
        });
    }

    let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if length as usize % T::RECORD_SIZE != 0 {
        return Err(FormatError::LengthNotMultiple {
            magic: *expected,
            length,
            record_size: T::RECORD_SIZE,
        });
    }

    let payload = read_full(input, expected, length as usize)?;
    let mut cursor = Cursor::new(payload.as_slice());
    let count = payload.len() / T::RECORD_SIZE;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(T::read_record(&mut cursor)?);
    }

    Ok(records)
}
