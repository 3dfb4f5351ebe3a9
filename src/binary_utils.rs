use std::io::{self, Cursor, Read};

fn remaining(cursor: &Cursor<&[u8]>) -> u64 {
    (cursor.get_ref().len() as u64).saturating_sub(cursor.position())
}

pub fn read_u8(cursor: &mut Cursor<&[u8]>) -> io::Result<u8> {
    if remaining(cursor) < 1 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "End of buffer reached",
        ));
    }

    let mut buf = [0u8; 1];
    cursor.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_u32_le(cursor: &mut Cursor<&[u8]>) -> io::Result<u32> {
    if remaining(cursor) < 4 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "End of buffer reached or not enough bytes for u32",
        ));
    }

    let mut buf = [0u8; 4];
    cursor.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Reads a fixed-size array, used for bitplanes and packed colours.
pub fn read_array<const N: usize>(cursor: &mut Cursor<&[u8]>) -> io::Result<[u8; N]> {
    if remaining(cursor) < N as u64 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("Not enough bytes remaining for read_array({})", N),
        ));
    }

    let mut buf = [0u8; N];
    cursor.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn write_u32_le(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_u32_at_exact_end_of_buffer() {
        let data = [0xAAu8, 0x78, 0x56, 0x34, 0x12];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_u8(&mut cursor).unwrap(), 0xAA);
        assert_eq!(read_u32_le(&mut cursor).unwrap(), 0x1234_5678);
        assert_eq!(
            read_u8(&mut cursor).unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn short_reads_report_eof_without_consuming() {
        let data = [1u8, 2, 3];
        let mut cursor = Cursor::new(&data[..]);
        assert!(read_u32_le(&mut cursor).is_err());
        assert!(read_array::<4>(&mut cursor).is_err());
        assert_eq!(cursor.position(), 0);
        assert_eq!(read_array::<3>(&mut cursor).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn writes_little_endian() {
        let mut out = Vec::new();
        write_u32_le(&mut out, 0x0102_0304);
        assert_eq!(out, vec![4, 3, 2, 1]);
    }
}
