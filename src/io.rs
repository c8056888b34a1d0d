//! Little-endian field codec shared by the header reader and writer
//!
//! Strings come in two flavours on disk: `str8` (a `u32` byte count followed by
//! ASCII bytes) and `str16` (a `u32` code-unit count followed by UTF-16LE code units).
//! Parameter values are stored as a `u32` byte count followed by the raw bytes.

use std::io::{ErrorKind, Read, Seek, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{HeaderError, Result, WriteError};

/// Largest length prefix accepted for a single header field
pub const MAX_FIELD_LEN: u32 = 64 * 1024 * 1024;

/// Converts an end-of-stream error into a header truncation error
fn map_eof<R: Seek>(reader: &mut R, err: std::io::Error) -> crate::Error {
    if err.kind() == ErrorKind::UnexpectedEof {
        let pos = reader.stream_position().unwrap_or_default();
        HeaderError::Truncated(pos).into()
    } else {
        err.into()
    }
}

pub fn read_u8<R: Read + Seek>(reader: &mut R) -> Result<u8> {
    reader.read_u8().map_err(|e| map_eof(reader, e))
}

pub fn read_u32<R: Read + Seek>(reader: &mut R) -> Result<u32> {
    reader
        .read_u32::<LittleEndian>()
        .map_err(|e| map_eof(reader, e))
}

/// Reads a length prefix and validates it against [`MAX_FIELD_LEN`]
fn read_len<R: Read + Seek>(reader: &mut R, unit: u32) -> Result<usize> {
    let pos = reader.stream_position()?;
    let len = read_u32(reader)?;
    if len.saturating_mul(unit) > MAX_FIELD_LEN {
        return Err(HeaderError::InvalidLength { len, pos }.into());
    }
    Ok(len as usize)
}

pub fn read_blob<R: Read + Seek>(reader: &mut R) -> Result<Vec<u8>> {
    let len = read_len(reader, 1)?;
    let mut buffer = vec![0u8; len];
    reader
        .read_exact(&mut buffer)
        .map_err(|e| map_eof(reader, e))?;
    Ok(buffer)
}

pub fn read_string8<R: Read + Seek>(reader: &mut R) -> Result<String> {
    let bytes = read_blob(reader)?;
    Ok(decode_ascii(&bytes))
}

pub fn read_string16<R: Read + Seek>(reader: &mut R) -> Result<String> {
    let len = read_len(reader, 2)?;
    let mut units = vec![0u16; len];
    reader
        .read_u16_into::<LittleEndian>(&mut units)
        .map_err(|e| map_eof(reader, e))?;
    Ok(String::from_utf16_lossy(&units))
}

pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_u32::<LittleEndian>(value)?;
    Ok(())
}

pub fn write_blob<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    write_u32(writer, to_u32(bytes.len() as u64)?)?;
    writer.write_all(bytes)?;
    Ok(())
}

pub fn write_string8<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    write_blob(writer, value.as_bytes())
}

pub fn write_string16<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    let units: Vec<u16> = value.encode_utf16().collect();
    write_u32(writer, to_u32(units.len() as u64)?)?;
    units
        .iter()
        .try_for_each(|&u| writer.write_u16::<LittleEndian>(u))?;
    Ok(())
}

/// Number of bytes `write_string8` emits for `value`
#[must_use]
pub fn string8_size(value: &str) -> u64 {
    4 + value.len() as u64
}

/// Number of bytes `write_string16` emits for `value`
#[must_use]
pub fn string16_size(value: &str) -> u64 {
    4 + 2 * value.encode_utf16().count() as u64
}

/// Narrows an offset or length to its 32-bit on-disk representation
pub fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| WriteError::FieldOverflow(value).into())
}

/// Narrows a stream position observed while reading a header
pub fn to_header_pos(pos: u64) -> Result<u32> {
    u32::try_from(pos)
        .map_err(|_| HeaderError::Format(format!("header position {pos} exceeds 32 bits")).into())
}

/// Decodes ASCII bytes up to the first NUL
#[must_use]
pub fn decode_ascii(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Decodes UTF-16LE bytes up to the first NUL code unit
#[must_use]
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Encodes text as UTF-16LE bytes
#[must_use]
pub fn encode_utf16le(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_strings() -> Result<()> {
        let mut cursor = Cursor::new(Vec::new());
        write_string8(&mut cursor, "test-dat-guid")?;
        write_string16(&mut cursor, "en-US")?;
        assert_eq!(
            cursor.get_ref().len() as u64,
            string8_size("test-dat-guid") + string16_size("en-US")
        );

        cursor.set_position(0);
        assert_eq!(read_string8(&mut cursor)?, "test-dat-guid");
        assert_eq!(read_string16(&mut cursor)?, "en-US");
        Ok(())
    }

    #[test]
    fn test_truncated_string() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&10u32.to_le_bytes());
        buffer.extend_from_slice(b"abc");
        let mut cursor = Cursor::new(buffer);
        let err = read_string8(&mut cursor).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::HeaderError(HeaderError::Truncated(_))
        ));
    }

    #[test]
    fn test_oversized_length() {
        let mut cursor = Cursor::new(u32::MAX.to_le_bytes().to_vec());
        let err = read_blob(&mut cursor).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::HeaderError(HeaderError::InvalidLength { pos: 0, .. })
        ));
    }

    #[test]
    fn test_decode_trims_nul() {
        assert_eq!(decode_ascii(b"abc\0\0\0"), "abc");
        let mut bytes = encode_utf16le("twenty-five");
        bytes.extend_from_slice(&[0; 8]);
        assert_eq!(decode_utf16le(&bytes), "twenty-five");
    }
}
