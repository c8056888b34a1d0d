use std::io::{Read, Seek, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::{HeaderError, Result, WriteError};
use crate::io;

/// Bytes of the length prefix in front of every string cell
pub const STRING_PREFIX_SIZE: usize = 4;

/// The storage type of a data set column
///
/// String columns carry their capacity in characters. Each string cell is
/// stored as a `u32` length prefix followed by a zero-padded area of
/// `width` bytes (ascii) or `width` UTF-16 code units (unicode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Float,
    Ascii(usize),
    Unicode(usize),
}
impl ColumnType {
    /// The on-disk type tag
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Self::Byte => 0,
            Self::UByte => 1,
            Self::Short => 2,
            Self::UShort => 3,
            Self::Int => 4,
            Self::UInt => 5,
            Self::Float => 6,
            Self::Ascii(_) => 7,
            Self::Unicode(_) => 8,
        }
    }

    /// Number of bytes one cell of this type occupies in a row
    #[must_use]
    pub fn byte_size(&self) -> usize {
        match self {
            Self::Byte | Self::UByte => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Ascii(width) => width + STRING_PREFIX_SIZE,
            Self::Unicode(width) => 2 * width + STRING_PREFIX_SIZE,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Byte => "int8",
            Self::UByte => "uint8",
            Self::Short => "int16",
            Self::UShort => "uint16",
            Self::Int => "int32",
            Self::UInt => "uint32",
            Self::Float => "float",
            Self::Ascii(_) => "ascii",
            Self::Unicode(_) => "unicode",
        }
    }

    /// Rebuilds a column type from its tag and declared byte width
    pub fn from_tag(name: &str, tag: u8, size: u32) -> Result<Self> {
        let invalid = || HeaderError::InvalidColumnSize {
            name: name.to_string(),
            size,
        };
        let size = size as usize;
        let kind = match tag {
            0 => Self::Byte,
            1 => Self::UByte,
            2 => Self::Short,
            3 => Self::UShort,
            4 => Self::Int,
            5 => Self::UInt,
            6 => Self::Float,
            7 => {
                let width = size.checked_sub(STRING_PREFIX_SIZE).ok_or_else(invalid)?;
                Self::Ascii(width)
            }
            8 => {
                let area = size.checked_sub(STRING_PREFIX_SIZE).ok_or_else(invalid)?;
                if area % 2 != 0 {
                    return Err(invalid().into());
                }
                Self::Unicode(area / 2)
            }
            _ => return Err(HeaderError::UnknownColumnType(tag).into()),
        };
        if kind.byte_size() != size {
            return Err(invalid().into());
        }
        Ok(kind)
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::Ascii(_) | Self::Unicode(_))
    }

    /// Decodes a string cell, honouring the length prefix and trimming at the first NUL
    ///
    /// Returns `None` for numeric column types.
    #[must_use]
    pub fn decode_string(&self, cell: &[u8]) -> Option<String> {
        if cell.len() < STRING_PREFIX_SIZE {
            return None;
        }
        let prefix = LittleEndian::read_u32(&cell[..STRING_PREFIX_SIZE]) as usize;
        let area = &cell[STRING_PREFIX_SIZE..];
        match self {
            Self::Ascii(width) => {
                let len = prefix.min(*width).min(area.len());
                Some(io::decode_ascii(&area[..len]))
            }
            Self::Unicode(width) => {
                let len = (2 * prefix.min(*width)).min(area.len());
                Some(io::decode_utf16le(&area[..len]))
            }
            _ => None,
        }
    }

    /// Encodes a string into a full-width cell for this column type
    pub fn encode_string(&self, value: &str) -> Result<Vec<u8>> {
        let (units, width, area) = match self {
            Self::Ascii(width) => (value.len(), *width, value.as_bytes().to_vec()),
            Self::Unicode(width) => {
                let area = io::encode_utf16le(value);
                (area.len() / 2, *width, area)
            }
            _ => {
                return Err(WriteError::InvalidState {
                    expected: "string column",
                    found: self.name(),
                }
                .into())
            }
        };
        if units > width {
            return Err(WriteError::StringTooLong { width, got: units }.into());
        }
        let mut cell = Vec::with_capacity(self.byte_size());
        cell.write_u32::<LittleEndian>(units as u32)?;
        cell.extend_from_slice(&area);
        cell.resize(self.byte_size(), 0);
        Ok(cell)
    }
}

/// Name and type of one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    name: String,
    kind: ColumnType,
}
impl ColumnInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ColumnType {
        self.kind
    }

    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.kind.byte_size()
    }

    #[must_use]
    pub fn encoded_size(&self) -> u64 {
        io::string16_size(&self.name) + 1 + 4
    }

    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let name = io::read_string16(reader)?;
        let tag = io::read_u8(reader)?;
        let size = io::read_u32(reader)?;
        let kind = ColumnType::from_tag(&name, tag, size)?;
        Ok(Self { name, kind })
    }

    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        io::write_string16(writer, &self.name)?;
        writer.write_u8(self.kind.tag())?;
        io::write_u32(writer, io::to_u32(self.byte_size() as u64)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_string_widths() {
        assert_eq!(ColumnType::Ascii(10).byte_size(), 14);
        assert_eq!(ColumnType::Unicode(10).byte_size(), 24);
        assert_eq!(ColumnType::UShort.byte_size(), 2);
    }

    #[test]
    fn test_from_tag() -> Result<()> {
        assert_eq!(ColumnType::from_tag("c", 7, 14)?, ColumnType::Ascii(10));
        assert_eq!(ColumnType::from_tag("c", 8, 24)?, ColumnType::Unicode(10));
        assert!(ColumnType::from_tag("c", 8, 25).is_err());
        assert!(ColumnType::from_tag("c", 4, 2).is_err());
        assert!(matches!(
            ColumnType::from_tag("c", 9, 4),
            Err(crate::Error::HeaderError(HeaderError::UnknownColumnType(9)))
        ));
        Ok(())
    }

    #[test]
    fn test_string_cells() -> Result<()> {
        let kind = ColumnType::Unicode(8);
        let cell = kind.encode_string("probe")?;
        assert_eq!(cell.len(), kind.byte_size());
        assert_eq!(kind.decode_string(&cell).as_deref(), Some("probe"));

        let kind = ColumnType::Ascii(4);
        assert!(kind.encode_string("too long").is_err());
        assert_eq!(
            kind.decode_string(&kind.encode_string("ab")?).as_deref(),
            Some("ab")
        );

        // A length prefix beyond the width is clamped to the width
        let mut cell = vec![0u8; kind.byte_size()];
        cell[..4].copy_from_slice(&99u32.to_le_bytes());
        cell[4..].copy_from_slice(b"wxyz");
        assert_eq!(kind.decode_string(&cell).as_deref(), Some("wxyz"));
        Ok(())
    }

    #[test]
    fn test_column_codec() -> Result<()> {
        let col = ColumnInfo::new("intensity", ColumnType::Float);
        let mut cursor = Cursor::new(Vec::new());
        col.write_bytes(&mut cursor)?;
        assert_eq!(cursor.get_ref().len() as u64, col.encoded_size());
        cursor.set_position(0);
        assert_eq!(ColumnInfo::from_reader(&mut cursor)?, col);
        Ok(())
    }
}
