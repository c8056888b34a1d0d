//! Typed name/value parameters
//!
//! Every parameter is stored as a name, a raw value blob and a MIME type that
//! describes how the blob is interpreted. Numeric values are stored in their
//! natural little-endian width, text values as UTF-16LE and ascii values as
//! single bytes. A MIME type that is not recognized is kept verbatim so the
//! parameter survives a read/write cycle untouched.

use std::io::{Read, Seek, Write};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ParameterError, Result};
use crate::io;

pub const MIME_INT8: &str = "text/x-calvin-integer-8";
pub const MIME_UINT8: &str = "text/x-calvin-unsigned-integer-8";
pub const MIME_INT16: &str = "text/x-calvin-integer-16";
pub const MIME_UINT16: &str = "text/x-calvin-unsigned-integer-16";
pub const MIME_INT32: &str = "text/x-calvin-integer-32";
pub const MIME_UINT32: &str = "text/x-calvin-unsigned-integer-32";
pub const MIME_FLOAT: &str = "text/x-calvin-float";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_ASCII: &str = "text/ascii";

/// The value type of a [`Parameter`], derived from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float,
    /// UTF-16LE text
    Text,
    /// Single byte text
    Ascii,
    /// Any MIME type this crate does not interpret
    Unknown,
}
impl ParameterType {
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Self {
        match mime {
            MIME_INT8 => Self::Int8,
            MIME_UINT8 => Self::UInt8,
            MIME_INT16 => Self::Int16,
            MIME_UINT16 => Self::UInt16,
            MIME_INT32 => Self::Int32,
            MIME_UINT32 => Self::UInt32,
            MIME_FLOAT => Self::Float,
            MIME_TEXT => Self::Text,
            MIME_ASCII => Self::Ascii,
            _ => Self::Unknown,
        }
    }

    /// Byte width of a fixed-size value, `None` for text and unknown types
    #[must_use]
    pub fn value_size(&self) -> Option<usize> {
        match self {
            Self::Int8 | Self::UInt8 => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::UInt32 | Self::Float => Some(4),
            Self::Text | Self::Ascii | Self::Unknown => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Float => "float",
            Self::Text => "text",
            Self::Ascii => "ascii",
            Self::Unknown => "unknown",
        }
    }
}

/// A name/value/type triple attached to a header
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    value: Vec<u8>,
    mime_type: String,
}
impl Parameter {
    fn from_parts(name: impl Into<String>, value: Vec<u8>, mime_type: &str) -> Self {
        Self {
            name: name.into(),
            value,
            mime_type: mime_type.to_string(),
        }
    }

    #[must_use]
    pub fn int8(name: impl Into<String>, value: i8) -> Self {
        Self::from_parts(name, value.to_le_bytes().to_vec(), MIME_INT8)
    }

    #[must_use]
    pub fn uint8(name: impl Into<String>, value: u8) -> Self {
        Self::from_parts(name, vec![value], MIME_UINT8)
    }

    #[must_use]
    pub fn int16(name: impl Into<String>, value: i16) -> Self {
        Self::from_parts(name, value.to_le_bytes().to_vec(), MIME_INT16)
    }

    #[must_use]
    pub fn uint16(name: impl Into<String>, value: u16) -> Self {
        Self::from_parts(name, value.to_le_bytes().to_vec(), MIME_UINT16)
    }

    #[must_use]
    pub fn int32(name: impl Into<String>, value: i32) -> Self {
        Self::from_parts(name, value.to_le_bytes().to_vec(), MIME_INT32)
    }

    #[must_use]
    pub fn uint32(name: impl Into<String>, value: u32) -> Self {
        Self::from_parts(name, value.to_le_bytes().to_vec(), MIME_UINT32)
    }

    #[must_use]
    pub fn float(name: impl Into<String>, value: f32) -> Self {
        Self::from_parts(name, value.to_le_bytes().to_vec(), MIME_FLOAT)
    }

    #[must_use]
    pub fn text(name: impl Into<String>, value: &str) -> Self {
        Self::text_reserved(name, value, 0)
    }

    /// Creates a text parameter whose value occupies at least `reserve` code units
    ///
    /// The unused tail is zero-filled, which leaves room for an in-place update
    /// with a longer value later on.
    #[must_use]
    pub fn text_reserved(name: impl Into<String>, value: &str, reserve: usize) -> Self {
        let mut bytes = io::encode_utf16le(value);
        if bytes.len() < 2 * reserve {
            bytes.resize(2 * reserve, 0);
        }
        Self::from_parts(name, bytes, MIME_TEXT)
    }

    #[must_use]
    pub fn ascii(name: impl Into<String>, value: &str) -> Self {
        Self::ascii_reserved(name, value, 0)
    }

    /// Creates an ascii parameter whose value occupies at least `reserve` bytes
    #[must_use]
    pub fn ascii_reserved(name: impl Into<String>, value: &str, reserve: usize) -> Self {
        let mut bytes = value.as_bytes().to_vec();
        if bytes.len() < reserve {
            bytes.resize(reserve, 0);
        }
        Self::from_parts(name, bytes, MIME_ASCII)
    }

    /// Creates a parameter with an arbitrary MIME type and an uninterpreted value
    #[must_use]
    pub fn opaque(name: impl Into<String>, value: Vec<u8>, mime_type: &str) -> Self {
        Self::from_parts(name, value, mime_type)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn param_type(&self) -> ParameterType {
        ParameterType::from_mime_type(&self.mime_type)
    }

    /// The raw value bytes as stored in the file
    #[must_use]
    pub fn raw_value(&self) -> &[u8] {
        &self.value
    }

    /// Checks the parameter type and returns the fixed-size value bytes
    fn checked_value(&self, expected: ParameterType) -> Result<&[u8]> {
        let found = self.param_type();
        if found != expected {
            return Err(ParameterError::Mismatch {
                name: self.name.clone(),
                expected: expected.name(),
                found: self.mime_type.clone(),
            }
            .into());
        }
        if let Some(size) = expected.value_size() {
            if self.value.len() != size {
                return Err(ParameterError::InvalidValueSize {
                    name: self.name.clone(),
                    len: self.value.len(),
                    expected: size,
                }
                .into());
            }
        }
        Ok(&self.value)
    }

    pub fn value_int8(&self) -> Result<i8> {
        self.checked_value(ParameterType::Int8)
            .map(|v| i8::from_le_bytes([v[0]]))
    }

    pub fn value_uint8(&self) -> Result<u8> {
        self.checked_value(ParameterType::UInt8).map(|v| v[0])
    }

    pub fn value_int16(&self) -> Result<i16> {
        self.checked_value(ParameterType::Int16)
            .map(LittleEndian::read_i16)
    }

    pub fn value_uint16(&self) -> Result<u16> {
        self.checked_value(ParameterType::UInt16)
            .map(LittleEndian::read_u16)
    }

    pub fn value_int32(&self) -> Result<i32> {
        self.checked_value(ParameterType::Int32)
            .map(LittleEndian::read_i32)
    }

    pub fn value_uint32(&self) -> Result<u32> {
        self.checked_value(ParameterType::UInt32)
            .map(LittleEndian::read_u32)
    }

    pub fn value_float(&self) -> Result<f32> {
        self.checked_value(ParameterType::Float)
            .map(LittleEndian::read_f32)
    }

    /// Decodes a text value, ignoring any reserved zero padding
    pub fn value_text(&self) -> Result<String> {
        self.checked_value(ParameterType::Text)
            .map(io::decode_utf16le)
    }

    /// Decodes an ascii value, ignoring any reserved zero padding
    pub fn value_ascii(&self) -> Result<String> {
        self.checked_value(ParameterType::Ascii)
            .map(io::decode_ascii)
    }

    /// Number of bytes this parameter occupies on disk
    #[must_use]
    pub fn encoded_size(&self) -> u64 {
        io::string16_size(&self.name) + 4 + self.value.len() as u64 + io::string16_size(&self.mime_type)
    }

    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let name = io::read_string16(reader)?;
        let value = io::read_blob(reader)?;
        let mime_type = io::read_string16(reader)?;
        Ok(Self {
            name,
            value,
            mime_type,
        })
    }

    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        io::write_string16(writer, &self.name)?;
        io::write_blob(writer, &self.value)?;
        io::write_string16(writer, &self.mime_type)?;
        Ok(())
    }
}

/// Reads a `u32` count followed by that many parameters
pub(crate) fn read_parameters<R: Read + Seek>(reader: &mut R) -> Result<Vec<Parameter>> {
    let count = io::read_u32(reader)?;
    (0..count).map(|_| Parameter::from_reader(reader)).collect()
}

pub(crate) fn write_parameters<W: Write>(writer: &mut W, params: &[Parameter]) -> Result<()> {
    io::write_u32(writer, io::to_u32(params.len() as u64)?)?;
    params.iter().try_for_each(|p| p.write_bytes(writer))
}

/// Finds a parameter by exact (case sensitive) name
pub(crate) fn find_parameter<'a>(params: &'a [Parameter], name: &str) -> Option<&'a Parameter> {
    params.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_numeric_values() -> Result<()> {
        assert_eq!(Parameter::int8("a", -8).value_int8()?, -8);
        assert_eq!(Parameter::uint8("a", 200).value_uint8()?, 200);
        assert_eq!(Parameter::int16("a", -1600).value_int16()?, -1600);
        assert_eq!(Parameter::uint16("a", 61_000).value_uint16()?, 61_000);
        assert_eq!(Parameter::int32("a", -320_000).value_int32()?, -320_000);
        assert_eq!(Parameter::uint32("a", 4_000_000_000).value_uint32()?, 4_000_000_000);
        assert!((Parameter::float("Pixel Size", 0.051).value_float()? - 0.051).abs() < f32::EPSILON);
        assert_eq!(Parameter::int16("a", 1).raw_value().len(), 2);
        Ok(())
    }

    #[test]
    fn test_type_mismatch() {
        let param = Parameter::text("Scanner", "M10");
        let err = param.value_int32().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ParameterError(ParameterError::Mismatch { .. })
        ));
        assert!(Parameter::uint8("a", 1).value_int8().is_err());
    }

    #[test]
    fn test_reserved_text() -> Result<()> {
        let param = Parameter::text_reserved("Scanner", "M10", 100);
        assert_eq!(param.raw_value().len(), 200);
        assert_eq!(param.value_text()?, "M10");

        let param = Parameter::ascii_reserved("barcode", "abc", 20);
        assert_eq!(param.raw_value().len(), 20);
        assert_eq!(param.value_ascii()?, "abc");

        // A reserve shorter than the value keeps the whole value
        let param = Parameter::text_reserved("Scanner", "M10", 1);
        assert_eq!(param.raw_value().len(), 6);
        Ok(())
    }

    #[test]
    fn test_codec() -> Result<()> {
        let params = vec![
            Parameter::text("Scanner", "M10"),
            Parameter::float("Pixel Size", 0.051),
            Parameter::opaque("blob", vec![1, 2, 3], "application/x-custom"),
        ];
        let mut cursor = Cursor::new(Vec::new());
        write_parameters(&mut cursor, &params)?;
        let expected: u64 = 4 + params.iter().map(Parameter::encoded_size).sum::<u64>();
        assert_eq!(cursor.get_ref().len() as u64, expected);

        cursor.set_position(0);
        let decoded = read_parameters(&mut cursor)?;
        assert_eq!(decoded, params);
        assert_eq!(decoded[2].param_type(), ParameterType::Unknown);
        assert_eq!(decoded[2].mime_type(), "application/x-custom");
        assert!(find_parameter(&decoded, "scanner").is_none());
        assert!(find_parameter(&decoded, "Scanner").is_some());
        Ok(())
    }
}
