//! Numeric cell values
//!
//! [`ColumnValue`] ties a Rust primitive to the column type that stores it and
//! knows how to decode and encode its little-endian cell bytes.

use byteorder::{ByteOrder, LittleEndian};

use crate::header::ColumnType;

/// A primitive that can be read from or written to a numeric column
pub trait ColumnValue: bytemuck::Pod + Default + Send + Sync {
    /// The column type holding values of this type
    const COLUMN: ColumnType;

    /// Decodes a value from exactly `size_of::<Self>()` little-endian bytes
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Appends the little-endian encoding of the value
    fn extend_le(&self, buffer: &mut Vec<u8>);
}

macro_rules! impl_column_value {
    ($ty:ty, $column:expr, |$b:ident| $decode:expr) => {
        impl ColumnValue for $ty {
            const COLUMN: ColumnType = $column;

            fn from_le_slice($b: &[u8]) -> Self {
                $decode
            }

            fn extend_le(&self, buffer: &mut Vec<u8>) {
                buffer.extend_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_column_value!(i8, ColumnType::Byte, |b| i8::from_le_bytes([b[0]]));
impl_column_value!(u8, ColumnType::UByte, |b| b[0]);
impl_column_value!(i16, ColumnType::Short, |b| LittleEndian::read_i16(b));
impl_column_value!(u16, ColumnType::UShort, |b| LittleEndian::read_u16(b));
impl_column_value!(i32, ColumnType::Int, |b| LittleEndian::read_i32(b));
impl_column_value!(u32, ColumnType::UInt, |b| LittleEndian::read_u32(b));
impl_column_value!(f32, ColumnType::Float, |b| LittleEndian::read_f32(b));

/// Decodes a run of packed little-endian values into `out`
///
/// On little-endian hosts the bytes are copied straight into the output slice.
pub(crate) fn decode_packed<T: ColumnValue>(bytes: &[u8], out: &mut [T]) {
    if cfg!(target_endian = "little") {
        bytemuck::cast_slice_mut::<T, u8>(out).copy_from_slice(bytes);
    } else {
        let size = std::mem::size_of::<T>();
        out.iter_mut()
            .zip(bytes.chunks_exact(size))
            .for_each(|(v, b)| *v = T::from_le_slice(b));
    }
}

#[cfg(test)]
mod testing {
    use super::*;

    #[test]
    fn test_decode_packed() {
        let values: Vec<u16> = (0..10).map(|r| r * 11).collect();
        let mut bytes = Vec::new();
        values.iter().for_each(|v| v.extend_le(&mut bytes));

        // Offset by one byte to exercise an unaligned source
        let mut shifted = vec![0u8];
        shifted.extend_from_slice(&bytes);

        let mut out = vec![0u16; 10];
        decode_packed(&shifted[1..], &mut out);
        assert_eq!(out, values);
    }

    #[test]
    fn test_from_le_slice() {
        assert_eq!(i16::from_le_slice(&(-5i16).to_le_bytes()), -5);
        assert!((f32::from_le_slice(&1.5f32.to_le_bytes()) - 1.5).abs() < f32::EPSILON);
        assert_eq!(i8::COLUMN, ColumnType::Byte);
    }
}
