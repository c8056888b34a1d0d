use std::io::{Read, Seek, Write};

use super::column::{ColumnInfo, ColumnType};
use crate::error::{HeaderError, Result};
use crate::io;
use crate::parameter::{self, Parameter};

/// Header of a single data set
///
/// Describes the column layout, the row count, the parameters and the absolute
/// file offsets of a data set. Rows are stored row-major without padding, so a
/// cell lives at `data_start_pos + row * row_size + column_offset(col)`.
///
/// A header read in minimal mode only carries the name and the offsets; its
/// row, column and parameter lists are empty until the full header is read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSetHeader {
    name: String,
    row_cnt: u32,
    columns: Vec<ColumnInfo>,
    params: Vec<Parameter>,
    header_start_pos: u32,
    data_start_pos: u32,
    next_set_pos: u32,
    complete: bool,
}
impl DataSetHeader {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            complete: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn row_cnt(&self) -> usize {
        self.row_cnt as usize
    }

    pub fn set_row_cnt(&mut self, rows: u32) {
        self.row_cnt = rows;
    }

    #[must_use]
    pub fn col_cnt(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn column(&self, index: usize) -> Option<&ColumnInfo> {
        self.columns.get(index)
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn add_column(&mut self, column: ColumnInfo) {
        self.columns.push(column);
    }

    pub fn add_byte_column(&mut self, name: impl Into<String>) {
        self.add_column(ColumnInfo::new(name, ColumnType::Byte));
    }

    pub fn add_ubyte_column(&mut self, name: impl Into<String>) {
        self.add_column(ColumnInfo::new(name, ColumnType::UByte));
    }

    pub fn add_short_column(&mut self, name: impl Into<String>) {
        self.add_column(ColumnInfo::new(name, ColumnType::Short));
    }

    pub fn add_ushort_column(&mut self, name: impl Into<String>) {
        self.add_column(ColumnInfo::new(name, ColumnType::UShort));
    }

    pub fn add_int_column(&mut self, name: impl Into<String>) {
        self.add_column(ColumnInfo::new(name, ColumnType::Int));
    }

    pub fn add_uint_column(&mut self, name: impl Into<String>) {
        self.add_column(ColumnInfo::new(name, ColumnType::UInt));
    }

    pub fn add_float_column(&mut self, name: impl Into<String>) {
        self.add_column(ColumnInfo::new(name, ColumnType::Float));
    }

    /// Adds an ascii column holding up to `width` characters per cell
    pub fn add_ascii_column(&mut self, name: impl Into<String>, width: usize) {
        self.add_column(ColumnInfo::new(name, ColumnType::Ascii(width)));
    }

    /// Adds a unicode column holding up to `width` UTF-16 code units per cell
    pub fn add_unicode_column(&mut self, name: impl Into<String>, width: usize) {
        self.add_column(ColumnInfo::new(name, ColumnType::Unicode(width)));
    }

    pub fn add_name_val_param(&mut self, param: Parameter) {
        self.params.push(param);
    }

    #[must_use]
    pub fn name_val_params(&self) -> &[Parameter] {
        &self.params
    }

    #[must_use]
    pub fn name_val_param_cnt(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn find_name_val_param(&self, name: &str) -> Option<&Parameter> {
        parameter::find_parameter(&self.params, name)
    }

    /// Number of bytes in one row
    #[must_use]
    pub fn row_size(&self) -> u64 {
        self.columns.iter().map(|c| c.byte_size() as u64).sum()
    }

    /// Number of bytes of row data
    #[must_use]
    pub fn data_size(&self) -> u64 {
        self.row_size() * u64::from(self.row_cnt)
    }

    /// Byte offset of a column within a row
    #[must_use]
    pub fn column_offset(&self, col: usize) -> u64 {
        self.columns
            .iter()
            .take(col)
            .map(|c| c.byte_size() as u64)
            .sum()
    }

    #[must_use]
    pub fn header_start_pos(&self) -> u64 {
        u64::from(self.header_start_pos)
    }

    #[must_use]
    pub fn data_start_pos(&self) -> u64 {
        u64::from(self.data_start_pos)
    }

    /// Offset of the next data set header, zero when there is none
    #[must_use]
    pub fn next_set_pos(&self) -> u64 {
        u64::from(self.next_set_pos)
    }

    pub(crate) fn set_positions(&mut self, header_start: u32, data_start: u32, next_set: u32) {
        self.header_start_pos = header_start;
        self.data_start_pos = data_start;
        self.next_set_pos = next_set;
    }

    pub(crate) fn set_next_set_pos(&mut self, pos: u32) {
        self.next_set_pos = pos;
    }

    /// False for headers read in minimal mode
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Number of bytes the header occupies in front of the row data
    #[must_use]
    pub fn header_size(&self) -> u64 {
        4 + 4
            + io::string16_size(&self.name)
            + 4
            + self.params.iter().map(Parameter::encoded_size).sum::<u64>()
            + 4
            + self.columns.iter().map(ColumnInfo::encoded_size).sum::<u64>()
            + 4
    }

    /// Reads a data set header starting at the current stream position
    ///
    /// # Arguments
    ///
    /// * `reader` - Stream positioned at the start of the header
    /// * `full` - Read parameters, columns and row count; otherwise only the name and offsets
    pub fn from_reader<R: Read + Seek>(reader: &mut R, full: bool) -> Result<Self> {
        let header_start_pos = io::to_header_pos(reader.stream_position()?)?;
        let data_start_pos = io::read_u32(reader)?;
        let next_set_pos = io::read_u32(reader)?;
        let name = io::read_string16(reader)?;

        let mut header = Self {
            name,
            header_start_pos,
            data_start_pos,
            next_set_pos,
            complete: full,
            ..Self::default()
        };
        if data_start_pos < header_start_pos {
            return Err(HeaderError::Format(format!(
                "data set '{}' starts its data ({data_start_pos}) before its header ({header_start_pos})",
                header.name
            ))
            .into());
        }
        if !full {
            return Ok(header);
        }

        header.params = parameter::read_parameters(reader)?;
        let col_cnt = io::read_u32(reader)?;
        header.columns = (0..col_cnt)
            .map(|_| ColumnInfo::from_reader(reader))
            .collect::<Result<_>>()?;
        header.row_cnt = io::read_u32(reader)?;

        let data_end = header.data_start_pos() + header.data_size();
        if next_set_pos != 0 && header.next_set_pos() < data_end {
            return Err(HeaderError::Format(format!(
                "data set '{}' overlaps the next data set at {next_set_pos} (data ends at {data_end})",
                header.name
            ))
            .into());
        }
        Ok(header)
    }

    /// Writes the header with its stored offsets
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        io::write_u32(writer, self.data_start_pos)?;
        io::write_u32(writer, self.next_set_pos)?;
        io::write_string16(writer, &self.name)?;
        parameter::write_parameters(writer, &self.params)?;
        io::write_u32(writer, io::to_u32(self.columns.len() as u64)?)?;
        self.columns.iter().try_for_each(|c| c.write_bytes(writer))?;
        io::write_u32(writer, self.row_cnt)?;
        Ok(())
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Cursor;

    fn sample_header() -> DataSetHeader {
        let mut header = DataSetHeader::new("acquired data");
        header.add_ushort_column("Pixel");
        header.add_float_column("Intensity");
        header.add_ascii_column("Probe", 8);
        header.add_name_val_param(Parameter::text("Scanner", "M10"));
        header.set_row_cnt(3);
        header
    }

    #[test]
    fn test_layout() {
        let header = sample_header();
        assert_eq!(header.col_cnt(), 3);
        assert_eq!(header.row_size(), 2 + 4 + 12);
        assert_eq!(header.data_size(), 3 * 18);
        assert_eq!(header.column_offset(0), 0);
        assert_eq!(header.column_offset(2), 6);
        assert!(header.find_name_val_param("Scanner").is_some());
        assert!(header.find_name_val_param("scanner").is_none());
    }

    #[test]
    fn test_codec() -> Result<()> {
        let mut header = sample_header();
        let size = header.header_size() as u32;
        header.set_positions(0, size, size + header.data_size() as u32);

        let mut cursor = Cursor::new(Vec::new());
        header.write_bytes(&mut cursor)?;
        assert_eq!(cursor.get_ref().len() as u64, header.header_size());

        cursor.set_position(0);
        assert_eq!(DataSetHeader::from_reader(&mut cursor, true)?, header);

        cursor.set_position(0);
        let minimal = DataSetHeader::from_reader(&mut cursor, false)?;
        assert!(!minimal.is_complete());
        assert_eq!(minimal.name(), "acquired data");
        assert_eq!(minimal.col_cnt(), 0);
        assert_eq!(minimal.row_cnt(), 0);
        assert_eq!(minimal.data_start_pos(), header.data_start_pos());
        Ok(())
    }

    #[test]
    fn test_overlapping_offsets() -> Result<()> {
        let mut header = sample_header();
        let size = header.header_size() as u32;
        header.set_positions(0, size, size + 1);

        let mut cursor = Cursor::new(Vec::new());
        header.write_bytes(&mut cursor)?;
        cursor.set_position(0);
        assert!(matches!(
            DataSetHeader::from_reader(&mut cursor, true),
            Err(crate::Error::HeaderError(HeaderError::Format(_)))
        ));
        Ok(())
    }
}
