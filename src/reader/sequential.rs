use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

use super::header::read_data_set;
use crate::data::Locator;
use crate::error::{ReadError, Result};
use crate::header::{ColumnType, DataGroupHeader, DataSetHeader};
use crate::value::ColumnValue;

/// Sequential access to the data sets of one data group
pub struct DataGroupReader<'a> {
    stream: &'a mut BufReader<File>,
    header: DataGroupHeader,
}
impl<'a> DataGroupReader<'a> {
    pub(crate) fn new(stream: &'a mut BufReader<File>, header: DataGroupHeader) -> Self {
        Self { stream, header }
    }

    #[must_use]
    pub fn header(&self) -> &DataGroupHeader {
        &self.header
    }

    #[must_use]
    pub fn data_group_name(&self) -> &str {
        self.header.name()
    }

    #[must_use]
    pub fn data_set_cnt(&self) -> usize {
        self.header.data_set_cnt()
    }

    /// Creates a reader positioned at the first cell of a data set
    pub fn data_set_reader<'n>(&mut self, set: impl Into<Locator<'n>>) -> Result<DataSetReader<'_>> {
        let index = crate::data::data_set_index(&self.header, set.into())?;
        let mut header = self.header.data_sets()[index].clone();
        if !header.is_complete() {
            header = read_data_set(self.stream, header.header_start_pos(), true)?;
        }
        DataSetReader::new(self.stream, header)
    }
}

/// Reads the cells of a data set in storage order
///
/// Cells are visited row by row, column by column. Each typed read checks the
/// type of the column it lands on.
pub struct DataSetReader<'a> {
    stream: &'a mut BufReader<File>,
    header: DataSetHeader,

    /// Index of the next cell, counted across rows
    cell: usize,
}
impl<'a> DataSetReader<'a> {
    fn new(stream: &'a mut BufReader<File>, header: DataSetHeader) -> Result<Self> {
        stream.seek(SeekFrom::Start(header.data_start_pos()))?;
        Ok(Self {
            stream,
            header,
            cell: 0,
        })
    }

    #[must_use]
    pub fn header(&self) -> &DataSetHeader {
        &self.header
    }

    #[must_use]
    pub fn data_set_name(&self) -> &str {
        self.header.name()
    }

    /// Row and column of the next cell
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        match self.header.col_cnt() {
            0 => (0, 0),
            cols => (self.cell / cols, self.cell % cols),
        }
    }

    /// True once every cell has been read
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cell >= self.header.row_cnt() * self.header.col_cnt()
    }

    /// Type of the next cell, failing past the last row
    fn next_column(&self) -> Result<ColumnType> {
        let (row, col) = self.position();
        if self.is_done() {
            return Err(ReadError::RowIndexOutOfBounds {
                requested_index: row,
                max_index: self.header.row_cnt(),
            }
            .into());
        }
        self.header
            .column(col)
            .map(|c| c.kind())
            .ok_or_else(|| {
                ReadError::ColumnIndexOutOfBounds {
                    requested_index: col,
                    max_index: self.header.col_cnt(),
                }
                .into()
            })
    }

    fn read_cell(&mut self, size: usize) -> Result<Vec<u8>> {
        let mut cell = vec![0u8; size];
        self.stream.read_exact(&mut cell)?;
        self.cell += 1;
        Ok(cell)
    }

    /// Reads the next cell as a numeric value
    pub fn read<T: ColumnValue>(&mut self) -> Result<T> {
        let kind = self.next_column()?;
        if kind != T::COLUMN {
            return Err(ReadError::UnexpectedColumnType {
                expected: T::COLUMN.name(),
                found: kind.name(),
            }
            .into());
        }
        let cell = self.read_cell(kind.byte_size())?;
        Ok(T::from_le_slice(&cell))
    }

    /// Reads the next cell as a string
    pub fn read_string(&mut self) -> Result<String> {
        let kind = self.next_column()?;
        if !kind.is_string() {
            return Err(ReadError::UnexpectedColumnType {
                expected: "string",
                found: kind.name(),
            }
            .into());
        }
        let cell = self.read_cell(kind.byte_size())?;
        Ok(kind.decode_string(&cell).unwrap_or_default())
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.read()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read()
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read()
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read()
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read()
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read()
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read()
    }
}
