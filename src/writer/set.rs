use std::io::{Seek, SeekFrom, Write};

use super::WriteState;
use crate::error::{Result, WriteError};
use crate::header::{ColumnType, DataSetHeader};
use crate::io;
use crate::value::ColumnValue;

/// Writes one data set: its header, then its rows cell by cell
///
/// The next-data-set offset is written as a placeholder and patched by
/// [`Self::update_next_data_set_offset`] once every row has been written.
pub struct DataSetWriter<'a, W: Write + Seek> {
    inner: &'a mut W,
    header: &'a mut DataSetHeader,
    state: WriteState,

    /// Number of row data bytes written so far
    written: u64,

    /// Index of the next cell, counted across rows
    cell: usize,

    /// Scratch buffer for cell encoding
    buffer: Vec<u8>,
}
impl<'a, W: Write + Seek> DataSetWriter<'a, W> {
    pub(crate) fn new(inner: &'a mut W, header: &'a mut DataSetHeader) -> Self {
        Self {
            inner,
            header,
            state: WriteState::Pending,
            written: 0,
            cell: 0,
            buffer: Vec::new(),
        }
    }

    #[must_use]
    pub fn header(&self) -> &DataSetHeader {
        &*self.header
    }

    #[must_use]
    pub fn state(&self) -> WriteState {
        self.state
    }

    /// Writes the data set header at the current stream position
    ///
    /// The data start offset is computed from the header size; the stream is
    /// left at the first byte of row data.
    pub fn write_header(&mut self) -> Result<()> {
        self.state.require(&[WriteState::Pending], "pending")?;
        let header_start = self.inner.stream_position()?;
        let data_start = header_start + self.header.header_size();
        self.header.set_positions(
            io::to_u32(header_start)?,
            io::to_u32(data_start)?,
            0,
        );
        self.header.write_bytes(self.inner)?;
        log::trace!(
            "wrote header of data set '{}' at {header_start}, data at {data_start}",
            self.header.name()
        );
        self.state = WriteState::HeaderWritten;
        Ok(())
    }

    /// Checks the state and returns the type of the next cell
    fn next_column(&self) -> Result<ColumnType> {
        self.state.require(
            &[WriteState::HeaderWritten, WriteState::ContentWritten],
            "header written",
        )?;
        let cols = self.header.col_cnt();
        if cols == 0 {
            return Err(WriteError::UnexpectedDataSize {
                name: self.header.name().to_string(),
                expected: 0,
                got: self.written,
            }
            .into());
        }
        let kind = self.header.columns()[self.cell % cols].kind();
        let size = kind.byte_size() as u64;
        if self.written + size > self.header.data_size() {
            return Err(WriteError::UnexpectedDataSize {
                name: self.header.name().to_string(),
                expected: self.header.data_size(),
                got: self.written + size,
            }
            .into());
        }
        Ok(kind)
    }

    fn column_mismatch(&self, kind: ColumnType, found: &'static str) -> crate::Error {
        let cols = self.header.col_cnt();
        WriteError::ColumnTypeMismatch {
            name: self.header.columns()[self.cell % cols].name().to_string(),
            expected: kind.name(),
            found,
        }
        .into()
    }

    fn commit_cell(&mut self) -> Result<()> {
        self.inner.write_all(&self.buffer)?;
        self.written += self.buffer.len() as u64;
        self.cell += 1;
        self.state = WriteState::ContentWritten;
        Ok(())
    }

    /// Writes a numeric value into the next cell
    ///
    /// # Errors
    ///
    /// Returns an error if the header has not been written, the next cell's
    /// column holds another type, or every row has already been written
    pub fn write<T: ColumnValue>(&mut self, value: T) -> Result<()> {
        let kind = self.next_column()?;
        if kind != T::COLUMN {
            return Err(self.column_mismatch(kind, T::COLUMN.name()));
        }
        self.buffer.clear();
        value.extend_le(&mut self.buffer);
        self.commit_cell()
    }

    /// Writes a string into the next cell, which must be an ascii or unicode column
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let kind = self.next_column()?;
        if !kind.is_string() {
            return Err(self.column_mismatch(kind, "string"));
        }
        self.buffer = kind.encode_string(value)?;
        self.commit_cell()
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write(value)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write(value)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write(value)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write(value)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write(value)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write(value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write(value)
    }

    /// Patches the next-data-set offset with the current stream position
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::UnexpectedDataSize`] unless exactly the declared
    /// number of row data bytes has been written
    pub fn update_next_data_set_offset(&mut self) -> Result<()> {
        self.state.require(
            &[WriteState::HeaderWritten, WriteState::ContentWritten],
            "header written",
        )?;
        if self.written != self.header.data_size() {
            return Err(WriteError::UnexpectedDataSize {
                name: self.header.name().to_string(),
                expected: self.header.data_size(),
                got: self.written,
            }
            .into());
        }
        let end = self.inner.stream_position()?;
        let next = io::to_u32(end)?;
        self.header.set_next_set_pos(next);
        self.inner
            .seek(SeekFrom::Start(self.header.header_start_pos() + 4))?;
        io::write_u32(self.inner, next)?;
        self.inner.seek(SeekFrom::Start(end))?;
        self.state = WriteState::OffsetsPatched;
        Ok(())
    }
}
