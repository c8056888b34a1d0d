use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::access::{Accessor, DataAccessWindow, RowAccessor, StreamDataAccessor};
use crate::config::AccessConfig;
use crate::error::{ReadError, Result};
use crate::header::{ColumnType, DataSetHeader};
use crate::reader::{open_file, read_data_set};
use crate::value::{decode_packed, ColumnValue};

/// Lifecycle of a data set cursor
enum CursorState {
    Closed,
    Open(Accessor),
    Deleted,
}

/// A row/column cursor over one data set
///
/// Each cursor owns its own file handle and access strategy, so several
/// cursors over the same data set never interfere. A cursor must be opened
/// before data can be read.
///
/// # Examples
///
/// ```no_run
/// use calvin::{GenericData, GenericFileReader, ReadMode, Result};
///
/// fn main() -> Result<()> {
///     let mut data = GenericData::new();
///     GenericFileReader::new("scan.dat").read_header(&mut data, ReadMode::FullDataGroupHeader)?;
///
///     let mut set = data.data_set("First Data Cube", "acquired data")?;
///     set.open()?;
///     let pixel: u16 = set.get_data(37, 0)?;
///     println!("{pixel}");
///     set.close();
///     Ok(())
/// }
/// ```
pub struct DataSet {
    path: PathBuf,
    header: DataSetHeader,
    config: AccessConfig,
    state: CursorState,
}
impl DataSet {
    pub(crate) fn new(path: PathBuf, header: DataSetHeader, config: AccessConfig) -> Self {
        Self {
            path,
            header,
            config,
            state: CursorState::Closed,
        }
    }

    #[must_use]
    pub fn header(&self) -> &DataSetHeader {
        &self.header
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.header.name()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.header.row_cnt()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.header.col_cnt()
    }

    #[must_use]
    pub fn bytes_per_row(&self) -> usize {
        self.header.row_size() as usize
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, CursorState::Open(_))
    }

    /// True when the open cursor reads through a memory-mapped window
    #[must_use]
    pub fn is_memory_mapped(&self) -> bool {
        match &self.state {
            CursorState::Open(accessor) => accessor.is_memory_mapped(),
            _ => false,
        }
    }

    /// Opens the cursor and binds it to the configured access strategy
    ///
    /// A header that was read in minimal mode is read in full first. Opening
    /// an open cursor does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The cursor was deleted
    /// * The file cannot be opened or is shorter than the header declares
    /// * The header cannot be read
    /// * The initial mapping cannot be established
    pub fn open(&mut self) -> Result<()> {
        match self.state {
            CursorState::Deleted => return Err(ReadError::DataSetDeleted.into()),
            CursorState::Open(_) => return Ok(()),
            CursorState::Closed => {}
        }

        let file = open_file(&self.path)?;
        if !self.header.is_complete() {
            log::debug!("reading full header of data set '{}'", self.header.name());
            let mut reader = BufReader::new(&file);
            self.header = read_data_set(&mut reader, self.header.header_start_pos(), true)?;
        }

        let file_len = file.metadata()?.len();
        let data_start = self.header.data_start_pos();
        let data_size = self.header.data_size();
        if file_len < data_start + data_size {
            return Err(ReadError::FileTruncation(file_len).into());
        }

        let accessor = if self.config.memory_mapping() {
            Accessor::Window(DataAccessWindow::new(
                file,
                data_start,
                data_size,
                self.config.window_cap(),
            )?)
        } else {
            Accessor::Stream(StreamDataAccessor::new(
                file,
                data_start,
                data_size,
                self.config.preload(),
            )?)
        };
        self.state = CursorState::Open(accessor);
        Ok(())
    }

    /// Releases the file handle and any mapping; closing twice is harmless
    pub fn close(&mut self) {
        if let CursorState::Open(_) = self.state {
            self.state = CursorState::Closed;
        }
    }

    /// Closes the cursor and makes it unusable; deleting twice is harmless
    pub fn delete(&mut self) {
        self.state = CursorState::Deleted;
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        matches!(self.state, CursorState::Deleted)
    }

    fn accessor(&mut self) -> Result<&mut Accessor> {
        match &mut self.state {
            CursorState::Open(accessor) => Ok(accessor),
            CursorState::Closed => Err(ReadError::DataSetNotOpen.into()),
            CursorState::Deleted => Err(ReadError::DataSetDeleted.into()),
        }
    }

    /// Checks state and bounds, returning the type of the addressed column
    fn check_bounds(&self, row: usize, col: usize) -> Result<ColumnType> {
        match self.state {
            CursorState::Open(_) => {}
            CursorState::Closed => return Err(ReadError::DataSetNotOpen.into()),
            CursorState::Deleted => return Err(ReadError::DataSetDeleted.into()),
        }
        let Some(column) = self.header.column(col) else {
            return Err(ReadError::ColumnIndexOutOfBounds {
                requested_index: col,
                max_index: self.cols(),
            }
            .into());
        };
        if row >= self.rows() {
            return Err(ReadError::RowIndexOutOfBounds {
                requested_index: row,
                max_index: self.rows(),
            }
            .into());
        }
        Ok(column.kind())
    }

    /// Verifies that the cursor is open, that the cell exists and that its column has type `kind`
    ///
    /// String columns match on their encoding only; the width is not compared.
    pub fn check_row_column_and_type(&self, row: usize, col: usize, kind: ColumnType) -> Result<()> {
        let found = self.check_bounds(row, col)?;
        if found.tag() != kind.tag() {
            return Err(ReadError::UnexpectedColumnType {
                expected: kind.name(),
                found: found.name(),
            }
            .into());
        }
        Ok(())
    }

    /// Offset of a cell relative to the start of the row data
    fn cell_offset(&self, row: usize, col: usize) -> u64 {
        row as u64 * self.header.row_size() + self.header.column_offset(col)
    }

    /// Reads a single numeric value
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor is not open, the cell is out of range or
    /// the column does not hold values of type `T`
    pub fn get_data<T: ColumnValue>(&mut self, row: usize, col: usize) -> Result<T> {
        self.check_row_column_and_type(row, col, T::COLUMN)?;
        let offset = self.cell_offset(row, col);
        let bytes = self.accessor()?.read_at(offset, std::mem::size_of::<T>())?;
        Ok(T::from_le_slice(bytes))
    }

    /// Reads a single string value from an ascii or unicode column
    pub fn get_string(&mut self, row: usize, col: usize) -> Result<String> {
        let kind = self.check_bounds(row, col)?;
        if !kind.is_string() {
            return Err(ReadError::UnexpectedColumnType {
                expected: "string",
                found: kind.name(),
            }
            .into());
        }
        let offset = self.cell_offset(row, col);
        let cell = self.accessor()?.read_at(offset, kind.byte_size())?;
        Ok(kind.decode_string(cell).unwrap_or_default())
    }

    /// Reads up to `count` values of a column starting at `start_row` into `out`
    ///
    /// `out` is cleared first. Fewer than `count` values are returned when the
    /// data set ends before.
    pub fn get_data_vec<T: ColumnValue>(
        &mut self,
        col: usize,
        start_row: usize,
        count: usize,
        out: &mut Vec<T>,
    ) -> Result<()> {
        self.check_row_column_and_type(start_row, col, T::COLUMN)?;
        let available = count.min(self.rows() - start_row);
        out.clear();
        out.resize(available, T::default());
        self.read_column(col, start_row, out)
    }

    /// Fills `buffer` with consecutive values of a column starting at `start_row`
    ///
    /// # Returns
    ///
    /// The number of rows read, which is less than the buffer length when the
    /// data set ends first
    pub fn get_data_raw<T: ColumnValue>(
        &mut self,
        col: usize,
        start_row: usize,
        buffer: &mut [T],
    ) -> Result<usize> {
        self.check_row_column_and_type(start_row, col, T::COLUMN)?;
        let available = buffer.len().min(self.rows() - start_row);
        self.read_column(col, start_row, &mut buffer[..available])?;
        Ok(available)
    }

    /// Reads up to `count` strings of a column starting at `start_row` into `out`
    pub fn get_string_vec(
        &mut self,
        col: usize,
        start_row: usize,
        count: usize,
        out: &mut Vec<String>,
    ) -> Result<()> {
        out.clear();
        self.check_bounds(start_row, col)?;
        let available = count.min(self.rows() - start_row);
        for row in start_row..start_row + available {
            out.push(self.get_string(row, col)?);
        }
        Ok(())
    }

    /// Reads `out.len()` values of one column, starting at `start_row`
    ///
    /// Rows are fetched in blocks no larger than the window cap. When a single
    /// row is larger than the cap only the addressed cells are fetched.
    fn read_column<T: ColumnValue>(&mut self, col: usize, start_row: usize, out: &mut [T]) -> Result<()> {
        let row_size = self.header.row_size() as usize;
        let col_offset = self.header.column_offset(col) as usize;
        let size = std::mem::size_of::<T>();
        let cap = self.config.window_cap();
        let accessor = self.accessor()?;

        if row_size > cap {
            for (i, value) in out.iter_mut().enumerate() {
                let offset = ((start_row + i) * row_size + col_offset) as u64;
                *value = T::from_le_slice(accessor.read_at(offset, size)?);
            }
            return Ok(());
        }

        let rows_per_block = cap / row_size;
        for (block, chunk) in out.chunks_mut(rows_per_block).enumerate() {
            let first_row = start_row + block * rows_per_block;
            let bytes = accessor.read_at((first_row * row_size) as u64, chunk.len() * row_size)?;
            if row_size == size {
                decode_packed(bytes, chunk);
            } else {
                chunk
                    .iter_mut()
                    .zip(bytes.chunks_exact(row_size))
                    .for_each(|(v, row)| *v = T::from_le_slice(&row[col_offset..col_offset + size]));
            }
        }
        Ok(())
    }
}
