use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use super::DataGroupWriter;
use crate::error::{Result, WriteError};
use crate::header::FileHeader;
use crate::io;

/// Writes a generic data file
///
/// The file header is written on construction. Data groups are then written
/// through [`DataGroupWriter`]s in index order; each group writes its data sets
/// through [`DataSetWriter`](super::DataSetWriter)s.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use calvin::{DataGroupHeader, DataSetHeader, FileHeader, GenericFileWriter, Result};
///
/// fn main() -> Result<()> {
///     let mut set = DataSetHeader::new("acquired data");
///     set.add_ushort_column("Pixel");
///     set.set_row_cnt(2);
///     let mut group = DataGroupHeader::new("First Data Cube");
///     group.add_data_set_hdr(set);
///     let mut header = FileHeader::new();
///     header.add_data_group_hdr(group);
///
///     let mut writer = GenericFileWriter::new(Cursor::new(Vec::new()), header)?;
///     let mut group_writer = writer.data_group_writer(0)?;
///     group_writer.write_header()?;
///     {
///         let mut set_writer = group_writer.data_set_writer(0)?;
///         set_writer.write_header()?;
///         set_writer.write_u16(0)?;
///         set_writer.write_u16(11)?;
///         set_writer.update_next_data_set_offset()?;
///     }
///     group_writer.update_next_data_group_pos()?;
///     let bytes = writer.into_inner()?.into_inner();
///     assert_eq!(bytes[0], 59);
///     Ok(())
/// }
/// ```
pub struct GenericFileWriter<W: Write + Seek> {
    inner: W,
    header: FileHeader,
}
impl GenericFileWriter<BufWriter<File>> {
    /// Creates the file at `path` and writes its header
    pub fn create<P: AsRef<Path>>(path: P, mut header: FileHeader) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        header.set_filename(path.as_ref());
        Self::new(BufWriter::new(file), header)
    }
}
impl<W: Write + Seek> GenericFileWriter<W> {
    /// Writes the file header to `inner`, which must be positioned at its start
    ///
    /// # Arguments
    ///
    /// * `inner` - The output stream
    /// * `header` - The complete header tree; group and data set headers are
    ///   filled with their offsets as they are written
    pub fn new(mut inner: W, mut header: FileHeader) -> Result<Self> {
        let start = inner.stream_position()?;
        if start != 0 {
            return Err(WriteError::InvalidState {
                expected: "stream at offset 0",
                found: "stream past its start",
            }
            .into());
        }
        header.set_first_group_pos(io::to_u32(header.header_size())?);
        header.set_declared_group_cnt(io::to_u32(header.data_group_cnt() as u64)?);
        header.write_bytes(&mut inner)?;
        log::debug!(
            "wrote file header with {} data groups",
            header.data_group_cnt()
        );
        Ok(Self { inner, header })
    }

    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Creates the writer for the data group at `index`
    pub fn data_group_writer(&mut self, index: usize) -> Result<DataGroupWriter<'_, W>> {
        let header = self
            .header
            .data_group_mut(index)
            .ok_or(WriteError::MissingDataGroup(index))?;
        Ok(DataGroupWriter::new(&mut self.inner, header))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn by_ref(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Flushes and returns the underlying stream
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.inner)
    }

    /// Flushes and returns the underlying stream together with the header tree
    ///
    /// The returned header carries the offsets assigned while writing.
    pub fn into_parts(mut self) -> Result<(W, FileHeader)> {
        self.flush()?;
        Ok((self.inner, self.header))
    }
}
