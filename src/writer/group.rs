use std::io::{Seek, SeekFrom, Write};

use super::{DataSetWriter, WriteState};
use crate::error::{Result, WriteError};
use crate::header::DataGroupHeader;
use crate::io;

/// Writes one data group header and hands out writers for its data sets
pub struct DataGroupWriter<'a, W: Write + Seek> {
    inner: &'a mut W,
    header: &'a mut DataGroupHeader,
    state: WriteState,
}
impl<'a, W: Write + Seek> DataGroupWriter<'a, W> {
    pub(crate) fn new(inner: &'a mut W, header: &'a mut DataGroupHeader) -> Self {
        Self {
            inner,
            header,
            state: WriteState::Pending,
        }
    }

    #[must_use]
    pub fn header(&self) -> &DataGroupHeader {
        &*self.header
    }

    #[must_use]
    pub fn state(&self) -> WriteState {
        self.state
    }

    /// Writes the group header at the current stream position
    ///
    /// The first data set is expected right after the group header; the next
    /// group offset is a placeholder until [`Self::update_next_data_group_pos`].
    pub fn write_header(&mut self) -> Result<()> {
        self.state.require(&[WriteState::Pending], "pending")?;
        let pos = self.inner.stream_position()?;
        let data_set_pos = pos + self.header.header_size();
        self.header
            .set_positions(io::to_u32(pos)?, io::to_u32(data_set_pos)?, 0);
        self.header.write_bytes(self.inner)?;
        log::trace!("wrote header of data group '{}' at {pos}", self.header.name());
        self.state = WriteState::HeaderWritten;
        Ok(())
    }

    /// Creates the writer for the data set at `index`
    ///
    /// Data sets must be written in index order, each one completely before
    /// the next.
    pub fn data_set_writer(&mut self, index: usize) -> Result<DataSetWriter<'_, W>> {
        self.state
            .require(&[WriteState::HeaderWritten], "header written")?;
        let header = self
            .header
            .data_set_mut(index)
            .ok_or(WriteError::MissingDataSet(index))?;
        Ok(DataSetWriter::new(&mut *self.inner, header))
    }

    /// Patches the next-group offset with the current stream position
    pub fn update_next_data_group_pos(&mut self) -> Result<()> {
        self.state
            .require(&[WriteState::HeaderWritten], "header written")?;
        let end = self.inner.stream_position()?;
        let next = io::to_u32(end)?;
        self.header.set_next_group_pos(next);
        self.inner.seek(SeekFrom::Start(self.header.header_pos()))?;
        io::write_u32(self.inner, next)?;
        self.inner.seek(SeekFrom::Start(end))?;
        self.state = WriteState::OffsetsPatched;
        Ok(())
    }
}
