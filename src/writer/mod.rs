//! Writing generic data files
//!
//! Writing is a two-pass affair per structure: a header is written with a
//! placeholder for the offset of whatever follows it, the content is written,
//! and the offset is patched once the content's end is known.
//!
//! ```text
//! GenericFileWriter::new          file header
//!   DataGroupWriter::write_header       group header, next group = 0
//!     DataSetWriter::write_header       data set header, next data set = 0
//!     DataSetWriter::write_*            row data
//!     DataSetWriter::update_next_data_set_offset
//!   DataGroupWriter::update_next_data_group_pos
//! ```

mod file;
mod group;
mod set;
mod updater;

pub use file::GenericFileWriter;
pub use group::DataGroupWriter;
pub use set::DataSetWriter;
pub use updater::{update_file, GenericDataHeaderUpdater};

use crate::error::{Result, WriteError};

/// Progress of a group or data set writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    /// Nothing written yet
    Pending,
    /// Header written with a placeholder offset
    HeaderWritten,
    /// Some row data written
    ContentWritten,
    /// Placeholder offset replaced with the real one
    OffsetsPatched,
}
impl WriteState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::HeaderWritten => "header written",
            Self::ContentWritten => "content written",
            Self::OffsetsPatched => "offsets patched",
        }
    }

    /// Fails unless the state is one of `allowed`
    fn require(self, allowed: &[Self], expected: &'static str) -> Result<()> {
        if allowed.contains(&self) {
            Ok(())
        } else {
            Err(WriteError::InvalidState {
                expected,
                found: self.name(),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::header::{DataGroupHeader, DataSetHeader, FileHeader};
    use crate::reader::{read_data_group, read_file_header, GroupDepth};
    use crate::ReadMode;
    use std::io::Cursor;

    fn two_set_header() -> FileHeader {
        let mut first = DataSetHeader::new("pixels");
        first.add_ushort_column("Pixel");
        first.add_ascii_column("Probe", 6);
        first.set_row_cnt(3);
        let mut second = DataSetHeader::new("empty");
        second.add_int_column("a");
        second.add_float_column("b");

        let mut group = DataGroupHeader::new("First Data Cube");
        group.add_data_set_hdr(first);
        group.add_data_set_hdr(second);
        let mut header = FileHeader::new();
        header.add_data_group_hdr(group);
        header.add_data_group_hdr(DataGroupHeader::new("Empty Group"));
        header
    }

    fn write_all(header: FileHeader) -> Result<(Vec<u8>, FileHeader)> {
        let mut writer = GenericFileWriter::new(Cursor::new(Vec::new()), header)?;
        {
            let mut group = writer.data_group_writer(0)?;
            group.write_header()?;
            {
                let mut set = group.data_set_writer(0)?;
                set.write_header()?;
                for row in 0..3u16 {
                    set.write_u16(row * 11)?;
                    set.write_string(&format!("p{row}"))?;
                }
                set.update_next_data_set_offset()?;
            }
            {
                let mut set = group.data_set_writer(1)?;
                set.write_header()?;
                set.update_next_data_set_offset()?;
            }
            group.update_next_data_group_pos()?;
        }
        {
            let mut group = writer.data_group_writer(1)?;
            group.write_header()?;
            group.update_next_data_group_pos()?;
        }
        let (cursor, header) = writer.into_parts()?;
        Ok((cursor.into_inner(), header))
    }

    #[test]
    fn test_offsets_are_patched() -> Result<()> {
        let (bytes, written) = write_all(two_set_header())?;
        let mut cursor = Cursor::new(bytes);
        let read = read_file_header(&mut cursor, ReadMode::FullDataGroupHeader)?;
        assert_eq!(read.data_group_cnt(), 2);
        assert_eq!(
            read.data_groups()[0].data_sets(),
            written.data_groups()[0].data_sets()
        );

        let group = read.data_groups()[0].clone();
        let pixels = &group.data_sets()[0];
        let empty = &group.data_sets()[1];
        assert_eq!(pixels.next_set_pos(), empty.header_start_pos());
        assert_eq!(empty.next_set_pos(), empty.data_start_pos());
        assert_eq!(group.next_group_pos(), read.data_groups()[1].header_pos());
        assert_eq!(
            read.data_groups()[1].next_group_pos(),
            cursor.get_ref().len() as u64
        );

        let group = read_data_group(&mut cursor, group.header_pos(), GroupDepth::HeaderOnly)?;
        assert_eq!(group.data_set_cnt(), 0);
        assert_eq!(group.num_data_sets(), 2);
        Ok(())
    }

    #[test]
    fn test_invalid_transitions() -> Result<()> {
        let mut writer = GenericFileWriter::new(Cursor::new(Vec::new()), two_set_header())?;
        let mut group = writer.data_group_writer(0)?;
        assert!(group.data_set_writer(0).is_err());
        assert!(group.update_next_data_group_pos().is_err());
        group.write_header()?;
        assert!(group.write_header().is_err());
        assert!(group.data_set_writer(5).is_err());

        let mut set = group.data_set_writer(0)?;
        assert!(set.write_u16(1).is_err());
        set.write_header()?;
        assert!(matches!(
            set.write_f32(1.0),
            Err(crate::Error::WriteError(WriteError::ColumnTypeMismatch { .. }))
        ));
        set.write_u16(1)?;
        assert!(set.write_string("far too long").is_err());
        set.write_string("abc")?;
        assert_eq!(set.state(), WriteState::ContentWritten);
        assert!(matches!(
            set.update_next_data_set_offset(),
            Err(crate::Error::WriteError(WriteError::UnexpectedDataSize { .. }))
        ));
        Ok(())
    }

    #[test]
    fn test_writes_past_declared_rows() -> Result<()> {
        let mut writer = GenericFileWriter::new(Cursor::new(Vec::new()), two_set_header())?;
        let mut group = writer.data_group_writer(0)?;
        group.write_header()?;
        let mut set = group.data_set_writer(1)?;
        set.write_header()?;
        assert!(set.write_i32(1).is_err());
        set.update_next_data_set_offset()?;
        assert_eq!(set.state(), WriteState::OffsetsPatched);
        Ok(())
    }
}
