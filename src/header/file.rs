use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use byteorder::WriteBytesExt;

use super::data_group::DataGroupHeader;
use super::generic::GenericDataHeader;
use crate::error::{HeaderError, Result};
use crate::io;

/// Magic number identifying a generic data file
pub const MAGIC: u8 = 59;

/// Supported version of the generic data file format
pub const VERSION: u8 = 1;

/// Size of the prologue: magic, version, group count and first group offset
pub const SIZE_PROLOGUE: u64 = 1 + 1 + 4 + 4;

/// Root of the header tree
///
/// Holds the generic data header and the ordered data group headers of one
/// file. Constructed empty and populated either by the reader or by
/// application code before writing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileHeader {
    filename: Option<PathBuf>,
    generic: GenericDataHeader,
    groups: Vec<DataGroupHeader>,
    first_group_pos: u32,
    declared_group_cnt: u32,
}
impl FileHeader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, path: impl Into<PathBuf>) {
        self.filename = Some(path.into());
    }

    #[must_use]
    pub fn generic_data_hdr(&self) -> &GenericDataHeader {
        &self.generic
    }

    pub fn generic_data_hdr_mut(&mut self) -> &mut GenericDataHeader {
        &mut self.generic
    }

    pub fn set_generic_data_hdr(&mut self, header: GenericDataHeader) {
        self.generic = header;
    }

    pub fn add_data_group_hdr(&mut self, header: DataGroupHeader) {
        self.groups.push(header);
    }

    /// Number of data group headers currently held
    #[must_use]
    pub fn data_group_cnt(&self) -> usize {
        self.groups.len()
    }

    /// Number of data groups in the file, whether or not their headers are loaded
    #[must_use]
    pub fn num_data_groups(&self) -> usize {
        (self.declared_group_cnt as usize).max(self.groups.len())
    }

    #[must_use]
    pub fn data_group(&self, index: usize) -> Option<&DataGroupHeader> {
        self.groups.get(index)
    }

    pub fn data_group_mut(&mut self, index: usize) -> Option<&mut DataGroupHeader> {
        self.groups.get_mut(index)
    }

    #[must_use]
    pub fn data_groups(&self) -> &[DataGroupHeader] {
        &self.groups
    }

    /// Finds the first data group header with exactly this name
    #[must_use]
    pub fn find_data_group_header(&self, name: &str) -> Option<&DataGroupHeader> {
        self.groups.iter().find(|g| g.name() == name)
    }

    #[must_use]
    pub fn find_data_group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name() == name)
    }

    /// File offset of the first data group header
    #[must_use]
    pub fn first_group_pos(&self) -> u64 {
        u64::from(self.first_group_pos)
    }

    /// Removes all data group headers and forgets the declared group count
    pub fn clear(&mut self) {
        self.groups.clear();
        self.declared_group_cnt = 0;
    }

    /// Discards everything, including the file name and the generic header
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn set_first_group_pos(&mut self, pos: u32) {
        self.first_group_pos = pos;
    }

    pub(crate) fn set_declared_group_cnt(&mut self, count: u32) {
        self.declared_group_cnt = count;
    }

    pub(crate) fn replace_groups(&mut self, groups: Vec<DataGroupHeader>) {
        self.groups = groups;
    }

    /// Offset at which the first data group header is written
    #[must_use]
    pub fn header_size(&self) -> u64 {
        SIZE_PROLOGUE + self.generic.encoded_size()
    }

    /// Reads the prologue and the generic data header
    ///
    /// Data group headers are not read; [`Self::num_data_groups`] reports the
    /// declared count.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The magic number is not 59
    /// * The version is not supported
    /// * The stream ends before the generic data header is complete
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let magic = io::read_u8(reader)?;
        if magic != MAGIC {
            return Err(HeaderError::InvalidFileType(magic).into());
        }
        let version = io::read_u8(reader)?;
        if version != VERSION {
            return Err(HeaderError::InvalidVersion(version).into());
        }
        let declared_group_cnt = io::read_u32(reader)?;
        let first_group_pos = io::read_u32(reader)?;
        let generic = GenericDataHeader::from_reader(reader)?;
        Ok(Self {
            filename: None,
            generic,
            groups: Vec::new(),
            first_group_pos,
            declared_group_cnt,
        })
    }

    /// Writes the prologue and the generic data header
    ///
    /// The group count is the number of held group headers and the first group
    /// offset is the position right after the generic data header.
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(MAGIC)?;
        writer.write_u8(VERSION)?;
        io::write_u32(writer, io::to_u32(self.groups.len() as u64)?)?;
        io::write_u32(writer, io::to_u32(self.header_size())?)?;
        self.generic.write_bytes(writer)
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Cursor;

    fn sample() -> FileHeader {
        let mut header = FileHeader::new();
        let mut generic = GenericDataHeader::new("affymetrix-calvin-intensity");
        generic.set_file_id("test-dat-guid");
        header.set_generic_data_hdr(generic);
        header.add_data_group_hdr(DataGroupHeader::new("First Data Cube"));
        header.add_data_group_hdr(DataGroupHeader::new("Second Data Cube"));
        header
    }

    #[test]
    fn test_prologue() -> Result<()> {
        let header = sample();
        let mut cursor = Cursor::new(Vec::new());
        header.write_bytes(&mut cursor)?;
        assert_eq!(cursor.get_ref()[0], MAGIC);
        assert_eq!(cursor.get_ref()[1], VERSION);
        assert_eq!(cursor.get_ref().len() as u64, header.header_size());

        cursor.set_position(0);
        let read = FileHeader::from_reader(&mut cursor)?;
        assert_eq!(read.data_group_cnt(), 0);
        assert_eq!(read.num_data_groups(), 2);
        assert_eq!(read.first_group_pos(), header.header_size());
        assert_eq!(read.generic_data_hdr().file_id(), "test-dat-guid");
        Ok(())
    }

    #[test]
    fn test_invalid_magic_and_version() -> Result<()> {
        let mut cursor = Cursor::new(Vec::new());
        sample().write_bytes(&mut cursor)?;

        let mut bytes = cursor.get_ref().clone();
        bytes[0] = 60;
        assert!(matches!(
            FileHeader::from_reader(&mut Cursor::new(bytes)),
            Err(crate::Error::HeaderError(HeaderError::InvalidFileType(60)))
        ));

        let mut bytes = cursor.get_ref().clone();
        bytes[1] = 2;
        assert!(matches!(
            FileHeader::from_reader(&mut Cursor::new(bytes)),
            Err(crate::Error::HeaderError(HeaderError::InvalidVersion(2)))
        ));

        let bytes = cursor.get_ref()[..12].to_vec();
        assert!(matches!(
            FileHeader::from_reader(&mut Cursor::new(bytes)),
            Err(crate::Error::HeaderError(HeaderError::Truncated(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_lookup_and_clear() {
        let mut header = sample();
        assert_eq!(header.find_data_group_index("Second Data Cube"), Some(1));
        assert!(header.find_data_group_header("first data cube").is_none());
        header.clear();
        assert_eq!(header.data_group_cnt(), 0);
        assert_eq!(header.num_data_groups(), 0);
    }
}
