use std::io::{Read, Seek, Write};

use super::data_set::DataSetHeader;
use crate::error::Result;
use crate::io;

/// Header of a data group: a named, ordered list of data set headers
///
/// Group names are not required to be unique; lookup by index disambiguates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataGroupHeader {
    name: String,
    data_sets: Vec<DataSetHeader>,
    header_pos: u32,
    data_set_pos: u32,
    next_group_pos: u32,
    declared_set_cnt: u32,
}
impl DataGroupHeader {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
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

    pub fn add_data_set_hdr(&mut self, header: DataSetHeader) {
        self.data_sets.push(header);
    }

    /// Number of data set headers currently held
    #[must_use]
    pub fn data_set_cnt(&self) -> usize {
        self.data_sets.len()
    }

    /// Number of data sets declared in the file, or held when larger
    #[must_use]
    pub fn num_data_sets(&self) -> usize {
        (self.declared_set_cnt as usize).max(self.data_sets.len())
    }

    #[must_use]
    pub fn data_set(&self, index: usize) -> Option<&DataSetHeader> {
        self.data_sets.get(index)
    }

    pub fn data_set_mut(&mut self, index: usize) -> Option<&mut DataSetHeader> {
        self.data_sets.get_mut(index)
    }

    #[must_use]
    pub fn data_sets(&self) -> &[DataSetHeader] {
        &self.data_sets
    }

    /// Finds the first data set header with exactly this name
    #[must_use]
    pub fn find_data_set_header(&self, name: &str) -> Option<&DataSetHeader> {
        self.data_sets.iter().find(|h| h.name() == name)
    }

    #[must_use]
    pub fn find_data_set_index(&self, name: &str) -> Option<usize> {
        self.data_sets.iter().position(|h| h.name() == name)
    }

    /// Removes all data set headers
    pub fn clear(&mut self) {
        self.data_sets.clear();
        self.declared_set_cnt = 0;
    }

    /// File offset of this group header
    #[must_use]
    pub fn header_pos(&self) -> u64 {
        u64::from(self.header_pos)
    }

    /// File offset of the first data set header
    #[must_use]
    pub fn data_set_pos(&self) -> u64 {
        u64::from(self.data_set_pos)
    }

    /// File offset of the next group header, zero when there is none
    #[must_use]
    pub fn next_group_pos(&self) -> u64 {
        u64::from(self.next_group_pos)
    }

    pub(crate) fn set_positions(&mut self, header_pos: u32, data_set_pos: u32, next_group: u32) {
        self.header_pos = header_pos;
        self.data_set_pos = data_set_pos;
        self.next_group_pos = next_group;
    }

    pub(crate) fn set_next_group_pos(&mut self, pos: u32) {
        self.next_group_pos = pos;
    }

    pub(crate) fn replace_data_sets(&mut self, data_sets: Vec<DataSetHeader>) {
        self.data_sets = data_sets;
    }

    /// Number of bytes the group header occupies on disk
    #[must_use]
    pub fn header_size(&self) -> u64 {
        4 + 4 + 4 + io::string16_size(&self.name)
    }

    /// Reads the group header fields at the current stream position
    ///
    /// Data set headers are not read; the group holds no data sets afterwards
    /// but reports the declared count through [`Self::num_data_sets`].
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let header_pos = io::to_header_pos(reader.stream_position()?)?;
        let next_group_pos = io::read_u32(reader)?;
        let data_set_pos = io::read_u32(reader)?;
        let declared_set_cnt = io::read_u32(reader)?;
        let name = io::read_string16(reader)?;
        Ok(Self {
            name,
            data_sets: Vec::new(),
            header_pos,
            data_set_pos,
            next_group_pos,
            declared_set_cnt,
        })
    }

    /// Writes the group header with its stored offsets and the held data set count
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        io::write_u32(writer, self.next_group_pos)?;
        io::write_u32(writer, self.data_set_pos)?;
        io::write_u32(writer, io::to_u32(self.data_sets.len() as u64)?)?;
        io::write_string16(writer, &self.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_codec_without_data_sets() -> Result<()> {
        let mut group = DataGroupHeader::new("First Data Cube");
        group.add_data_set_hdr(DataSetHeader::new("acquired data"));
        group.add_data_set_hdr(DataSetHeader::new("more data"));
        let size = group.header_size() as u32;
        group.set_positions(0, size, 1000);

        let mut cursor = Cursor::new(Vec::new());
        group.write_bytes(&mut cursor)?;
        assert_eq!(cursor.get_ref().len() as u64, group.header_size());

        cursor.set_position(0);
        let read = DataGroupHeader::from_reader(&mut cursor)?;
        assert_eq!(read.name(), "First Data Cube");
        assert_eq!(read.data_set_cnt(), 0);
        assert_eq!(read.num_data_sets(), 2);
        assert_eq!(read.data_set_pos(), u64::from(size));
        assert_eq!(read.next_group_pos(), 1000);
        Ok(())
    }

    #[test]
    fn test_find() {
        let mut group = DataGroupHeader::new("g");
        group.add_data_set_hdr(DataSetHeader::new("a"));
        group.add_data_set_hdr(DataSetHeader::new("b"));
        assert_eq!(group.find_data_set_index("b"), Some(1));
        assert!(group.find_data_set_header("B").is_none());
        group.clear();
        assert_eq!(group.num_data_sets(), 0);
    }
}
