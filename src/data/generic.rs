use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use super::{complete_data_set_header, data_set_index, DataGroup, DataSet, Locator};
use crate::config::{AccessConfig, ReadMode};
use crate::error::{ReadError, Result};
use crate::header::{DataGroupHeader, DataSetHeader, FileHeader};
use crate::reader::{next_link, open_file, read_data_group, read_file_header, GroupDepth};

/// File type identifier of an array parent header
pub const ARRAY_TYPE_IDENTIFIER: &str = "affymetrix-calvin-array";

/// Name of the array identifier parameter in an array parent header
pub const ARRAY_ID_PARAM_NAME: &str = "affymetrix-array-id";

/// Name of the array type parameter
pub const ARRAY_TYPE_PARAM_NAME: &str = "affymetrix-array-type";

/// Name of the array barcode parameter
pub const ARRAY_BARCODE_PARAM_NAME: &str = "affymetrix-array-barcode";

/// Top-level handle over a generic data file
///
/// Holds the header tree read from a file together with the access
/// configuration handed to every [`DataSet`] created from it. Data group
/// headers that were not read with the file header are read on demand, so
/// the lookup methods take `&mut self`.
#[derive(Debug, Clone, Default)]
pub struct GenericData {
    header: FileHeader,
    config: AccessConfig,
    mode: ReadMode,
}
impl GenericData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut FileHeader {
        &mut self.header
    }

    /// The mode used by the last header read
    #[must_use]
    pub fn read_mode(&self) -> ReadMode {
        self.mode
    }

    #[must_use]
    pub fn access_config(&self) -> AccessConfig {
        self.config
    }

    pub fn set_access_config(&mut self, config: AccessConfig) {
        self.config = config;
    }

    /// Selects memory-mapped windows (`true`) or stream reads for new data sets
    pub fn use_memory_mapping(&mut self, value: bool) {
        self.config = self.config.use_memory_mapping(value);
    }

    /// Asks stream-based data sets to load their whole row data on open
    pub fn load_entire_data_set_hint(&mut self, value: bool) {
        self.config = self.config.load_entire_data_set(value);
    }

    /// Caps the size of a single mapped window
    pub fn max_window_bytes(&mut self, value: usize) {
        self.config = self.config.max_window_bytes(value);
    }

    /// Reads the header tree from a stream
    ///
    /// Any previous content is discarded. On failure the handle is left
    /// cleared. The file name is not known to a stream, so data sets can only
    /// be created after [`FileHeader::set_filename`].
    pub fn read_header<R: Read + Seek>(&mut self, reader: &mut R, mode: ReadMode) -> Result<()> {
        match read_file_header(reader, mode) {
            Ok(header) => {
                self.header = header;
                self.mode = mode;
                Ok(())
            }
            Err(e) => {
                self.header.reset();
                Err(e)
            }
        }
    }

    /// Discards the header tree
    pub fn clear(&mut self) {
        self.header.reset();
    }

    fn path(&self) -> Result<PathBuf> {
        self.header
            .filename()
            .map(Path::to_path_buf)
            .ok_or_else(|| ReadError::MissingFilename.into())
    }

    #[must_use]
    pub fn file_identifier(&self) -> &str {
        self.header.generic_data_hdr().file_id()
    }

    #[must_use]
    pub fn file_type_identifier(&self) -> &str {
        self.header.generic_data_hdr().file_type_id()
    }

    /// File identifier of the array file this file was derived from
    #[must_use]
    pub fn array_file_identifier(&self) -> Option<&str> {
        self.header
            .generic_data_hdr()
            .find_ancestor(ARRAY_TYPE_IDENTIFIER)
            .map(|h| h.file_id())
    }

    /// Identifier of the array this file was derived from
    #[must_use]
    pub fn array_identifier(&self) -> Option<String> {
        let param = self
            .header
            .generic_data_hdr()
            .find_ancestor(ARRAY_TYPE_IDENTIFIER)?
            .find_name_val_param(ARRAY_ID_PARAM_NAME)?;
        param.value_ascii().or_else(|_| param.value_text()).ok()
    }

    /// Number of data groups in the file, in every read mode
    #[must_use]
    pub fn data_group_cnt(&self) -> usize {
        self.header.num_data_groups()
    }

    /// Reads group headers following the last loaded one until `count` are held
    ///
    /// A chain that ends early is truncated with a warning, the same as when
    /// the group headers are read with the file header.
    fn load_groups(&mut self, count: usize) -> Result<()> {
        let loaded = self.header.data_group_cnt();
        if loaded >= count {
            return Ok(());
        }
        let mut reader = BufReader::new(open_file(&self.path()?)?);
        let mut pos = self
            .header
            .data_groups()
            .last()
            .map_or(self.header.first_group_pos(), DataGroupHeader::next_group_pos);
        for index in loaded..count {
            if pos == 0 {
                log::warn!("group chain ends after {index} of {count} declared data groups");
                self.header.set_declared_group_cnt(index as u32);
                break;
            }
            log::debug!("reading data group header {index} at {pos}");
            let group = read_data_group(&mut reader, pos, GroupDepth::Full)?;
            if index + 1 < count {
                pos = next_link(pos, group.next_group_pos(), "data group")?;
            }
            self.header.add_data_group_hdr(group);
        }
        Ok(())
    }

    fn group_index(&mut self, group: Locator<'_>) -> Result<usize> {
        match group {
            Locator::Index(index) => {
                if index >= self.header.num_data_groups() {
                    return Err(ReadError::DataGroupNotFound(group.to_string()).into());
                }
                self.load_groups(index + 1)?;
                Ok(index)
            }
            Locator::Name(name) => {
                if let Some(index) = self.header.find_data_group_index(name) {
                    return Ok(index);
                }
                self.load_groups(self.header.num_data_groups())?;
                self.header
                    .find_data_group_index(name)
                    .ok_or_else(|| ReadError::DataGroupNotFound(name.to_string()).into())
            }
        }
    }

    fn group_header(&self, index: usize) -> Result<&DataGroupHeader> {
        self.header
            .data_group(index)
            .ok_or_else(|| ReadError::DataGroupNotFound(format!("index {index}")).into())
    }

    /// Names of all data groups, reading group headers when needed
    pub fn data_group_names(&mut self) -> Result<Vec<String>> {
        self.load_groups(self.header.num_data_groups())?;
        Ok(self
            .header
            .data_groups()
            .iter()
            .map(|g| g.name().to_string())
            .collect())
    }

    /// Creates a data group handle by index or name
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::DataGroupNotFound`] if no group matches
    pub fn data_group<'n>(&mut self, group: impl Into<Locator<'n>>) -> Result<DataGroup> {
        let index = self.group_index(group.into())?;
        let path = self.path()?;
        let header = self.group_header(index)?.clone();
        Ok(DataGroup::new(path, header, self.config))
    }

    /// Creates a data group handle for the group header stored at `pos`
    pub fn data_group_at_pos(&mut self, pos: u64) -> Result<DataGroup> {
        let path = self.path()?;
        if let Some(header) = self
            .header
            .data_groups()
            .iter()
            .find(|g| g.header_pos() == pos)
        {
            return Ok(DataGroup::new(path, header.clone(), self.config));
        }

        let file = open_file(&path)?;
        let file_len = file.metadata()?.len();
        if pos < self.header.first_group_pos() || pos >= file_len {
            return Err(ReadError::DataGroupNotFound(format!("file position {pos}")).into());
        }
        let header = read_data_group(&mut BufReader::new(file), pos, GroupDepth::Full)?;
        Ok(DataGroup::new(path, header, self.config))
    }

    /// Number of data sets in a group
    pub fn data_set_cnt<'n>(&mut self, group: impl Into<Locator<'n>>) -> Result<usize> {
        let index = self.group_index(group.into())?;
        Ok(self.group_header(index)?.data_set_cnt())
    }

    /// Names of the data sets in a group
    pub fn data_set_names<'n>(&mut self, group: impl Into<Locator<'n>>) -> Result<Vec<String>> {
        let index = self.group_index(group.into())?;
        Ok(self
            .group_header(index)?
            .data_sets()
            .iter()
            .map(|s| s.name().to_string())
            .collect())
    }

    /// Creates a closed cursor over a data set
    ///
    /// Group and data set can each be given by index or by name. A data set
    /// header held in minimal form is read in full and kept.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::DataGroupNotFound`] or [`ReadError::DataSetNotFound`]
    /// when the lookup fails
    pub fn data_set<'g, 's>(
        &mut self,
        group: impl Into<Locator<'g>>,
        set: impl Into<Locator<'s>>,
    ) -> Result<DataSet> {
        let group_index = self.group_index(group.into())?;
        let set_index = data_set_index(self.group_header(group_index)?, set.into())?;
        let path = self.path()?;

        let held = &self.group_header(group_index)?.data_sets()[set_index];
        let header = complete_data_set_header(&path, held)?;
        if !held.is_complete() {
            if let Some(slot) = self
                .header
                .data_group_mut(group_index)
                .and_then(|g| g.data_set_mut(set_index))
            {
                *slot = header.clone();
            }
        }
        Ok(DataSet::new(path, header, self.config))
    }

    /// Finds a loaded data group header by name
    #[must_use]
    pub fn find_data_group_header(&self, name: &str) -> Option<&DataGroupHeader> {
        self.header.find_data_group_header(name)
    }

    /// Finds a loaded data set header by group and data set name
    #[must_use]
    pub fn find_data_set_header(&self, group: &str, set: &str) -> Option<&DataSetHeader> {
        self.header
            .find_data_group_header(group)?
            .find_data_set_header(set)
    }
}
