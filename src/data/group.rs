use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::{DataSet, Locator};
use crate::config::AccessConfig;
use crate::error::{ReadError, Result};
use crate::header::{DataGroupHeader, DataSetHeader};
use crate::reader::{open_file, read_data_set};

/// A data group of an open file, vending cursors over its data sets
pub struct DataGroup {
    path: PathBuf,
    header: DataGroupHeader,
    config: AccessConfig,
}
impl DataGroup {
    pub(crate) fn new(path: PathBuf, header: DataGroupHeader, config: AccessConfig) -> Self {
        Self {
            path,
            header,
            config,
        }
    }

    #[must_use]
    pub fn header(&self) -> &DataGroupHeader {
        &self.header
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.header.name()
    }

    #[must_use]
    pub fn data_set_cnt(&self) -> usize {
        self.header.data_set_cnt()
    }

    #[must_use]
    pub fn data_set_names(&self) -> Vec<String> {
        self.header
            .data_sets()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    /// Creates a closed cursor over a data set of this group
    ///
    /// A data set header held in minimal form is read in full first.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::DataSetNotFound`] when no data set matches
    pub fn data_set<'n>(&self, set: impl Into<Locator<'n>>) -> Result<DataSet> {
        let index = data_set_index(&self.header, set.into())?;
        let header = complete_data_set_header(&self.path, &self.header.data_sets()[index])?;
        Ok(DataSet::new(self.path.clone(), header, self.config))
    }
}

/// Returns the full form of a data set header, reading it from `path` if needed
pub(crate) fn complete_data_set_header(path: &Path, header: &DataSetHeader) -> Result<DataSetHeader> {
    if header.is_complete() {
        return Ok(header.clone());
    }
    log::debug!("reading full header of data set '{}'", header.name());
    let mut reader = BufReader::new(open_file(path)?);
    read_data_set(&mut reader, header.header_start_pos(), true)
}

/// Resolves the position of a data set within a group
pub(crate) fn data_set_index(group: &DataGroupHeader, set: Locator<'_>) -> Result<usize> {
    let found = match set {
        Locator::Index(index) => (index < group.data_set_cnt()).then_some(index),
        Locator::Name(name) => group.find_data_set_index(name),
    };
    found.ok_or_else(|| ReadError::DataSetNotFound(set.to_string()).into())
}
