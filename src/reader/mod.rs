//! Reading generic data files
//!
//! [`GenericFileReader`] reads the header tree of a file into a
//! [`GenericData`] handle. It can also keep the file open and hand out
//! sequential [`DataGroupReader`]s and [`DataSetReader`]s that walk the row
//! data cell by cell.

mod header;
mod sequential;

pub use sequential::{DataGroupReader, DataSetReader};

pub(crate) use header::{
    locate_data_group, next_link, read_data_group, read_data_set, read_file_header,
    read_group_chain, GroupDepth,
};

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use crate::config::ReadMode;
use crate::data::{GenericData, Locator};
use crate::error::{ReadError, Result};
use crate::header::FileHeader;

/// Opens a data file for reading, rejecting anything that is not a regular file
pub(crate) fn open_file(path: &Path) -> Result<File> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ReadError::FileNotFound(path.to_path_buf()).into(),
        _ => crate::Error::from(e),
    })?;
    if !file.metadata()?.is_file() {
        return Err(ReadError::IncompatibleFile.into());
    }
    Ok(file)
}

/// Reader bound to the path of a generic data file
///
/// # Examples
///
/// ```no_run
/// use calvin::{GenericData, GenericFileReader, ReadMode, Result};
///
/// fn main() -> Result<()> {
///     let mut data = GenericData::new();
///     let reader = GenericFileReader::new("scan.dat");
///     reader.read_header(&mut data, ReadMode::MinimalDataGroupHeader)?;
///     for name in data.data_group_names()? {
///         println!("{name}: {} data sets", data.data_set_cnt(name.as_str())?);
///     }
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct GenericFileReader {
    filename: Option<PathBuf>,

    /// Open stream for sequential reads
    stream: Option<BufReader<File>>,

    /// Header tree read by [`Self::open`]
    header: FileHeader,
}
impl GenericFileReader {
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            filename: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn set_filename<P: AsRef<Path>>(&mut self, path: P) {
        self.close();
        self.filename = Some(path.as_ref().to_path_buf());
    }

    fn path(&self) -> Result<&Path> {
        self.filename
            .as_deref()
            .ok_or_else(|| ReadError::MissingFilename.into())
    }

    /// Reads the header tree of the file into `data`
    ///
    /// # Arguments
    ///
    /// * `data` - Handle receiving the header tree and the file name
    /// * `mode` - How much of the group and data set headers to read
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its header is invalid.
    /// `data` is left cleared in that case.
    pub fn read_header(&self, data: &mut GenericData, mode: ReadMode) -> Result<()> {
        let path = match self.path() {
            Ok(path) => path,
            Err(e) => {
                data.clear();
                return Err(e);
            }
        };
        let file = match open_file(path) {
            Ok(file) => file,
            Err(e) => {
                data.clear();
                return Err(e);
            }
        };
        data.read_header(&mut BufReader::new(file), mode)?;
        data.header_mut().set_filename(path);
        log::debug!(
            "read header of {} ({} data groups, {mode:?})",
            path.display(),
            data.data_group_cnt()
        );
        Ok(())
    }

    /// Reads the header tree into `data` and keeps the file open for sequential reads
    pub fn open(&mut self, data: &mut GenericData, mode: ReadMode) -> Result<()> {
        self.close();
        self.read_header(data, mode)?;
        let file = open_file(self.path()?)?;
        self.stream = Some(BufReader::new(file));
        self.header = data.header().clone();
        Ok(())
    }

    pub fn close(&mut self) {
        self.stream = None;
        self.header = FileHeader::default();
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Number of data groups in the open file
    #[must_use]
    pub fn data_group_cnt(&self) -> usize {
        self.header.num_data_groups()
    }

    /// Creates a sequential reader over a data group of the open file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not open or no group matches
    pub fn data_group_reader<'n>(
        &mut self,
        group: impl Into<Locator<'n>>,
    ) -> Result<DataGroupReader<'_>> {
        let group = group.into();
        let Some(stream) = self.stream.as_mut() else {
            return Err(ReadError::FileNotOpen.into());
        };

        let loaded = match group {
            Locator::Index(index) => self.header.data_group(index),
            Locator::Name(name) => self.header.find_data_group_header(name),
        };
        let header = if let Some(header) = loaded {
            header.clone()
        } else {
            let index = match group {
                Locator::Index(index) => index,
                Locator::Name(name) => {
                    let count = self.header.num_data_groups();
                    read_group_chain(stream, &self.header, count, GroupDepth::HeaderOnly)?
                        .iter()
                        .position(|g| g.name() == name)
                        .ok_or_else(|| ReadError::DataGroupNotFound(name.to_string()))?
                }
            };
            locate_data_group(stream, &self.header, index)?
        };
        Ok(DataGroupReader::new(stream, header))
    }
}
