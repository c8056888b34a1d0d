use std::path::PathBuf;

/// Custom Result type for calvin operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the calvin library, encompassing all possible error cases
/// that can occur while reading, accessing or writing generic data files.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Errors related to parsing and validating the header tree
    HeaderError(#[from] HeaderError),
    /// Errors that occur while locating or reading data
    ReadError(#[from] ReadError),
    /// Errors that occur during write operations
    WriteError(#[from] WriteError),
    /// Errors raised by typed parameter access
    ParameterError(#[from] ParameterError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
    /// Generic errors that can occur in any part of the system
    AnyhowError(#[from] anyhow::Error),
}
impl Error {
    /// Checks if the error reports a missing data group
    #[must_use]
    pub fn is_data_group_not_found(&self) -> bool {
        matches!(self, Self::ReadError(ReadError::DataGroupNotFound(_)))
    }

    /// Checks if the error reports a missing data set
    #[must_use]
    pub fn is_data_set_not_found(&self) -> bool {
        matches!(self, Self::ReadError(ReadError::DataSetNotFound(_)))
    }

    /// Checks if the error reports a row or column outside the declared bounds
    #[must_use]
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::ReadError(
                ReadError::RowIndexOutOfBounds { .. } | ReadError::ColumnIndexOutOfBounds { .. }
            )
        )
    }
}

/// Errors specific to processing and validating the header tree
#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    /// The magic number at the start of the file does not identify a generic data file
    ///
    /// # Arguments
    /// * `u8` - The magic number that was found
    #[error("Invalid file type, magic number: {0}")]
    InvalidFileType(u8),

    /// The version in the file prologue is not supported by this reader
    ///
    /// # Arguments
    /// * `u8` - The unsupported version number that was found
    #[error("Invalid file version: {0}")]
    InvalidVersion(u8),

    /// The stream ended before a complete header structure could be read
    ///
    /// # Arguments
    /// * `u64` - The stream position at which the truncation was detected
    #[error("Header is truncated at byte pos {0}")]
    Truncated(u64),

    /// A length field describes more bytes than a header may contain
    #[error("Malformed length field ({len}) at byte pos {pos}")]
    InvalidLength { len: u32, pos: u64 },

    /// The column type tag is not one of the known types
    #[error("Unknown column type tag: {0}")]
    UnknownColumnType(u8),

    /// A column's declared byte width disagrees with its type
    #[error("Column '{name}' declares {size} bytes which is invalid for its type")]
    InvalidColumnSize { name: String, size: u32 },

    /// Header offsets or sizes are structurally inconsistent
    #[error("Inconsistent header: {0}")]
    Format(String),
}

/// Errors that can occur while locating or reading data
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The file could not be opened because it does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The path exists but is not a regular file
    #[error("File is not regular")]
    IncompatibleFile,

    /// No file has been associated with the handle
    #[error("No file name has been set")]
    MissingFilename,

    /// Sequential access was requested before the file was opened
    #[error("File is not open")]
    FileNotOpen,

    /// A data group lookup by name, index or position failed
    #[error("Data group not found: {0}")]
    DataGroupNotFound(String),

    /// A data set lookup by name or index failed
    #[error("Data set not found: {0}")]
    DataSetNotFound(String),

    /// Data was requested from a data set that is not open
    #[error("Data set is not open")]
    DataSetNotOpen,

    /// The data set was deleted and can no longer be used
    #[error("Data set has been deleted")]
    DataSetDeleted,

    /// Attempted to access a row beyond the declared row count
    #[error("Requested row ({requested_index}) is out of row range ({max_index})")]
    RowIndexOutOfBounds {
        requested_index: usize,
        max_index: usize,
    },

    /// Attempted to access a column beyond the declared column count
    #[error("Requested column ({requested_index}) is out of column range ({max_index})")]
    ColumnIndexOutOfBounds {
        requested_index: usize,
        max_index: usize,
    },

    /// The requested value type does not match the column type
    #[error("Unexpected column type: column holds {found}, requested {expected}")]
    UnexpectedColumnType {
        expected: &'static str,
        found: &'static str,
    },

    /// The operating system refused to establish a memory-mapped window
    #[error("Unable to map {len} bytes at offset {offset}: {source}")]
    Mapping {
        offset: u64,
        len: usize,
        #[source]
        source: std::io::Error,
    },

    /// A single request cannot be satisfied within the windowing policy
    #[error("Request of {requested} bytes exceeds the maximum window of {max_window} bytes")]
    RequestTooLarge { requested: usize, max_window: usize },

    /// A byte range was requested outside of the data set's row data
    #[error("Range of {len} bytes at offset {offset} lies outside the {size} data bytes")]
    OutOfDataRange { offset: u64, len: usize, size: u64 },

    /// The file holds fewer bytes than the data set header declares
    #[error(
        "Number of bytes in file does not match expectation - possibly truncated at byte pos {0}"
    )]
    FileTruncation(u64),
}

/// Errors that can occur while writing a generic data file
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// An operation was attempted in the wrong phase of the two-pass write
    #[error("Invalid writer state: expected {expected}, found {found}")]
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },

    /// The number of bytes written does not match the declared data set size
    #[error("Data set '{name}' expected {expected} data bytes, {got} were written")]
    UnexpectedDataSize {
        name: String,
        expected: u64,
        got: u64,
    },

    /// The value written does not match the type of the current column
    #[error("Column '{name}' holds {expected}, attempted to write {found}")]
    ColumnTypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A string value does not fit into its fixed-width column
    #[error("String of length {got} exceeds the column width of {width}")]
    StringTooLong { width: usize, got: usize },

    /// A length or offset does not fit into the 32-bit on-disk field
    #[error("Value {0} does not fit into a 32-bit field")]
    FieldOverflow(u64),

    /// A data group index is outside the header's group list
    #[error("No data group header at index {0}")]
    MissingDataGroup(usize),

    /// A data set index is outside the group's data set list
    #[error("No data set header at index {0}")]
    MissingDataSet(usize),
}

/// Errors raised by typed access to name/value parameters
#[derive(thiserror::Error, Debug)]
pub enum ParameterError {
    /// The parameter holds a different type than the one requested
    #[error("Parameter '{name}' holds {found}, requested {expected}")]
    Mismatch {
        name: String,
        expected: &'static str,
        found: String,
    },

    /// The stored value has the wrong number of bytes for its type
    #[error("Parameter '{name}' has {len} value bytes, expected {expected}")]
    InvalidValueSize {
        name: String,
        len: usize,
        expected: usize,
    },
}
