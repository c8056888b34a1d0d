//! Reader and writer for Calvin generic data files
//!
//! A generic data file holds a header tree (file header, generic data header,
//! data group headers and data set headers) followed by the row data of each
//! data set. [`GenericFileReader`] reads the tree into a [`GenericData`]
//! handle, which vends [`DataSet`] cursors reading rows through memory-mapped
//! windows or positioned stream reads. [`GenericFileWriter`] writes new files.

pub mod access;
mod config;
mod data;
mod error;
mod header;
mod io;
mod parameter;
mod reader;
mod value;
mod writer;

pub use config::{AccessConfig, ReadMode, DEFAULT_MAX_WINDOW_BYTES};
pub use data::{
    DataGroup, DataSet, GenericData, Locator, ARRAY_BARCODE_PARAM_NAME, ARRAY_ID_PARAM_NAME,
    ARRAY_TYPE_IDENTIFIER, ARRAY_TYPE_PARAM_NAME,
};
pub use error::{Error, HeaderError, ParameterError, ReadError, Result, WriteError};
pub use header::{
    ColumnInfo, ColumnType, DataGroupHeader, DataSetHeader, FileHeader, GenericDataHeader, MAGIC,
    SIZE_PROLOGUE, STRING_PREFIX_SIZE, VERSION,
};
pub use parameter::{
    Parameter, ParameterType, MIME_ASCII, MIME_FLOAT, MIME_INT16, MIME_INT32, MIME_INT8,
    MIME_TEXT, MIME_UINT16, MIME_UINT32, MIME_UINT8,
};
pub use reader::{DataGroupReader, DataSetReader, GenericFileReader};
pub use value::ColumnValue;
pub use writer::{
    update_file, DataGroupWriter, DataSetWriter, GenericDataHeaderUpdater, GenericFileWriter,
    WriteState,
};
