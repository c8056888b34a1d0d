//! The header tree of a generic data file
//!
//! A file starts with a short prologue (magic number, version, data group count
//! and the offset of the first data group) followed by the [`GenericDataHeader`].
//! Data groups form a chain of [`DataGroupHeader`]s, each pointing at a chain of
//! [`DataSetHeader`]s whose row data directly follows the set header.
//!
//! All integers are little-endian and all offsets are absolute `u32` file positions.

mod column;
mod data_group;
mod data_set;
mod file;
mod generic;

pub use column::{ColumnInfo, ColumnType, STRING_PREFIX_SIZE};
pub use data_group::DataGroupHeader;
pub use data_set::DataSetHeader;
pub use file::{FileHeader, MAGIC, SIZE_PROLOGUE, VERSION};
pub use generic::GenericDataHeader;
