//! Runtime handles over a generic data file
//!
//! [`GenericData`] owns the header tree and the access configuration.
//! [`DataGroup`] and [`DataSet`] are created from it; every [`DataSet`] is an
//! independent cursor with its own file handle.

mod generic;
mod group;
mod set;

pub use generic::{
    GenericData, ARRAY_BARCODE_PARAM_NAME, ARRAY_ID_PARAM_NAME, ARRAY_TYPE_IDENTIFIER,
    ARRAY_TYPE_PARAM_NAME,
};
pub use group::DataGroup;
pub(crate) use group::{complete_data_set_header, data_set_index};
pub use set::DataSet;

use std::fmt;

/// Addresses a data group or data set by position or by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    Index(usize),
    Name(&'a str),
}
impl From<usize> for Locator<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}
impl<'a> From<&'a str> for Locator<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}
impl<'a> From<&'a String> for Locator<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}
impl fmt::Display for Locator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "index {index}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}
