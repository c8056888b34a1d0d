//! Row data access strategies
//!
//! A [`DataSet`](crate::DataSet) reads its row data through a [`RowAccessor`].
//! Two strategies exist:
//!
//! 1. [`DataAccessWindow`] maps a bounded window of the data set into memory
//!    and moves the window whenever a request falls outside of it
//! 2. [`StreamDataAccessor`] performs positioned reads on the file, or serves
//!    every request from a copy of the data set loaded at open time
//!
//! Both return byte-identical results for the same request.

mod stream;
mod window;

pub use stream::StreamDataAccessor;
pub use window::DataAccessWindow;

use auto_impl::auto_impl;

use crate::error::{ReadError, Result};

/// Positioned access to the row data of one data set
///
/// Offsets are relative to the first byte of row data.
#[auto_impl(&mut, Box)]
pub trait RowAccessor {
    /// Returns `len` bytes starting `offset` bytes into the row data
    ///
    /// The returned slice is valid until the next call.
    fn read_at(&mut self, offset: u64, len: usize) -> Result<&[u8]>;

    /// Number of bytes of row data
    fn data_size(&self) -> u64;

    /// The largest request served in one call, `None` when unbounded
    fn max_request(&self) -> Option<usize> {
        None
    }
}

/// Rejects requests reaching beyond the row data
pub(crate) fn check_range(offset: u64, len: usize, size: u64) -> Result<()> {
    match offset.checked_add(len as u64) {
        Some(end) if end <= size => Ok(()),
        _ => Err(ReadError::OutOfDataRange { offset, len, size }.into()),
    }
}

/// The access strategy a data set cursor is bound to
pub enum Accessor {
    Window(DataAccessWindow),
    Stream(StreamDataAccessor),
}
impl Accessor {
    #[must_use]
    pub fn is_memory_mapped(&self) -> bool {
        matches!(self, Self::Window(_))
    }
}
impl RowAccessor for Accessor {
    fn read_at(&mut self, offset: u64, len: usize) -> Result<&[u8]> {
        match self {
            Self::Window(inner) => inner.read_at(offset, len),
            Self::Stream(inner) => inner.read_at(offset, len),
        }
    }

    fn data_size(&self) -> u64 {
        match self {
            Self::Window(inner) => inner.data_size(),
            Self::Stream(inner) => inner.data_size(),
        }
    }

    fn max_request(&self) -> Option<usize> {
        match self {
            Self::Window(inner) => inner.max_request(),
            Self::Stream(inner) => inner.max_request(),
        }
    }
}
