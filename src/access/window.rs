use std::fs::File;

use memmap2::{Mmap, MmapOptions};

use super::{check_range, RowAccessor};
use crate::error::{ReadError, Result};

/// A memory-mapped window over the row data of one data set
///
/// Only `max_window` bytes are mapped at a time. A request that is not fully
/// inside the current window drops it and maps a new window starting at the
/// requested offset, extending to the window cap or the end of the row data,
/// whichever comes first.
pub struct DataAccessWindow {
    /// Open handle on the data file
    file: File,

    /// Absolute file offset of the first byte of row data
    data_start: u64,

    /// Number of bytes of row data
    data_size: u64,

    /// Upper bound on the size of a mapping
    max_window: usize,

    /// The current mapping
    map: Option<Mmap>,

    /// Offset of the first mapped byte, relative to the row data
    mapped_first: u64,
}
impl DataAccessWindow {
    /// Creates a window and maps the start of the row data
    ///
    /// # Arguments
    ///
    /// * `file` - Open handle on the data file
    /// * `data_start` - Absolute offset of the row data
    /// * `data_size` - Number of bytes of row data
    /// * `max_window` - Upper bound on the size of a single mapping
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Mapping`] if the operating system refuses the
    /// mapping of the first window
    pub fn new(file: File, data_start: u64, data_size: u64, max_window: usize) -> Result<Self> {
        let mut window = Self {
            file,
            data_start,
            data_size,
            max_window: max_window.max(1),
            map: None,
            mapped_first: 0,
        };
        if data_size > 0 {
            window.remap(0)?;
        }
        Ok(window)
    }

    /// Offset of the first mapped byte relative to the row data
    #[must_use]
    pub fn mapped_first_byte(&self) -> u64 {
        self.mapped_first
    }

    /// Number of currently mapped bytes
    #[must_use]
    pub fn mapped_byte_count(&self) -> usize {
        self.map.as_ref().map_or(0, |m| m.len())
    }

    fn is_mapped(&self, offset: u64, len: usize) -> bool {
        let end = self.mapped_first + self.mapped_byte_count() as u64;
        self.map.is_some() && offset >= self.mapped_first && offset + len as u64 <= end
    }

    /// Makes sure `len` bytes at `offset` are inside the window
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::OutOfDataRange`] if the range reaches past the row
    /// data, [`ReadError::RequestTooLarge`] if it exceeds the window cap, and
    /// [`ReadError::Mapping`] if the new window cannot be mapped
    pub fn ensure_mapped(&mut self, offset: u64, len: usize) -> Result<()> {
        check_range(offset, len, self.data_size)?;
        if len == 0 {
            return Ok(());
        }
        if len > self.max_window {
            return Err(ReadError::RequestTooLarge {
                requested: len,
                max_window: self.max_window,
            }
            .into());
        }
        if !self.is_mapped(offset, len) {
            self.remap(offset)?;
        }
        Ok(())
    }

    fn remap(&mut self, offset: u64) -> Result<()> {
        let remaining = self.data_size - offset;
        let len = remaining.min(self.max_window as u64) as usize;
        let abs_offset = self.data_start + offset;
        log::debug!(
            "mapping {len} bytes at data offset {offset} (file offset {abs_offset})"
        );

        // Drop the old window before creating the new one
        self.map = None;

        // Safety: the file is open read-only and is not modified while mapped
        let map = unsafe { MmapOptions::new().offset(abs_offset).len(len).map(&self.file) }
            .map_err(|source| ReadError::Mapping {
                offset: abs_offset,
                len,
                source,
            })?;
        self.map = Some(map);
        self.mapped_first = offset;
        Ok(())
    }
}
impl RowAccessor for DataAccessWindow {
    fn read_at(&mut self, offset: u64, len: usize) -> Result<&[u8]> {
        if len == 0 {
            check_range(offset, len, self.data_size)?;
            return Ok(&[]);
        }
        self.ensure_mapped(offset, len)?;
        log::trace!("window read of {len} bytes at data offset {offset}");
        let lbound = (offset - self.mapped_first) as usize;
        match &self.map {
            Some(map) => Ok(&map[lbound..lbound + len]),
            None => Err(ReadError::DataSetNotOpen.into()),
        }
    }

    fn data_size(&self) -> u64 {
        self.data_size
    }

    fn max_request(&self) -> Option<usize> {
        Some(self.max_window)
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn data_file(prefix: usize, data: &[u8]) -> anyhow::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&vec![0xFF; prefix])?;
        file.write_all(data)?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_remap_forward_and_backward() -> anyhow::Result<()> {
        let data: Vec<u8> = (0..=255).cycle().take(10_000).collect();
        let file = data_file(37, &data)?;
        let mut window = DataAccessWindow::new(File::open(file.path())?, 37, 10_000, 1000)?;
        assert_eq!(window.mapped_first_byte(), 0);
        assert_eq!(window.mapped_byte_count(), 1000);

        assert_eq!(window.read_at(5, 4)?, &data[5..9]);
        assert_eq!(window.mapped_first_byte(), 0);

        // Forward miss
        assert_eq!(window.read_at(7000, 16)?, &data[7000..7016]);
        assert_eq!(window.mapped_first_byte(), 7000);

        // Backward miss
        assert_eq!(window.read_at(10, 2)?, &data[10..12]);
        assert_eq!(window.mapped_first_byte(), 10);

        // Overrun of the window end
        assert_eq!(window.read_at(1005, 10)?, &data[1005..1015]);
        assert_eq!(window.mapped_first_byte(), 1005);

        // Window at the tail is clamped to the end of the row data
        assert_eq!(window.read_at(9990, 10)?, &data[9990..]);
        assert_eq!(window.mapped_byte_count(), 10);
        Ok(())
    }

    #[test]
    fn test_request_too_large() -> anyhow::Result<()> {
        let data = vec![7u8; 4096];
        let file = data_file(0, &data)?;
        let mut window = DataAccessWindow::new(File::open(file.path())?, 0, 4096, 100)?;
        assert!(matches!(
            window.read_at(0, 101),
            Err(crate::Error::ReadError(ReadError::RequestTooLarge {
                requested: 101,
                max_window: 100
            }))
        ));
        assert_eq!(window.read_at(0, 100)?.len(), 100);
        assert!(window.read_at(4000, 97).is_err());
        Ok(())
    }

    #[test]
    fn test_ensure_mapped_rejects_out_of_range() -> anyhow::Result<()> {
        let data = vec![3u8; 10_000];
        let file = data_file(0, &data)?;
        let mut window = DataAccessWindow::new(File::open(file.path())?, 0, 10_000, 1000)?;
        assert!(matches!(
            window.ensure_mapped(20_000, 1),
            Err(crate::Error::ReadError(ReadError::OutOfDataRange {
                offset: 20_000,
                len: 1,
                size: 10_000
            }))
        ));
        assert!(window.ensure_mapped(9_999, 2).is_err());
        assert!(window.ensure_mapped(u64::MAX, 1).is_err());

        // The current window survives a rejected request
        assert_eq!(window.mapped_first_byte(), 0);
        assert_eq!(window.mapped_byte_count(), 1000);

        window.ensure_mapped(10_000, 0)?;
        window.ensure_mapped(9_999, 1)?;
        assert_eq!(window.mapped_first_byte(), 9_999);
        Ok(())
    }

    #[test]
    fn test_empty_data() -> anyhow::Result<()> {
        let file = data_file(16, &[])?;
        let mut window = DataAccessWindow::new(File::open(file.path())?, 16, 0, 100)?;
        assert_eq!(window.mapped_byte_count(), 0);
        assert!(window.read_at(0, 0)?.is_empty());
        assert!(window.read_at(0, 1).is_err());
        Ok(())
    }
}
