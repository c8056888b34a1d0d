use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use super::{check_range, RowAccessor};
use crate::error::Result;

/// Positioned stream reads over the row data of one data set
///
/// With preloading enabled the whole row data is read once when the accessor
/// is created and every request is served from memory.
pub struct StreamDataAccessor {
    /// Open handle on the data file
    file: File,

    /// Absolute file offset of the first byte of row data
    data_start: u64,

    /// Number of bytes of row data
    data_size: u64,

    /// The entire row data, when preloaded
    preloaded: Option<Vec<u8>>,

    /// Scratch buffer for positioned reads
    buffer: Vec<u8>,
}
impl StreamDataAccessor {
    /// Creates a stream accessor, optionally loading the entire row data
    ///
    /// # Arguments
    ///
    /// * `file` - Open handle on the data file
    /// * `data_start` - Absolute offset of the row data
    /// * `data_size` - Number of bytes of row data
    /// * `preload` - Read the whole row data into memory now
    ///
    /// # Errors
    ///
    /// Returns an I/O error if preloading is requested and the row data cannot
    /// be read in full
    pub fn new(file: File, data_start: u64, data_size: u64, preload: bool) -> Result<Self> {
        let mut accessor = Self {
            file,
            data_start,
            data_size,
            preloaded: None,
            buffer: Vec::new(),
        };
        if preload {
            log::debug!("preloading {data_size} bytes at file offset {data_start}");
            let mut data = vec![0u8; data_size as usize];
            accessor.file.seek(SeekFrom::Start(data_start))?;
            accessor.file.read_exact(&mut data)?;
            accessor.preloaded = Some(data);
        }
        Ok(accessor)
    }

    #[must_use]
    pub fn is_preloaded(&self) -> bool {
        self.preloaded.is_some()
    }
}
impl RowAccessor for StreamDataAccessor {
    fn read_at(&mut self, offset: u64, len: usize) -> Result<&[u8]> {
        check_range(offset, len, self.data_size)?;
        if let Some(data) = &self.preloaded {
            let lbound = offset as usize;
            return Ok(&data[lbound..lbound + len]);
        }
        log::trace!("stream read of {len} bytes at data offset {offset}");
        self.buffer.resize(len, 0);
        self.file.seek(SeekFrom::Start(self.data_start + offset))?;
        self.file.read_exact(&mut self.buffer)?;
        Ok(&self.buffer)
    }

    fn data_size(&self) -> u64 {
        self.data_size
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_stream_and_preload_agree() -> anyhow::Result<()> {
        let data: Vec<u8> = (0..=255).cycle().take(5000).collect();
        let mut file = NamedTempFile::new()?;
        file.write_all(&[0; 11])?;
        file.write_all(&data)?;
        file.flush()?;

        let mut stream = StreamDataAccessor::new(File::open(file.path())?, 11, 5000, false)?;
        let mut preload = StreamDataAccessor::new(File::open(file.path())?, 11, 5000, true)?;
        assert!(!stream.is_preloaded());
        assert!(preload.is_preloaded());

        for (offset, len) in [(0, 10), (4990, 10), (123, 777), (1, 0)] {
            let expected = &data[offset..offset + len];
            assert_eq!(stream.read_at(offset as u64, len)?, expected);
            assert_eq!(preload.read_at(offset as u64, len)?, expected);
        }
        assert!(stream.read_at(4999, 2).is_err());
        assert!(preload.read_at(4999, 2).is_err());
        Ok(())
    }
}
