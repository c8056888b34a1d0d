//! Access configuration for data set cursors
//!
//! The configuration decides which [`RowAccessor`](crate::access::RowAccessor)
//! a [`DataSet`](crate::DataSet) binds to when it is opened.

/// Default cap on the size of a single memory-mapped window (200MB)
pub const DEFAULT_MAX_WINDOW_BYTES: usize = 200 * 1024 * 1024;

/// How much of the data group / data set header tree is read with the file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Read every data group header and every data set header in full
    #[default]
    FullDataGroupHeader,

    /// Read every data group header, but only the name and offsets of each data set
    ///
    /// Row, column and parameter information is read on demand when a data set is requested.
    MinimalDataGroupHeader,

    /// Read only the file header and the generic data header
    ///
    /// Data group headers are read on demand.
    NoDataGroupHeader,
}

/// Selects and tunes the row access strategy of a data set cursor
///
/// # Examples
///
/// ```
/// use calvin::AccessConfig;
///
/// let config = AccessConfig::default()
///     .use_memory_mapping(false)
///     .load_entire_data_set(true);
/// assert!(!config.memory_mapping());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessConfig {
    /// Use memory-mapped windows instead of stream reads
    memory_mapping: bool,

    /// Read the whole data set into memory on open (stream strategy only)
    load_entire_data_set: bool,

    /// Upper bound on the bytes of a single mapped window
    max_window_bytes: usize,
}
impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            memory_mapping: true,
            load_entire_data_set: false,
            max_window_bytes: DEFAULT_MAX_WINDOW_BYTES,
        }
    }
}
impl AccessConfig {
    #[must_use]
    pub fn use_memory_mapping(mut self, value: bool) -> Self {
        self.memory_mapping = value;
        self
    }

    #[must_use]
    pub fn load_entire_data_set(mut self, value: bool) -> Self {
        self.load_entire_data_set = value;
        self
    }

    /// Sets the window cap. A value of zero is raised to one byte.
    #[must_use]
    pub fn max_window_bytes(mut self, value: usize) -> Self {
        self.max_window_bytes = value.max(1);
        self
    }

    #[must_use]
    pub fn memory_mapping(&self) -> bool {
        self.memory_mapping
    }

    #[must_use]
    pub fn preload(&self) -> bool {
        self.load_entire_data_set
    }

    #[must_use]
    pub fn window_cap(&self) -> usize {
        self.max_window_bytes
    }
}

#[cfg(test)]
mod testing {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AccessConfig::default();
        assert!(config.memory_mapping());
        assert!(!config.preload());
        assert_eq!(config.window_cap(), DEFAULT_MAX_WINDOW_BYTES);
        assert_eq!(ReadMode::default(), ReadMode::FullDataGroupHeader);
    }

    #[test]
    fn test_zero_window_is_raised() {
        let config = AccessConfig::default().max_window_bytes(0);
        assert_eq!(config.window_cap(), 1);
    }
}
