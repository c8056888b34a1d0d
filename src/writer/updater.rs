use std::fs::OpenOptions;
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::Result;
use crate::header::{FileHeader, GenericDataHeader, SIZE_PROLOGUE};
use crate::io;
use crate::parameter::{Parameter, ParameterType};
use crate::reader::open_file;

/// Rewrites parts of the generic data header of an existing file in place
///
/// Nothing is moved: a value is only replaced when the new value fits into
/// the bytes the old one occupies.
pub struct GenericDataHeaderUpdater<S: Write + Seek> {
    inner: S,
}
impl<S: Write + Seek> GenericDataHeaderUpdater<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Replaces the file identifier
    ///
    /// # Arguments
    ///
    /// * `current` - The generic data header as stored in the file
    /// * `file_id` - The new identifier
    ///
    /// # Returns
    ///
    /// `false` without touching the file when the new identifier has a different length
    pub fn update_file_id(&mut self, current: &GenericDataHeader, file_id: &str) -> Result<bool> {
        if file_id.len() != current.file_id().len() {
            log::warn!(
                "file identifier not updated: length {} differs from stored length {}",
                file_id.len(),
                current.file_id().len()
            );
            return Ok(false);
        }
        let pos = SIZE_PROLOGUE + io::string8_size(current.file_type_id()) + 4;
        self.inner.seek(SeekFrom::Start(pos))?;
        self.inner.write_all(file_id.as_bytes())?;
        Ok(true)
    }

    /// Replaces the values of stored parameters with matching name and type
    ///
    /// A parameter is only rewritten when its new value fits into the stored
    /// value bytes; text values are zero-padded to the stored size.
    ///
    /// # Returns
    ///
    /// The number of parameters rewritten
    pub fn update_parameters(&mut self, current: &GenericDataHeader, params: &[Parameter]) -> Result<usize> {
        let mut pos = SIZE_PROLOGUE
            + io::string8_size(current.file_type_id())
            + io::string8_size(current.file_id())
            + io::string16_size(current.file_creation_time())
            + io::string16_size(current.locale())
            + 4;

        let mut updated = 0;
        for stored in current.name_val_params() {
            let value_pos = pos + io::string16_size(stored.name()) + 4;
            pos += stored.encoded_size();

            let Some(param) = params.iter().find(|p| p.name() == stored.name()) else {
                continue;
            };
            let Some(value) = fitted_value(stored, param) else {
                log::warn!("parameter '{}' does not fit its stored value", param.name());
                continue;
            };
            self.inner.seek(SeekFrom::Start(value_pos))?;
            self.inner.write_all(&value)?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Applies the file identifier and the parameters of `update` to the file
    ///
    /// # Returns
    ///
    /// `false` if the file identifier differs and could not be replaced
    pub fn update(&mut self, current: &GenericDataHeader, update: &GenericDataHeader) -> Result<bool> {
        let id_updated = if update.file_id() == current.file_id() {
            true
        } else {
            self.update_file_id(current, update.file_id())?
        };
        self.update_parameters(current, update.name_val_params())?;
        self.inner.flush()?;
        Ok(id_updated)
    }
}

/// The bytes replacing `stored`'s value, or `None` when `param` does not fit
fn fitted_value(stored: &Parameter, param: &Parameter) -> Option<Vec<u8>> {
    if stored.mime_type() != param.mime_type() {
        return None;
    }
    let stored_len = stored.raw_value().len();
    let value = param.raw_value();
    match stored.param_type() {
        ParameterType::Text | ParameterType::Ascii if value.len() <= stored_len => {
            let mut padded = value.to_vec();
            padded.resize(stored_len, 0);
            Some(padded)
        }
        _ if value.len() == stored_len => Some(value.to_vec()),
        _ => None,
    }
}

/// Updates the generic data header of the file at `path`
///
/// The stored header is read first to locate the fields.
pub fn update_file<P: AsRef<Path>>(path: P, update: &GenericDataHeader) -> Result<bool> {
    let current = {
        let mut reader = BufReader::new(open_file(path.as_ref())?);
        FileHeader::from_reader(&mut reader)?
    };
    let file = OpenOptions::new().write(true).open(path.as_ref())?;
    let mut updater = GenericDataHeaderUpdater::new(file);
    updater.update(current.generic_data_hdr(), update)
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Cursor;

    fn stored() -> GenericDataHeader {
        let mut header = GenericDataHeader::new("affymetrix-calvin-intensity");
        header.set_file_id("test-dat-guid");
        header.set_file_creation_time("2004-07-04T11:12:13Z");
        header.set_locale("en-US");
        header.add_name_val_param(Parameter::text_reserved("Scanner", "M10", 10));
        header.add_name_val_param(Parameter::float("Pixel Size", 0.051));
        header.add_name_val_param(Parameter::int32("Rows", 100));
        header
    }

    fn write_stored(header: &GenericDataHeader) -> Result<Cursor<Vec<u8>>> {
        let mut file = FileHeader::new();
        file.set_generic_data_hdr(header.clone());
        let mut cursor = Cursor::new(Vec::new());
        file.write_bytes(&mut cursor)?;
        Ok(cursor)
    }

    fn read_back(cursor: Cursor<Vec<u8>>) -> Result<GenericDataHeader> {
        let mut cursor = Cursor::new(cursor.into_inner());
        Ok(FileHeader::from_reader(&mut cursor)?.generic_data_hdr().clone())
    }

    #[test]
    fn test_file_id_same_length() -> Result<()> {
        let current = stored();
        let mut updater = GenericDataHeaderUpdater::new(write_stored(&current)?);
        assert!(updater.update_file_id(&current, "TEST-DAT-GUID")?);
        assert!(!updater.update_file_id(&current, "short")?);
        let read = read_back(updater.into_inner())?;
        assert_eq!(read.file_id(), "TEST-DAT-GUID");
        Ok(())
    }

    #[test]
    fn test_parameter_updates() -> Result<()> {
        let current = stored();
        let mut update = GenericDataHeader::new("affymetrix-calvin-intensity");
        update.set_file_id("test-dat-guid");
        update.add_name_val_param(Parameter::text("Scanner", "M12-long"));
        update.add_name_val_param(Parameter::float("Pixel Size", 0.7));
        // Type differs from the stored value
        update.add_name_val_param(Parameter::int16("Rows", 5));
        update.add_name_val_param(Parameter::int32("Missing", 5));

        let mut updater = GenericDataHeaderUpdater::new(write_stored(&current)?);
        assert_eq!(updater.update_parameters(&current, update.name_val_params())?, 2);
        assert!(updater.update(&current, &update)?);

        let read = read_back(updater.into_inner())?;
        let scanner = read.find_name_val_param("Scanner").map(Parameter::value_text);
        assert_eq!(scanner.transpose()?.as_deref(), Some("M12-long"));
        let scanner = read.find_name_val_param("Scanner").map(|p| p.raw_value().len());
        assert_eq!(scanner, Some(20));
        let pixel = read.find_name_val_param("Pixel Size").map(Parameter::value_float);
        assert!((pixel.transpose()?.unwrap_or_default() - 0.7).abs() < f32::EPSILON);
        let rows = read.find_name_val_param("Rows").map(Parameter::value_int32);
        assert_eq!(rows.transpose()?, Some(100));
        Ok(())
    }

    #[test]
    fn test_text_too_long() -> Result<()> {
        let current = stored();
        let params = [Parameter::text("Scanner", "a value longer than ten")];
        let mut updater = GenericDataHeaderUpdater::new(write_stored(&current)?);
        assert_eq!(updater.update_parameters(&current, &params)?, 0);
        Ok(())
    }
}
