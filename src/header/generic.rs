use std::io::{Read, Seek, Write};

use crate::error::{HeaderError, Result};
use crate::io;
use crate::parameter::{self, Parameter};

/// Parents nested deeper than this are rejected as malformed
const MAX_PARENT_DEPTH: usize = 64;

/// Descriptive block following the file prologue
///
/// Identifies the kind of file, carries its identifier, creation time and
/// locale, an ordered parameter list, and the headers of the files it was
/// derived from (its parents), which are themselves generic data headers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericDataHeader {
    file_type_id: String,
    file_id: String,
    file_creation_time: String,
    locale: String,
    params: Vec<Parameter>,
    parents: Vec<GenericDataHeader>,
}
impl GenericDataHeader {
    #[must_use]
    pub fn new(file_type_id: impl Into<String>) -> Self {
        Self {
            file_type_id: file_type_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn file_type_id(&self) -> &str {
        &self.file_type_id
    }

    pub fn set_file_type_id(&mut self, value: impl Into<String>) {
        self.file_type_id = value.into();
    }

    #[must_use]
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn set_file_id(&mut self, value: impl Into<String>) {
        self.file_id = value.into();
    }

    #[must_use]
    pub fn file_creation_time(&self) -> &str {
        &self.file_creation_time
    }

    pub fn set_file_creation_time(&mut self, value: impl Into<String>) {
        self.file_creation_time = value.into();
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn set_locale(&mut self, value: impl Into<String>) {
        self.locale = value.into();
    }

    pub fn add_name_val_param(&mut self, param: Parameter) {
        self.params.push(param);
    }

    #[must_use]
    pub fn name_val_params(&self) -> &[Parameter] {
        &self.params
    }

    #[must_use]
    pub fn name_val_param_cnt(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn find_name_val_param(&self, name: &str) -> Option<&Parameter> {
        parameter::find_parameter(&self.params, name)
    }

    pub fn add_parent(&mut self, parent: GenericDataHeader) {
        self.parents.push(parent);
    }

    #[must_use]
    pub fn parents(&self) -> &[GenericDataHeader] {
        &self.parents
    }

    /// Finds the first direct parent with the given file type identifier
    #[must_use]
    pub fn find_parent(&self, file_type_id: &str) -> Option<&GenericDataHeader> {
        self.parents.iter().find(|p| p.file_type_id == file_type_id)
    }

    /// Searches the parent tree depth-first for a header with the given file type identifier
    #[must_use]
    pub fn find_ancestor(&self, file_type_id: &str) -> Option<&GenericDataHeader> {
        self.parents.iter().find_map(|p| {
            if p.file_type_id == file_type_id {
                Some(p)
            } else {
                p.find_ancestor(file_type_id)
            }
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of bytes the header (including its parents) occupies on disk
    #[must_use]
    pub fn encoded_size(&self) -> u64 {
        io::string8_size(&self.file_type_id)
            + io::string8_size(&self.file_id)
            + io::string16_size(&self.file_creation_time)
            + io::string16_size(&self.locale)
            + 4
            + self.params.iter().map(Parameter::encoded_size).sum::<u64>()
            + 4
            + self.parents.iter().map(Self::encoded_size).sum::<u64>()
    }

    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Self::read_nested(reader, 0)
    }

    fn read_nested<R: Read + Seek>(reader: &mut R, depth: usize) -> Result<Self> {
        if depth > MAX_PARENT_DEPTH {
            return Err(HeaderError::Format(format!(
                "parent headers nested deeper than {MAX_PARENT_DEPTH}"
            ))
            .into());
        }
        let file_type_id = io::read_string8(reader)?;
        let file_id = io::read_string8(reader)?;
        let file_creation_time = io::read_string16(reader)?;
        let locale = io::read_string16(reader)?;
        let params = parameter::read_parameters(reader)?;
        let parent_cnt = io::read_u32(reader)?;
        let parents = (0..parent_cnt)
            .map(|_| Self::read_nested(reader, depth + 1))
            .collect::<Result<_>>()?;
        Ok(Self {
            file_type_id,
            file_id,
            file_creation_time,
            locale,
            params,
            parents,
        })
    }

    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        io::write_string8(writer, &self.file_type_id)?;
        io::write_string8(writer, &self.file_id)?;
        io::write_string16(writer, &self.file_creation_time)?;
        io::write_string16(writer, &self.locale)?;
        parameter::write_parameters(writer, &self.params)?;
        io::write_u32(writer, io::to_u32(self.parents.len() as u64)?)?;
        self.parents.iter().try_for_each(|p| p.write_bytes(writer))
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_round_trip_with_parents() -> Result<()> {
        let mut array = GenericDataHeader::new("affymetrix-calvin-array");
        array.set_file_id("array-guid");
        array.add_name_val_param(Parameter::ascii("affymetrix-array-id", "12345"));

        let mut grandparent = GenericDataHeader::new("affymetrix-calvin-scan-acquisition");
        grandparent.add_parent(array);

        let mut header = GenericDataHeader::new("affymetrix-calvin-intensity");
        header.set_file_id("test-dat-guid");
        header.set_file_creation_time("2004-07-04T11:12:13Z");
        header.set_locale("en-US");
        header.add_name_val_param(Parameter::text("Scanner", "M10"));
        header.add_name_val_param(Parameter::float("Pixel Size", 0.051));
        header.add_parent(grandparent);

        let mut cursor = Cursor::new(Vec::new());
        header.write_bytes(&mut cursor)?;
        assert_eq!(cursor.get_ref().len() as u64, header.encoded_size());

        cursor.set_position(0);
        let read = GenericDataHeader::from_reader(&mut cursor)?;
        assert_eq!(read, header);
        assert_eq!(read.parents()[0].parents()[0].file_id(), "array-guid");
        assert!(read.find_parent("affymetrix-calvin-scan-acquisition").is_some());
        assert!(read.find_parent("affymetrix-calvin-array").is_none());
        assert_eq!(
            read.find_ancestor("affymetrix-calvin-array")
                .map(GenericDataHeader::file_id),
            Some("array-guid")
        );
        Ok(())
    }
}
