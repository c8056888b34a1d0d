//! Traversal of the data group and data set header chains

use std::io::{Read, Seek, SeekFrom};

use crate::config::ReadMode;
use crate::error::{HeaderError, ReadError, Result};
use crate::header::{DataGroupHeader, DataSetHeader, FileHeader};

/// How much of a data group is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupDepth {
    /// The group header fields only, no data set headers
    HeaderOnly,
    /// The group header and the name and offsets of each data set
    Minimal,
    /// The group header and every data set header in full
    Full,
}

/// Smallest possible data group header: three offsets/counts and an empty name
const MIN_GROUP_HEADER_SIZE: u64 = 16;

/// Smallest possible data set header: two offsets and an empty name
const MIN_DATA_SET_HEADER_SIZE: u64 = 12;

fn stream_len<R: Seek>(reader: &mut R) -> Result<u64> {
    let pos = reader.stream_position()?;
    let len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(pos))?;
    Ok(len)
}

/// Rejects a declared count whose headers could not fit in the stream
fn check_declared_count<R: Seek>(
    reader: &mut R,
    count: usize,
    min_size: u64,
    what: &str,
) -> Result<()> {
    let len = stream_len(reader)?;
    if (count as u64).saturating_mul(min_size) > len {
        return Err(HeaderError::Format(format!(
            "{count} declared {what} cannot fit in a file of {len} bytes"
        ))
        .into());
    }
    Ok(())
}

/// Returns the next offset of a header chain, which must point forward or be zero
pub(crate) fn next_link(current: u64, next: u64, what: &str) -> Result<u64> {
    if next != 0 && next <= current {
        return Err(HeaderError::Format(format!(
            "{what} at {current} links back to offset {next}"
        ))
        .into());
    }
    Ok(next)
}

/// Reads the file header and, depending on the mode, the data group headers
///
/// A group chain that ends before the declared count is truncated with a
/// warning and the declared count is lowered to the groups actually found.
pub(crate) fn read_file_header<R: Read + Seek>(reader: &mut R, mode: ReadMode) -> Result<FileHeader> {
    reader.seek(SeekFrom::Start(0))?;
    let mut header = FileHeader::from_reader(reader)?;
    check_declared_count(
        reader,
        header.num_data_groups(),
        MIN_GROUP_HEADER_SIZE,
        "data groups",
    )?;
    let depth = match mode {
        ReadMode::FullDataGroupHeader => GroupDepth::Full,
        ReadMode::MinimalDataGroupHeader => GroupDepth::Minimal,
        ReadMode::NoDataGroupHeader => return Ok(header),
    };
    let declared = header.num_data_groups();
    let groups = read_group_chain(reader, &header, declared, depth)?;
    if groups.len() < declared {
        header.set_declared_group_cnt(groups.len() as u32);
    }
    header.replace_groups(groups);
    Ok(header)
}

/// Follows the group chain from the first group and reads `count` groups
pub(crate) fn read_group_chain<R: Read + Seek>(
    reader: &mut R,
    header: &FileHeader,
    count: usize,
    depth: GroupDepth,
) -> Result<Vec<DataGroupHeader>> {
    let mut groups = Vec::new();
    let mut pos = header.first_group_pos();
    for index in 0..count {
        if pos == 0 {
            log::warn!("group chain ends after {index} of {count} declared data groups");
            break;
        }
        let group = read_data_group(reader, pos, depth)?;
        if index + 1 < count {
            pos = next_link(pos, group.next_group_pos(), "data group")?;
        }
        groups.push(group);
    }
    Ok(groups)
}

/// Reads the data group header at `pos`
///
/// # Arguments
///
/// * `reader` - The stream holding the file
/// * `pos` - Absolute offset of the group header
/// * `depth` - How much of the group's data set chain to read
pub(crate) fn read_data_group<R: Read + Seek>(
    reader: &mut R,
    pos: u64,
    depth: GroupDepth,
) -> Result<DataGroupHeader> {
    reader.seek(SeekFrom::Start(pos))?;
    let mut group = DataGroupHeader::from_reader(reader)?;
    let count = group.num_data_sets();
    check_declared_count(reader, count, MIN_DATA_SET_HEADER_SIZE, "data sets")?;
    let full = match depth {
        GroupDepth::HeaderOnly => return Ok(group),
        GroupDepth::Minimal => false,
        GroupDepth::Full => true,
    };

    let mut data_sets = Vec::new();
    let mut set_pos = group.data_set_pos();
    for index in 0..count {
        if set_pos == 0 {
            log::warn!(
                "data set chain of group '{}' ends after {index} of {count} data sets",
                group.name()
            );
            break;
        }
        let set = read_data_set(reader, set_pos, full)?;
        if index + 1 < count {
            set_pos = next_link(set_pos, set.next_set_pos(), "data set")?;
        }
        data_sets.push(set);
    }
    group.replace_data_sets(data_sets);
    Ok(group)
}

/// Reads the data set header at `pos`
pub(crate) fn read_data_set<R: Read + Seek>(
    reader: &mut R,
    pos: u64,
    full: bool,
) -> Result<DataSetHeader> {
    reader.seek(SeekFrom::Start(pos))?;
    DataSetHeader::from_reader(reader, full)
}

/// Reads the full data group at `index` by walking the group chain
///
/// Groups before `index` are read header-only to find the offset.
pub(crate) fn locate_data_group<R: Read + Seek>(
    reader: &mut R,
    header: &FileHeader,
    index: usize,
) -> Result<DataGroupHeader> {
    if index >= header.num_data_groups() {
        return Err(ReadError::DataGroupNotFound(format!("index {index}")).into());
    }
    let mut pos = header.first_group_pos();
    for _ in 0..index {
        if pos == 0 {
            break;
        }
        let next = read_data_group(reader, pos, GroupDepth::HeaderOnly)?.next_group_pos();
        pos = next_link(pos, next, "data group")?;
    }
    if pos == 0 {
        return Err(ReadError::DataGroupNotFound(format!("index {index}")).into());
    }
    read_data_group(reader, pos, GroupDepth::Full)
}
