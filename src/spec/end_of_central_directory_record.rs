//! End of central directory record.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::result::ZipResult;
use crate::spec::{read_bytes, ZIP64_MAGIC, ZIP64_MAGIC_U16};

/// The trailing record summarizing the central directory location and entry
/// counts.
///
/// ```text
/// end of central dir signature                                   4 bytes  (0x06054b50)
/// number of this disk                                            2 bytes
/// number of the disk with the start of the central directory     2 bytes
/// total number of entries in the central directory on this disk  2 bytes
/// total number of entries in the central directory               2 bytes
/// size of the central directory                                  4 bytes
/// offset of start of central directory                           4 bytes
/// .ZIP file comment length                                       2 bytes
/// .ZIP file comment (variable size)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    /// Number of this disk
    pub this_disk: u16,
    /// Disk holding the start of the central directory
    pub start_disk: u16,
    /// Central directory entries on this disk
    pub disk_entries: u16,
    /// Central directory entries in total
    pub total_entries: u16,
    /// Central directory size in bytes
    pub cen_size: u32,
    /// Offset of the first central directory header
    pub cen_offset: u32,
    /// Archive comment bytes
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// The four-byte record signature.
    pub const SIG: u32 = 0x06054b50;

    const FIXED_SIZE: u64 = 22;

    /// Parse the remainder of the record; the caller has consumed the
    /// signature.
    pub(crate) fn read<R: Read + ?Sized>(reader: &mut R) -> ZipResult<Self> {
        let this_disk = reader.read_u16::<LittleEndian>()?;
        let start_disk = reader.read_u16::<LittleEndian>()?;
        let disk_entries = reader.read_u16::<LittleEndian>()?;
        let total_entries = reader.read_u16::<LittleEndian>()?;
        let cen_size = reader.read_u32::<LittleEndian>()?;
        let cen_offset = reader.read_u32::<LittleEndian>()?;
        let clen = reader.read_u16::<LittleEndian>()?;
        let comment = read_bytes(reader, clen as usize)?;
        Ok(EndOfCentralDirectory {
            this_disk,
            start_disk,
            disk_entries,
            total_entries,
            cen_size,
            cen_offset,
            comment,
        })
    }

    pub(crate) fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<LittleEndian>(Self::SIG)?;
        out.write_u16::<LittleEndian>(self.this_disk)?;
        out.write_u16::<LittleEndian>(self.start_disk)?;
        out.write_u16::<LittleEndian>(self.disk_entries)?;
        out.write_u16::<LittleEndian>(self.total_entries)?;
        out.write_u32::<LittleEndian>(self.cen_size)?;
        out.write_u32::<LittleEndian>(self.cen_offset)?;
        out.write_u16::<LittleEndian>(self.clen())?;
        out.write_all(&self.comment)
    }

    /// Exact serialized length.
    pub fn wire_size(&self) -> u64 {
        Self::FIXED_SIZE + self.comment.len() as u64
    }

    /// The comment length written on the wire.
    pub fn clen(&self) -> u16 {
        self.comment.len() as u16
    }

    /// True when the cross-reference fields hold Zip64 sentinels and the
    /// real values live in the Zip64 end record.
    pub fn is_zip64(&self) -> bool {
        self.cen_offset == ZIP64_MAGIC && self.cen_size == ZIP64_MAGIC
    }

    /// Replace this-disk.
    pub fn with_this_disk(self, this_disk: u16) -> Self {
        EndOfCentralDirectory { this_disk, ..self }
    }

    /// Replace the start disk.
    pub fn with_start_disk(self, start_disk: u16) -> Self {
        EndOfCentralDirectory { start_disk, ..self }
    }

    /// Replace the per-disk entry count.
    pub fn with_disk_entries(self, disk_entries: u16) -> Self {
        EndOfCentralDirectory {
            disk_entries,
            ..self
        }
    }

    /// Replace the total entry count.
    pub fn with_total_entries(self, total_entries: u16) -> Self {
        EndOfCentralDirectory {
            total_entries,
            ..self
        }
    }

    /// Replace the central directory size.
    pub fn with_cen_size(self, cen_size: u32) -> Self {
        EndOfCentralDirectory { cen_size, ..self }
    }

    /// Replace the central directory offset.
    pub fn with_cen_offset(self, cen_offset: u32) -> Self {
        EndOfCentralDirectory { cen_offset, ..self }
    }

    /// Replace the archive comment.
    pub fn with_comment(self, comment: impl Into<Vec<u8>>) -> Self {
        EndOfCentralDirectory {
            comment: comment.into(),
            ..self
        }
    }

    /// Upgrade to Zip64 form: all four cross-reference fields move to their
    /// sentinels. The caller is responsible for also injecting the Zip64
    /// end record and locator in front of this record.
    pub fn to_zip64(self) -> Self {
        self.with_disk_entries(ZIP64_MAGIC_U16)
            .with_total_entries(ZIP64_MAGIC_U16)
            .with_cen_size(ZIP64_MAGIC)
            .with_cen_offset(ZIP64_MAGIC)
    }
}
