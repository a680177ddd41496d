//! Zip64 end of central directory locator.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::result::ZipResult;
use crate::spec::EndOfCentralDirectory;

/// The locator pointing at the Zip64 end of central directory record.
///
/// ```text
/// zip64 end of central dir locator signature                    4 bytes  (0x07064b50)
/// number of the disk with the zip64 end of central directory    4 bytes
/// relative offset of the zip64 end of central directory record  8 bytes
/// total number of disks                                         4 bytes
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64EndLocator {
    /// Disk holding the Zip64 end record
    pub end_disk: u32,
    /// Absolute offset of the Zip64 end record
    pub end_offset: u64,
    /// Total number of disks
    pub total_disks: u32,
}

impl Zip64EndLocator {
    /// The four-byte record signature.
    pub const SIG: u32 = 0x07064b50;

    const FIXED_SIZE: u64 = 20;

    /// Parse the remainder of the record; the caller has consumed the
    /// signature.
    pub(crate) fn read<R: Read + ?Sized>(reader: &mut R) -> ZipResult<Self> {
        let end_disk = reader.read_u32::<LittleEndian>()?;
        let end_offset = reader.read_u64::<LittleEndian>()?;
        let total_disks = reader.read_u32::<LittleEndian>()?;
        Ok(Zip64EndLocator {
            end_disk,
            end_offset,
            total_disks,
        })
    }

    pub(crate) fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<LittleEndian>(Self::SIG)?;
        out.write_u32::<LittleEndian>(self.end_disk)?;
        out.write_u64::<LittleEndian>(self.end_offset)?;
        out.write_u32::<LittleEndian>(self.total_disks)
    }

    /// Exact serialized length.
    pub fn wire_size(&self) -> u64 {
        Self::FIXED_SIZE
    }

    /// Build the locator for a single-disk archive; the offset fixer
    /// rewrites the end-record offset on encode.
    pub fn from_end(eoc: &EndOfCentralDirectory) -> Self {
        Zip64EndLocator {
            end_disk: eoc.start_disk as u32,
            end_offset: 0,
            total_disks: 1,
        }
    }

    /// Replace the disk number.
    pub fn with_end_disk(self, end_disk: u32) -> Self {
        Zip64EndLocator { end_disk, ..self }
    }

    /// Replace the end-record offset.
    pub fn with_end_offset(self, end_offset: u64) -> Self {
        Zip64EndLocator { end_offset, ..self }
    }

    /// Replace the total disk count.
    pub fn with_total_disks(self, total_disks: u32) -> Self {
        Zip64EndLocator {
            total_disks,
            ..self
        }
    }
}
