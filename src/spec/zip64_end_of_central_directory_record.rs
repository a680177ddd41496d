//! Zip64 end of central directory record.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::extra_fields::{self, ExtraField};
use crate::result::{ZipError, ZipResult};
use crate::spec::{read_bytes, EndOfCentralDirectory};

/// The Zip64 end of central directory record.
///
/// ```text
/// zip64 end of central dir signature                              4 bytes  (0x06064b50)
/// size of zip64 end of central directory record                   8 bytes
/// version made by                                                 2 bytes
/// version needed to extract                                       2 bytes
/// number of this disk                                             4 bytes
/// number of the disk with the start of the central directory      4 bytes
/// total number of entries in the central directory on this disk   8 bytes
/// total number of entries in the central directory                8 bytes
/// size of the central directory                                   8 bytes
/// offset of central directory with respect of disk number         8 bytes
/// zip64 extensible data sector                                    (variable size)
/// ```
///
/// The record-size field counts everything after itself, so the canonical
/// value is 44 plus the extensible data sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip64EndOfCentralDirectory {
    /// Signature as stored; the decoder sets [`Self::SIG`]
    pub sig: u32,
    /// Size of the remainder of the record
    pub record_size: u64,
    /// Version made by
    pub made_by_version: u16,
    /// Version needed to extract
    pub extract_version: u16,
    /// Number of this disk
    pub this_disk: u32,
    /// Disk holding the start of the central directory
    pub start_disk: u32,
    /// Central directory entries on this disk
    pub disk_entries: u64,
    /// Central directory entries in total
    pub total_entries: u64,
    /// Central directory size in bytes
    pub cen_size: u64,
    /// Offset of the first central directory header
    pub cen_offset: u64,
    /// Extensible data sector
    pub extra: Vec<ExtraField>,
}

impl Zip64EndOfCentralDirectory {
    /// The four-byte record signature.
    pub const SIG: u32 = 0x06064b50;

    const FIXED_SIZE: u64 = 56;

    /// Record size with an empty extensible data sector.
    const BASE_RECORD_SIZE: u64 = Self::FIXED_SIZE - 12;

    const VERSION_ZIP64: u16 = 45;

    /// Parse the remainder of the record; the caller has consumed the
    /// signature. The extensible data sector length follows from the
    /// record-size field.
    pub(crate) fn read<R: Read + ?Sized>(reader: &mut R) -> ZipResult<Self> {
        let record_size = reader.read_u64::<LittleEndian>()?;
        let made_by_version = reader.read_u16::<LittleEndian>()?;
        let extract_version = reader.read_u16::<LittleEndian>()?;
        let this_disk = reader.read_u32::<LittleEndian>()?;
        let start_disk = reader.read_u32::<LittleEndian>()?;
        let disk_entries = reader.read_u64::<LittleEndian>()?;
        let total_entries = reader.read_u64::<LittleEndian>()?;
        let cen_size = reader.read_u64::<LittleEndian>()?;
        let cen_offset = reader.read_u64::<LittleEndian>()?;
        let variable = record_size
            .checked_add(12)
            .and_then(|v| v.checked_sub(Self::FIXED_SIZE))
            .ok_or(ZipError::InvalidArchive(
                "zip64 end of central directory record size is too small",
            ))?;
        let ext_bytes = read_bytes(reader, variable as usize)?;
        let extra = extra_fields::parse(&ext_bytes)?;
        Ok(Zip64EndOfCentralDirectory {
            sig: Self::SIG,
            record_size,
            made_by_version,
            extract_version,
            this_disk,
            start_disk,
            disk_entries,
            total_entries,
            cen_size,
            cen_offset,
            extra,
        })
    }

    pub(crate) fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<LittleEndian>(self.sig)?;
        out.write_u64::<LittleEndian>(self.record_size)?;
        out.write_u16::<LittleEndian>(self.made_by_version)?;
        out.write_u16::<LittleEndian>(self.extract_version)?;
        out.write_u32::<LittleEndian>(self.this_disk)?;
        out.write_u32::<LittleEndian>(self.start_disk)?;
        out.write_u64::<LittleEndian>(self.disk_entries)?;
        out.write_u64::<LittleEndian>(self.total_entries)?;
        out.write_u64::<LittleEndian>(self.cen_size)?;
        out.write_u64::<LittleEndian>(self.cen_offset)?;
        for field in &self.extra {
            field.write(out)?;
        }
        Ok(())
    }

    /// Exact serialized length.
    pub fn wire_size(&self) -> u64 {
        Self::FIXED_SIZE + extra_fields::encoded_size(&self.extra)
    }

    /// Build the Zip64 end record matching a legacy end record. The offset
    /// fixer rewrites the cross-reference fields on encode.
    pub fn from_end(eoc: &EndOfCentralDirectory) -> Self {
        Zip64EndOfCentralDirectory {
            sig: Self::SIG,
            record_size: Self::BASE_RECORD_SIZE,
            made_by_version: Self::VERSION_ZIP64,
            extract_version: Self::VERSION_ZIP64,
            this_disk: eoc.this_disk as u32,
            start_disk: eoc.start_disk as u32,
            disk_entries: eoc.disk_entries as u64,
            total_entries: eoc.total_entries as u64,
            cen_size: eoc.cen_size as u64,
            cen_offset: eoc.cen_offset as u64,
            extra: Vec::new(),
        }
    }

    /// Replace the signature.
    pub fn with_sig(self, sig: u32) -> Self {
        Zip64EndOfCentralDirectory { sig, ..self }
    }

    /// Replace the record-size field without touching the extras.
    pub fn with_record_size(self, record_size: u64) -> Self {
        Zip64EndOfCentralDirectory {
            record_size,
            ..self
        }
    }

    /// Replace the made-by version.
    pub fn with_made_by_version(self, made_by_version: u16) -> Self {
        Zip64EndOfCentralDirectory {
            made_by_version,
            ..self
        }
    }

    /// Replace the extract version.
    pub fn with_extract_version(self, extract_version: u16) -> Self {
        Zip64EndOfCentralDirectory {
            extract_version,
            ..self
        }
    }

    /// Replace this-disk.
    pub fn with_this_disk(self, this_disk: u32) -> Self {
        Zip64EndOfCentralDirectory { this_disk, ..self }
    }

    /// Replace the start disk.
    pub fn with_start_disk(self, start_disk: u32) -> Self {
        Zip64EndOfCentralDirectory { start_disk, ..self }
    }

    /// Replace the per-disk entry count.
    pub fn with_disk_entries(self, disk_entries: u64) -> Self {
        Zip64EndOfCentralDirectory {
            disk_entries,
            ..self
        }
    }

    /// Replace the total entry count.
    pub fn with_total_entries(self, total_entries: u64) -> Self {
        Zip64EndOfCentralDirectory {
            total_entries,
            ..self
        }
    }

    /// Replace the central directory size.
    pub fn with_cen_size(self, cen_size: u64) -> Self {
        Zip64EndOfCentralDirectory { cen_size, ..self }
    }

    /// Replace the central directory offset.
    pub fn with_cen_offset(self, cen_offset: u64) -> Self {
        Zip64EndOfCentralDirectory { cen_offset, ..self }
    }

    /// Replace the extensible data sector and recompute the record size.
    pub fn with_extra(self, extra: Vec<ExtraField>) -> Self {
        Zip64EndOfCentralDirectory {
            record_size: Self::BASE_RECORD_SIZE + extra_fields::encoded_size(&extra),
            extra,
            ..self
        }
    }
}
