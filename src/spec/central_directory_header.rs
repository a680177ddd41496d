//! Central directory header record.

use std::borrow::Cow;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use time::PrimitiveDateTime;

use crate::extra_fields::{self, ExtendedTimestamp, ExtraField, NtfsTimes, Zip64Extra};
use crate::result::ZipResult;
use crate::spec::{read_bytes, ZIP64_MAGIC, ZIP64_MAGIC_U16};
use crate::types;

/// The per-entry record in the central directory.
///
/// ```text
/// central file header signature   4 bytes  (0x02014b50)
/// version made by                 2 bytes
/// version needed to extract       2 bytes
/// general purpose bit flag        2 bytes
/// compression method              2 bytes
/// last mod file time              2 bytes
/// last mod file date              2 bytes
/// crc-32                          4 bytes
/// compressed size                 4 bytes
/// uncompressed size               4 bytes
/// file name length                2 bytes
/// extra field length              2 bytes
/// file comment length             2 bytes
/// disk number start               2 bytes
/// internal file attributes        2 bytes
/// external file attributes        4 bytes
/// relative offset of local header 4 bytes
/// file name (variable size)
/// extra field (variable size)
/// file comment (variable size)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    /// Signature as stored; the decoder sets [`Self::SIG`]
    pub sig: u32,
    /// Version made by
    pub made_by_version: u16,
    /// Version needed to extract
    pub extract_version: u16,
    /// General purpose bit flag
    pub flags: u16,
    /// Compression method
    pub method: u16,
    /// Last modified time, MS-DOS packed
    pub time: u16,
    /// Last modified date, MS-DOS packed
    pub date: u16,
    /// CRC-32 of the uncompressed data
    pub crc: u32,
    /// Compressed size; [`ZIP64_MAGIC`] defers to the Zip64 extra
    pub csize: u32,
    /// Uncompressed size; [`ZIP64_MAGIC`] defers to the Zip64 extra
    pub size: u32,
    /// File name length as stored
    pub nlen: u16,
    /// Extra field length as stored
    pub elen: u16,
    /// File comment length as stored
    pub clen: u16,
    /// Disk on which the entry starts; [`ZIP64_MAGIC_U16`] defers to the
    /// Zip64 extra
    pub disk_start: u16,
    /// Internal file attributes
    pub internal_attr: u16,
    /// External file attributes
    pub external_attr: u32,
    /// Offset of the paired local header; [`ZIP64_MAGIC`] defers to the
    /// Zip64 extra
    pub local_offset: u32,
    /// File name bytes
    pub name: Vec<u8>,
    /// Extensible data fields
    pub extra: Vec<ExtraField>,
    /// File comment bytes
    pub comment: Vec<u8>,
}

impl CentralDirectoryHeader {
    /// The four-byte record signature.
    pub const SIG: u32 = 0x02014b50;

    const FIXED_SIZE: u64 = 46;

    const VERSION_ZIP64: u16 = 45;

    /// Parse the remainder of the record; the caller has consumed the
    /// signature.
    pub(crate) fn read<R: Read + ?Sized>(reader: &mut R) -> ZipResult<Self> {
        let made_by_version = reader.read_u16::<LittleEndian>()?;
        let extract_version = reader.read_u16::<LittleEndian>()?;
        let flags = reader.read_u16::<LittleEndian>()?;
        let method = reader.read_u16::<LittleEndian>()?;
        let time = reader.read_u16::<LittleEndian>()?;
        let date = reader.read_u16::<LittleEndian>()?;
        let crc = reader.read_u32::<LittleEndian>()?;
        let csize = reader.read_u32::<LittleEndian>()?;
        let size = reader.read_u32::<LittleEndian>()?;
        let nlen = reader.read_u16::<LittleEndian>()?;
        let elen = reader.read_u16::<LittleEndian>()?;
        let clen = reader.read_u16::<LittleEndian>()?;
        let disk_start = reader.read_u16::<LittleEndian>()?;
        let internal_attr = reader.read_u16::<LittleEndian>()?;
        let external_attr = reader.read_u32::<LittleEndian>()?;
        let local_offset = reader.read_u32::<LittleEndian>()?;
        let name = read_bytes(reader, nlen as usize)?;
        let extra_bytes = read_bytes(reader, elen as usize)?;
        let comment = read_bytes(reader, clen as usize)?;
        let extra = extra_fields::parse(&extra_bytes)?;
        Ok(CentralDirectoryHeader {
            sig: Self::SIG,
            made_by_version,
            extract_version,
            flags,
            method,
            time,
            date,
            crc,
            csize,
            size,
            nlen,
            elen,
            clen,
            disk_start,
            internal_attr,
            external_attr,
            local_offset,
            name,
            extra,
            comment,
        })
    }

    pub(crate) fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<LittleEndian>(self.sig)?;
        out.write_u16::<LittleEndian>(self.made_by_version)?;
        out.write_u16::<LittleEndian>(self.extract_version)?;
        out.write_u16::<LittleEndian>(self.flags)?;
        out.write_u16::<LittleEndian>(self.method)?;
        out.write_u16::<LittleEndian>(self.time)?;
        out.write_u16::<LittleEndian>(self.date)?;
        out.write_u32::<LittleEndian>(self.crc)?;
        out.write_u32::<LittleEndian>(self.csize)?;
        out.write_u32::<LittleEndian>(self.size)?;
        out.write_u16::<LittleEndian>(self.nlen)?;
        out.write_u16::<LittleEndian>(self.elen)?;
        out.write_u16::<LittleEndian>(self.clen)?;
        out.write_u16::<LittleEndian>(self.disk_start)?;
        out.write_u16::<LittleEndian>(self.internal_attr)?;
        out.write_u32::<LittleEndian>(self.external_attr)?;
        out.write_u32::<LittleEndian>(self.local_offset)?;
        out.write_all(&self.name)?;
        for field in &self.extra {
            field.write(out)?;
        }
        out.write_all(&self.comment)
    }

    /// Exact serialized length; the variable regions count their real
    /// lengths.
    pub fn wire_size(&self) -> u64 {
        Self::FIXED_SIZE
            + self.name.len() as u64
            + extra_fields::encoded_size(&self.extra)
            + self.comment.len() as u64
    }

    /// True when the size fields defer to a Zip64 extra.
    pub fn is_zip64(&self) -> bool {
        self.size == ZIP64_MAGIC
    }

    /// Compare the name against raw bytes.
    pub fn is_named(&self, name: &[u8]) -> bool {
        self.name == name
    }

    /// The name decoded as UTF-8, lossily.
    pub fn name_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// The last-modified stamp, if the packed words are a valid date.
    pub fn date_time(&self) -> Option<PrimitiveDateTime> {
        types::dos_date_time(self.date, self.time)
    }

    /// The Zip64 extended information field, if present.
    pub fn zip64_extra(&self) -> Option<&Zip64Extra> {
        self.extra.iter().find_map(|f| match f {
            ExtraField::Zip64(z) => Some(z),
            _ => None,
        })
    }

    /// The extended timestamp field, if present.
    pub fn timestamp_extra(&self) -> Option<&ExtendedTimestamp> {
        self.extra.iter().find_map(|f| match f {
            ExtraField::Timestamp(ts) => Some(ts),
            _ => None,
        })
    }

    /// The NTFS times field, if present.
    pub fn ntfs_extra(&self) -> Option<&NtfsTimes> {
        self.extra.iter().find_map(|f| match f {
            ExtraField::Ntfs(nt) => Some(nt),
            _ => None,
        })
    }

    /// The first extensible field with the given id, if any.
    pub fn find_extra(&self, id: u16) -> Option<&ExtraField> {
        self.extra.iter().find(|f| f.id() == id)
    }

    /// Replace the signature.
    pub fn with_sig(self, sig: u32) -> Self {
        CentralDirectoryHeader { sig, ..self }
    }

    /// Replace the made-by version.
    pub fn with_made_by_version(self, made_by_version: u16) -> Self {
        CentralDirectoryHeader {
            made_by_version,
            ..self
        }
    }

    /// Replace the extract version.
    pub fn with_extract_version(self, extract_version: u16) -> Self {
        CentralDirectoryHeader {
            extract_version,
            ..self
        }
    }

    /// Replace the general purpose flags.
    pub fn with_flags(self, flags: u16) -> Self {
        CentralDirectoryHeader { flags, ..self }
    }

    /// Replace the compression method.
    pub fn with_method(self, method: u16) -> Self {
        CentralDirectoryHeader { method, ..self }
    }

    /// Replace the packed modification time.
    pub fn with_time(self, time: u16) -> Self {
        CentralDirectoryHeader { time, ..self }
    }

    /// Replace the packed modification date.
    pub fn with_date(self, date: u16) -> Self {
        CentralDirectoryHeader { date, ..self }
    }

    /// Replace the crc.
    pub fn with_crc(self, crc: u32) -> Self {
        CentralDirectoryHeader { crc, ..self }
    }

    /// Replace the compressed size field.
    pub fn with_csize(self, csize: u32) -> Self {
        CentralDirectoryHeader { csize, ..self }
    }

    /// Replace the uncompressed size field.
    pub fn with_size(self, size: u32) -> Self {
        CentralDirectoryHeader { size, ..self }
    }

    /// Replace the stored name length without touching the name.
    pub fn with_nlen(self, nlen: u16) -> Self {
        CentralDirectoryHeader { nlen, ..self }
    }

    /// Replace the stored extra length without touching the extras.
    pub fn with_elen(self, elen: u16) -> Self {
        CentralDirectoryHeader { elen, ..self }
    }

    /// Replace the stored comment length without touching the comment.
    pub fn with_clen(self, clen: u16) -> Self {
        CentralDirectoryHeader { clen, ..self }
    }

    /// Replace the disk-start number.
    pub fn with_disk_start(self, disk_start: u16) -> Self {
        CentralDirectoryHeader { disk_start, ..self }
    }

    /// Replace the internal file attributes.
    pub fn with_internal_attr(self, internal_attr: u16) -> Self {
        CentralDirectoryHeader {
            internal_attr,
            ..self
        }
    }

    /// Replace the external file attributes.
    pub fn with_external_attr(self, external_attr: u32) -> Self {
        CentralDirectoryHeader {
            external_attr,
            ..self
        }
    }

    /// Replace the local header offset field.
    pub fn with_local_offset(self, local_offset: u32) -> Self {
        CentralDirectoryHeader {
            local_offset,
            ..self
        }
    }

    /// Replace the name and recompute `nlen`.
    pub fn with_name(self, name: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        CentralDirectoryHeader {
            nlen: name.len() as u16,
            name,
            ..self
        }
    }

    /// Replace the extras and recompute `elen`.
    pub fn with_extra(self, extra: Vec<ExtraField>) -> Self {
        CentralDirectoryHeader {
            elen: extra_fields::encoded_size(&extra) as u16,
            extra,
            ..self
        }
    }

    /// Rewrite each extensible field through `f`, recomputing `elen`.
    pub fn map_extra(self, f: impl FnMut(ExtraField) -> ExtraField) -> Self {
        let extra: Vec<ExtraField> = self.extra.iter().cloned().map(f).collect();
        self.with_extra(extra)
    }

    /// Replace the comment and recompute `clen`.
    pub fn with_comment(self, comment: impl Into<Vec<u8>>) -> Self {
        let comment = comment.into();
        CentralDirectoryHeader {
            clen: comment.len() as u16,
            comment,
            ..self
        }
    }

    /// Upgrade to Zip64 form: versions 45, size/offset/disk fields at their
    /// sentinels, and a fresh four-field Zip64 extra carrying the real
    /// values (replacing any existing one).
    pub fn to_zip64(self) -> Self {
        let zip64 = Zip64Extra::of_central(&self);
        let mut extra = vec![ExtraField::Zip64(zip64)];
        extra.extend(self.extra.iter().filter(|f| f.id() != Zip64Extra::ID).cloned());
        self.with_made_by_version(Self::VERSION_ZIP64)
            .with_extract_version(Self::VERSION_ZIP64)
            .with_size(ZIP64_MAGIC)
            .with_csize(ZIP64_MAGIC)
            .with_disk_start(ZIP64_MAGIC_U16)
            .with_local_offset(ZIP64_MAGIC)
            .with_extra(extra)
    }
}
