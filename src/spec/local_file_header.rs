//! Local file header record.

use std::borrow::Cow;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use time::PrimitiveDateTime;

use crate::extra_fields::{self, ExtendedTimestamp, ExtraField, NtfsTimes, Zip64Extra};
use crate::result::ZipResult;
use crate::spec::{read_bytes, ZIP64_MAGIC};
use crate::types;

/// The per-entry header preceding an entry's file data.
///
/// ```text
/// local file header signature     4 bytes  (0x04034b50)
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
/// file name (variable size)
/// extra field (variable size)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    /// Signature as stored; the decoder sets [`Self::SIG`]
    pub sig: u32,
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
    /// File name bytes
    pub name: Vec<u8>,
    /// Extensible data fields
    pub extra: Vec<ExtraField>,
}

impl LocalFileHeader {
    /// The four-byte record signature.
    pub const SIG: u32 = 0x04034b50;

    /// Flag bit 3: sizes and crc follow the payload in a data descriptor.
    pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

    /// Flag bit 11: name and comment are UTF-8.
    pub const FLAG_UTF8: u16 = 1 << 11;

    pub(crate) const VERSION_ZIP64: u16 = 45;

    const FIXED_SIZE: u64 = 30;

    /// Parse the remainder of the record; the caller has consumed the
    /// signature.
    pub(crate) fn read<R: Read + ?Sized>(reader: &mut R) -> ZipResult<Self> {
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
        let name = read_bytes(reader, nlen as usize)?;
        let extra_bytes = read_bytes(reader, elen as usize)?;
        let extra = extra_fields::parse(&extra_bytes)?;
        Ok(LocalFileHeader {
            sig: Self::SIG,
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
            name,
            extra,
        })
    }

    pub(crate) fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<LittleEndian>(self.sig)?;
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
        out.write_all(&self.name)?;
        for field in &self.extra {
            field.write(out)?;
        }
        Ok(())
    }

    /// Exact serialized length. The variable regions count their real
    /// lengths, not the possibly-lying `nlen`/`elen` values.
    pub fn wire_size(&self) -> u64 {
        Self::FIXED_SIZE + self.name.len() as u64 + extra_fields::encoded_size(&self.extra)
    }

    /// True when the size fields defer to a Zip64 extra.
    pub fn is_zip64(&self) -> bool {
        self.size == ZIP64_MAGIC
    }

    /// True when flag bit 3 announces a trailing data descriptor.
    pub fn has_descriptor(&self) -> bool {
        self.flags & Self::FLAG_DATA_DESCRIPTOR != 0
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

    /// The compressed size a reader should act on: the header field, or the
    /// Zip64 extra when the field holds the sentinel. `None` when the
    /// sentinel is set but no Zip64 extra carries the value.
    pub(crate) fn resolved_csize(&self) -> Option<u64> {
        if self.csize == ZIP64_MAGIC {
            self.zip64_extra().and_then(|z| z.csize)
        } else {
            Some(self.csize as u64)
        }
    }

    /// Replace the signature.
    pub fn with_sig(self, sig: u32) -> Self {
        LocalFileHeader { sig, ..self }
    }

    /// Replace the extract version.
    pub fn with_extract_version(self, extract_version: u16) -> Self {
        LocalFileHeader {
            extract_version,
            ..self
        }
    }

    /// Replace the general purpose flags.
    pub fn with_flags(self, flags: u16) -> Self {
        LocalFileHeader { flags, ..self }
    }

    /// Replace the compression method.
    pub fn with_method(self, method: u16) -> Self {
        LocalFileHeader { method, ..self }
    }

    /// Replace the packed modification time.
    pub fn with_time(self, time: u16) -> Self {
        LocalFileHeader { time, ..self }
    }

    /// Replace the packed modification date.
    pub fn with_date(self, date: u16) -> Self {
        LocalFileHeader { date, ..self }
    }

    /// Replace the crc.
    pub fn with_crc(self, crc: u32) -> Self {
        LocalFileHeader { crc, ..self }
    }

    /// Replace the compressed size field.
    pub fn with_csize(self, csize: u32) -> Self {
        LocalFileHeader { csize, ..self }
    }

    /// Replace the uncompressed size field.
    pub fn with_size(self, size: u32) -> Self {
        LocalFileHeader { size, ..self }
    }

    /// Replace the stored name length without touching the name.
    pub fn with_nlen(self, nlen: u16) -> Self {
        LocalFileHeader { nlen, ..self }
    }

    /// Replace the stored extra length without touching the extras.
    pub fn with_elen(self, elen: u16) -> Self {
        LocalFileHeader { elen, ..self }
    }

    /// Replace the name and recompute `nlen`.
    pub fn with_name(self, name: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        LocalFileHeader {
            nlen: name.len() as u16,
            name,
            ..self
        }
    }

    /// Replace the extras and recompute `elen`.
    pub fn with_extra(self, extra: Vec<ExtraField>) -> Self {
        LocalFileHeader {
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

    /// Set or clear the UTF-8 name flag.
    pub fn with_utf8(self, utf8: bool) -> Self {
        let flags = if utf8 {
            self.flags | Self::FLAG_UTF8
        } else {
            self.flags & !Self::FLAG_UTF8
        };
        LocalFileHeader { flags, ..self }
    }

    /// Upgrade to Zip64 form: extract version 45, size fields at the
    /// sentinel, and a fresh Zip64 extra carrying the real sizes (replacing
    /// any existing one).
    pub fn to_zip64(self) -> Self {
        let zip64 = Zip64Extra::of_local(&self);
        let mut extra = vec![ExtraField::Zip64(zip64)];
        extra.extend(self.extra.iter().filter(|f| f.id() != Zip64Extra::ID).cloned());
        self.with_extract_version(Self::VERSION_ZIP64)
            .with_size(ZIP64_MAGIC)
            .with_csize(ZIP64_MAGIC)
            .with_extra(extra)
    }
}
