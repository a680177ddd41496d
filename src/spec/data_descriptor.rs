//! Data descriptor record.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::result::ZipResult;

/// The optional record following an entry's payload, carrying the crc and
/// sizes that were not known when the local header was written.
///
/// ```text
/// data descriptor signature       4 bytes  (0x08074b50, optional)
/// crc-32                          4 bytes
/// compressed size                 4 bytes  (8 bytes in Zip64 form)
/// uncompressed size               4 bytes  (8 bytes in Zip64 form)
/// ```
///
/// Whether the size fields are 8 bytes wide is a property of the owning
/// local header, not of the descriptor itself; the decoder stamps it here so
/// the record is self-describing from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    /// Whether the leading signature is present
    pub signed: bool,
    /// Whether the size fields serialize as 8 bytes each
    pub zip64: bool,
    /// CRC-32 of the uncompressed data
    pub crc: u32,
    /// Compressed size
    pub csize: u64,
    /// Uncompressed size
    pub size: u64,
}

impl DataDescriptor {
    /// The four-byte record signature.
    pub const SIG: u32 = 0x08074b50;

    /// Parse a descriptor. The caller has read the first four bytes and
    /// decided whether they were the signature or the crc of an unsigned
    /// descriptor.
    pub(crate) fn read<R: Read + ?Sized>(
        reader: &mut R,
        crc_or_sig: u32,
        signed: bool,
        zip64: bool,
    ) -> ZipResult<Self> {
        let crc = if signed {
            reader.read_u32::<LittleEndian>()?
        } else {
            crc_or_sig
        };
        let (csize, size) = if zip64 {
            (
                reader.read_u64::<LittleEndian>()?,
                reader.read_u64::<LittleEndian>()?,
            )
        } else {
            (
                reader.read_u32::<LittleEndian>()? as u64,
                reader.read_u32::<LittleEndian>()? as u64,
            )
        };
        Ok(DataDescriptor {
            signed,
            zip64,
            crc,
            csize,
            size,
        })
    }

    pub(crate) fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.signed {
            out.write_u32::<LittleEndian>(Self::SIG)?;
        }
        out.write_u32::<LittleEndian>(self.crc)?;
        if self.zip64 {
            out.write_u64::<LittleEndian>(self.csize)?;
            out.write_u64::<LittleEndian>(self.size)?;
        } else {
            out.write_u32::<LittleEndian>(self.csize as u32)?;
            out.write_u32::<LittleEndian>(self.size as u32)?;
        }
        Ok(())
    }

    /// Exact serialized length for the current `signed`/`zip64` shape.
    pub fn wire_size(&self) -> u64 {
        let mut size = 4; // crc
        if self.signed {
            size += 4;
        }
        size += if self.zip64 { 16 } else { 8 };
        size
    }

    /// Replace the crc.
    pub fn with_crc(self, crc: u32) -> Self {
        DataDescriptor { crc, ..self }
    }

    /// Replace the compressed size.
    pub fn with_csize(self, csize: u64) -> Self {
        DataDescriptor { csize, ..self }
    }

    /// Replace the uncompressed size.
    pub fn with_size(self, size: u64) -> Self {
        DataDescriptor { size, ..self }
    }

    /// Set or clear the leading signature.
    pub fn with_signed(self, signed: bool) -> Self {
        DataDescriptor { signed, ..self }
    }

    /// Set or clear the 8-byte size form.
    pub fn with_zip64(self, zip64: bool) -> Self {
        DataDescriptor { zip64, ..self }
    }

    /// Upgrade to the Zip64 form: sizes serialize as 8 bytes each.
    pub fn to_zip64(self) -> Self {
        self.with_zip64(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn wire_size_follows_shape() {
        let desc = DataDescriptor {
            signed: true,
            zip64: false,
            crc: 0,
            csize: 0,
            size: 0,
        };
        assert_eq!(desc.wire_size(), 16);
        assert_eq!(desc.with_signed(false).wire_size(), 12);
        assert_eq!(desc.to_zip64().wire_size(), 24);
        assert_eq!(desc.with_signed(false).to_zip64().wire_size(), 20);
    }

    #[test]
    fn unsigned_read_uses_the_leading_word_as_crc() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&8u32.to_le_bytes());
        let desc =
            DataDescriptor::read(&mut Cursor::new(bytes), 0xCAFEBABE, false, false).unwrap();
        assert_eq!(desc.crc, 0xCAFEBABE);
        assert_eq!(desc.csize, 7);
        assert_eq!(desc.size, 8);
    }
}
