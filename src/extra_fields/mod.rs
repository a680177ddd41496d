//! Extensible data fields carried in the extras region of local headers,
//! central directory headers and the Zip64 end of central directory record.
//!
//! Each field is an `(id, dsize, body)` triplet on the wire. Known ids
//! decode to typed variants; anything else (including a known id whose body
//! does not match the canonical layout) is kept as opaque bytes so that
//! decode followed by encode reproduces the input bit for bit.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::result::{ZipError, ZipResult};

mod extended_timestamp;
mod ntfs;
mod zip64;

pub use extended_timestamp::ExtendedTimestamp;
pub use ntfs::NtfsTimes;
pub use zip64::Zip64Extra;

/// One extensible data field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraField {
    /// Zip64 extended information (id `0x0001`)
    Zip64(Zip64Extra),
    /// Info-ZIP extended timestamp (id `0x5455`)
    Timestamp(ExtendedTimestamp),
    /// NTFS file times (id `0x000a`)
    Ntfs(NtfsTimes),
    /// Any field this library does not decode
    Generic(GenericExtra),
}

impl ExtraField {
    /// The header id written for this field.
    pub fn id(&self) -> u16 {
        match self {
            ExtraField::Zip64(_) => Zip64Extra::ID,
            ExtraField::Timestamp(_) => ExtendedTimestamp::ID,
            ExtraField::Ntfs(_) => NtfsTimes::ID,
            ExtraField::Generic(g) => g.id,
        }
    }

    /// The data-size value written in this field's header.
    pub fn dsize(&self) -> u16 {
        match self {
            ExtraField::Zip64(z) => z.dsize,
            ExtraField::Timestamp(ts) => ts.dsize(),
            ExtraField::Ntfs(_) => NtfsTimes::DSIZE,
            ExtraField::Generic(g) => g.dsize,
        }
    }

    /// The encoded body bytes.
    pub(crate) fn body(&self) -> Vec<u8> {
        match self {
            ExtraField::Zip64(z) => z.body(),
            ExtraField::Timestamp(ts) => ts.body(),
            ExtraField::Ntfs(nt) => nt.body(),
            ExtraField::Generic(g) => g.data.clone(),
        }
    }

    /// Bytes this field occupies on the wire: 4-byte header plus body.
    /// The body length is authoritative even when a generic field's `dsize`
    /// header value lies about it.
    pub(crate) fn encoded_len(&self) -> u64 {
        let body_len = match self {
            ExtraField::Zip64(z) => z.dsize as u64,
            ExtraField::Timestamp(ts) => ts.dsize() as u64,
            ExtraField::Ntfs(_) => NtfsTimes::DSIZE as u64,
            ExtraField::Generic(g) => g.data.len() as u64,
        };
        4 + body_len
    }

    pub(crate) fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u16::<LittleEndian>(self.id())?;
        out.write_u16::<LittleEndian>(self.dsize())?;
        out.write_all(&self.body())
    }
}

/// An extensible field kept as opaque bytes.
///
/// `dsize` is stored separately from `data` so tests can write a header
/// that lies about the body length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericExtra {
    /// Header id
    pub id: u16,
    /// Data-size value written in the header
    pub dsize: u16,
    /// Body bytes
    pub data: Vec<u8>,
}

impl GenericExtra {
    /// A generic field whose header size matches its body.
    pub fn new(id: u16, data: Vec<u8>) -> Self {
        GenericExtra {
            id,
            dsize: data.len() as u16,
            data,
        }
    }

    /// Replace the header size value without touching the body.
    pub fn with_dsize(self, dsize: u16) -> Self {
        GenericExtra { dsize, ..self }
    }
}

/// Total wire size of an extras region.
pub(crate) fn encoded_size(fields: &[ExtraField]) -> u64 {
    fields.iter().map(ExtraField::encoded_len).sum()
}

/// Parse an extras blob into typed fields.
///
/// A `dsize` that runs past the end of the blob is fatal for the owning
/// record's parse.
pub(crate) fn parse(bytes: &[u8]) -> ZipResult<Vec<ExtraField>> {
    let mut fields = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        if rest.len() < 4 {
            return Err(ZipError::InvalidArchive("truncated extensible field header"));
        }
        let id = u16::from_le_bytes([rest[0], rest[1]]);
        let dsize = u16::from_le_bytes([rest[2], rest[3]]);
        let body_end = 4 + dsize as usize;
        if rest.len() < body_end {
            return Err(ZipError::InvalidArchive(
                "extensible field size exceeds the extras region",
            ));
        }
        let body = &rest[4..body_end];
        let field = match id {
            Zip64Extra::ID => Zip64Extra::parse(dsize, body).map(ExtraField::Zip64),
            ExtendedTimestamp::ID => ExtendedTimestamp::parse(body).map(ExtraField::Timestamp),
            NtfsTimes::ID => NtfsTimes::parse(body).map(ExtraField::Ntfs),
            _ => None,
        }
        .unwrap_or_else(|| ExtraField::Generic(GenericExtra::new(id, body.to_vec())));
        fields.push(field);
        rest = &rest[body_end..];
    }
    Ok(fields)
}

/// Human-readable name of an extensible-field id, for trace output.
pub fn describe(id: u16) -> &'static str {
    match id {
        0x0001 => "Zip64 extended information extra field",
        0x0007 => "AV Info",
        0x0008 => "Reserved for extended language encoding data (PFS)",
        0x0009 => "OS/2",
        0x000a => "NTFS (Win9x/WinNT FileTimes)",
        0x000c => "OpenVMS",
        0x000d => "UNIX",
        0x000e => "Reserved for file stream and fork descriptors",
        0x000f => "Patch Descriptor",
        0x0014 => "PKCS#7 Store for X.509 Certificates",
        0x0015 => "X.509 Certificate ID and Signature for individual file",
        0x0016 => "X.509 Certificate ID for Central Directory",
        0x0017 => "Strong Encryption Header",
        0x0018 => "Record Management Controls",
        0x0019 => "PKCS#7 Encryption Recipient Certificate List",
        0x0020 => "Reserved for Timestamp record",
        0x0021 => "Policy Decryption Key Record",
        0x0022 => "Smartcrypt Key Provider Record",
        0x0023 => "Smartcrypt Policy Key Data Record",
        0x0065 => "IBM S/390 (Z390), AS/400 (I400) attributes - uncompressed",
        0x0066 => "Reserved for IBM S/390 (Z390), AS/400 (I400) attributes - compressed",
        0x4690 => "POSZIP 4690 (reserved)",
        0x07c8 => "Macintosh",
        0x2605 => "ZipIt Macintosh",
        0x2705 | 0x2805 => "ZipIt Macintosh 1.3.5+",
        0x334d => "Info-ZIP Macintosh",
        0x4341 => "Acorn/SparkFS",
        0x4453 => "Windows NT security descriptor (binary ACL)",
        0x4704 => "VM/CMS",
        0x470f => "MVS",
        0x4b46 => "FWKCS MD5",
        0x4c41 => "OS/2 access control list (text ACL)",
        0x4d49 => "Info-ZIP OpenVMS",
        0x4f4c => "Xceed original location extra field",
        0x5356 => "AOS/VS (ACL)",
        0x5455 => "Extended timestamp",
        0x554e => "Xceed unicode extra field",
        0x5855 => "Info-ZIP UNIX (original, also OS/2, NT, etc)",
        0x6375 => "Info-ZIP Unicode Comment Extra Field",
        0x6542 => "BeOS/BeBox",
        0x7075 => "Info-ZIP Unicode Path Extra Field",
        0x756e => "ASi UNIX",
        0x7855 => "Info-ZIP UNIX (new)",
        0x7875 => "Info-ZIP UNIX (newer UID/GID)",
        0xa11e => "Data Stream Alignment (Apache Commons-Compress)",
        0xa220 => "Microsoft Open Packaging Growth Hint",
        0xfd4a => "SMS/QDOS",
        0x9901 => "AE-x encryption structure",
        _ => "Unknown extended field",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn round_trip(bytes: &[u8]) -> Vec<u8> {
        let fields = parse(bytes).unwrap();
        let mut out = Vec::new();
        for f in &fields {
            f.write(&mut out).unwrap();
        }
        out
    }

    #[test]
    fn unknown_id_round_trips_as_generic() {
        let blob = [0xde, 0xc0, 0x03, 0x00, 1, 2, 3];
        let fields = parse(&blob).unwrap();
        assert!(matches!(fields[0], ExtraField::Generic(_)));
        assert_eq!(round_trip(&blob), blob);
    }

    #[test]
    fn zip64_with_unaligned_body_falls_back_to_generic() {
        // dsize 6 cannot hold any of the greedy field layout exactly
        let blob = [0x01, 0x00, 0x06, 0x00, 1, 2, 3, 4, 5, 6];
        let fields = parse(&blob).unwrap();
        assert!(matches!(fields[0], ExtraField::Generic(_)));
        assert_eq!(round_trip(&blob), blob);
    }

    #[test]
    fn oversized_dsize_is_fatal() {
        let blob = [0x01, 0x00, 0x10, 0x00, 0, 0];
        assert!(parse(&blob).is_err());
    }

    #[test]
    fn trailing_partial_header_is_fatal() {
        let blob = [0x55, 0x54];
        assert!(parse(&blob).is_err());
    }
}
