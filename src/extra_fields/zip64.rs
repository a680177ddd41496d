//! Zip64 extended information extra field (id `0x0001`).

use crate::spec::{CentralDirectoryHeader, LocalFileHeader};

/// The Zip64 extended information field.
///
/// The field layout is positional: `size`, `csize`, `local_offset` (8 bytes
/// each) then `disk_start` (4 bytes), each present only while the declared
/// `dsize` leaves room. Which of them a reader should consult is governed by
/// which fields of the owning record hold sentinel values, not by anything
/// in the field itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64Extra {
    /// Declared body size; governs which fields are present
    pub dsize: u16,
    /// Uncompressed size, 8 bytes
    pub size: Option<u64>,
    /// Compressed size, 8 bytes
    pub csize: Option<u64>,
    /// Offset of the owning entry's local header, 8 bytes
    pub local_offset: Option<u64>,
    /// Disk on which the owning entry starts, 4 bytes
    pub disk_start: Option<u32>,
}

impl Zip64Extra {
    /// Header id of the Zip64 extended information field.
    pub const ID: u16 = 0x0001;

    /// Decode the positional layout. Returns `None` when the body cannot be
    /// consumed exactly, in which case the caller keeps the raw bytes.
    pub(crate) fn parse(dsize: u16, body: &[u8]) -> Option<Self> {
        let mut rest = body;
        let mut take_u64 = || -> Option<u64> {
            if rest.len() >= 8 {
                let (head, tail) = rest.split_at(8);
                rest = tail;
                Some(u64::from_le_bytes(head.try_into().unwrap()))
            } else {
                None
            }
        };
        let size = take_u64();
        let csize = take_u64();
        let local_offset = take_u64();
        let disk_start = if rest.len() >= 4 {
            let (head, tail) = rest.split_at(4);
            rest = tail;
            Some(u32::from_le_bytes(head.try_into().unwrap()))
        } else {
            None
        };
        if !rest.is_empty() {
            return None;
        }
        Some(Zip64Extra {
            dsize,
            size,
            csize,
            local_offset,
            disk_start,
        })
    }

    pub(crate) fn body(&self) -> Vec<u8> {
        let mut data = vec![0u8; self.dsize as usize];
        let mut pos = 0;
        for value in [self.size, self.csize, self.local_offset] {
            if data.len() - pos >= 8 {
                data[pos..pos + 8].copy_from_slice(&value.unwrap_or(u64::MAX).to_le_bytes());
                pos += 8;
            }
        }
        if data.len() - pos >= 4 {
            data[pos..pos + 4].copy_from_slice(&self.disk_start.unwrap_or(u32::MAX).to_le_bytes());
        }
        data
    }

    /// The two-field variant a Zip64 local header carries: the real size and
    /// compressed size, taken from the header before its fields are replaced
    /// with sentinels.
    pub fn of_local(loc: &LocalFileHeader) -> Self {
        Zip64Extra {
            dsize: 16,
            size: Some(loc.size as u64),
            csize: Some(loc.csize as u64),
            local_offset: None,
            disk_start: None,
        }
    }

    /// The four-field variant a Zip64 central directory header carries.
    pub fn of_central(cen: &CentralDirectoryHeader) -> Self {
        Zip64Extra {
            dsize: 28,
            size: Some(cen.size as u64),
            csize: Some(cen.csize as u64),
            local_offset: Some(cen.local_offset as u64),
            disk_start: Some(cen.disk_start as u32),
        }
    }

    /// Return a copy with the uncompressed size replaced.
    pub fn with_size(self, size: u64) -> Self {
        Zip64Extra {
            size: Some(size),
            ..self
        }
    }

    /// Return a copy with the compressed size replaced.
    pub fn with_csize(self, csize: u64) -> Self {
        Zip64Extra {
            csize: Some(csize),
            ..self
        }
    }

    /// Return a copy with the local header offset replaced.
    pub fn with_local_offset(self, local_offset: u64) -> Self {
        Zip64Extra {
            local_offset: Some(local_offset),
            ..self
        }
    }

    /// Return a copy with the disk-start number replaced.
    pub fn with_disk_start(self, disk_start: u32) -> Self {
        Zip64Extra {
            disk_start: Some(disk_start),
            ..self
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_the_local_header_variant() {
        let mut body = Vec::new();
        body.extend_from_slice(&6u64.to_le_bytes());
        body.extend_from_slice(&4u64.to_le_bytes());
        let z = Zip64Extra::parse(16, &body).unwrap();
        assert_eq!(z.size, Some(6));
        assert_eq!(z.csize, Some(4));
        assert_eq!(z.local_offset, None);
        assert_eq!(z.disk_start, None);
        assert_eq!(z.body(), body);
    }

    #[test]
    fn parses_the_full_central_variant() {
        let mut body = Vec::new();
        body.extend_from_slice(&1u64.to_le_bytes());
        body.extend_from_slice(&2u64.to_le_bytes());
        body.extend_from_slice(&3u64.to_le_bytes());
        body.extend_from_slice(&4u32.to_le_bytes());
        let z = Zip64Extra::parse(28, &body).unwrap();
        assert_eq!(
            (z.size, z.csize, z.local_offset, z.disk_start),
            (Some(1), Some(2), Some(3), Some(4))
        );
        assert_eq!(z.body(), body);
    }

    #[test]
    fn rejects_unconsumable_bodies() {
        assert!(Zip64Extra::parse(6, &[0; 6]).is_none());
        assert!(Zip64Extra::parse(9, &[0; 9]).is_none());
    }
}
