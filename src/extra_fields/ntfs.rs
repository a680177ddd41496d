//! NTFS file times field (id `0x000a`).

/// NTFS file times: three 64-bit Windows timestamps in 100-nanosecond ticks
/// since 1601-01-01.
///
/// Only the canonical 32-byte layout (reserved dword, one attribute with tag
/// `0x0001` and size 24) is decoded; any other shape stays generic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NtfsTimes {
    /// Reserved dword, normally zero
    pub reserved: u32,
    /// Last modification time, NTFS ticks
    pub mtime: u64,
    /// Last access time, NTFS ticks
    pub atime: u64,
    /// Creation time, NTFS ticks
    pub ctime: u64,
}

/// Microseconds between 1601-01-01 and 1970-01-01.
const WINDOWS_EPOCH_IN_MICROSECONDS: i64 = -11_644_473_600_000_000;

impl NtfsTimes {
    /// Header id of the NTFS times field.
    pub const ID: u16 = 0x000a;
    /// Attribute tag carrying the three file times.
    pub const TIME_TAG: u16 = 0x0001;
    /// Size of the file-time attribute body.
    pub const TIME_TAG_SIZE: u16 = 24;
    /// Canonical body size of the whole field.
    pub const DSIZE: u16 = 32;

    /// Build from three Unix-microsecond timestamps.
    pub fn from_unix_micros(mtime: i64, atime: i64, ctime: i64) -> Self {
        NtfsTimes {
            reserved: 0,
            mtime: Self::to_ntfs(mtime),
            atime: Self::to_ntfs(atime),
            ctime: Self::to_ntfs(ctime),
        }
    }

    /// Unix microseconds to NTFS ticks.
    pub fn to_ntfs(unix_micros: i64) -> u64 {
        ((unix_micros - WINDOWS_EPOCH_IN_MICROSECONDS) * 10) as u64
    }

    /// NTFS ticks to Unix microseconds.
    pub fn to_unix_micros(ntfs_ticks: u64) -> i64 {
        ntfs_ticks as i64 / 10 + WINDOWS_EPOCH_IN_MICROSECONDS
    }

    pub(crate) fn parse(body: &[u8]) -> Option<Self> {
        if body.len() != Self::DSIZE as usize {
            return None;
        }
        let reserved = u32::from_le_bytes(body[0..4].try_into().unwrap());
        let tag = u16::from_le_bytes(body[4..6].try_into().unwrap());
        let size = u16::from_le_bytes(body[6..8].try_into().unwrap());
        if tag != Self::TIME_TAG || size != Self::TIME_TAG_SIZE {
            return None;
        }
        Some(NtfsTimes {
            reserved,
            mtime: u64::from_le_bytes(body[8..16].try_into().unwrap()),
            atime: u64::from_le_bytes(body[16..24].try_into().unwrap()),
            ctime: u64::from_le_bytes(body[24..32].try_into().unwrap()),
        })
    }

    pub(crate) fn body(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::DSIZE as usize);
        data.extend_from_slice(&self.reserved.to_le_bytes());
        data.extend_from_slice(&Self::TIME_TAG.to_le_bytes());
        data.extend_from_slice(&Self::TIME_TAG_SIZE.to_le_bytes());
        data.extend_from_slice(&self.mtime.to_le_bytes());
        data.extend_from_slice(&self.atime.to_le_bytes());
        data.extend_from_slice(&self.ctime.to_le_bytes());
        data
    }

    /// Return a copy with the modification time replaced, in Unix micros.
    pub fn last_modified(self, unix_micros: i64) -> Self {
        NtfsTimes {
            mtime: Self::to_ntfs(unix_micros),
            ..self
        }
    }

    /// Return a copy with the access time replaced, in Unix micros.
    pub fn last_accessed(self, unix_micros: i64) -> Self {
        NtfsTimes {
            atime: Self::to_ntfs(unix_micros),
            ..self
        }
    }

    /// Return a copy with the creation time replaced, in Unix micros.
    pub fn created(self, unix_micros: i64) -> Self {
        NtfsTimes {
            ctime: Self::to_ntfs(unix_micros),
            ..self
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unix_conversion_round_trips() {
        let micros = 1_577_885_000_123_456i64;
        assert_eq!(NtfsTimes::to_unix_micros(NtfsTimes::to_ntfs(micros)), micros);
    }

    #[test]
    fn canonical_body_round_trips() {
        let times = NtfsTimes::from_unix_micros(1, 2, 3);
        let parsed = NtfsTimes::parse(&times.body()).unwrap();
        assert_eq!(parsed, times);
    }

    #[test]
    fn non_canonical_layouts_are_rejected() {
        let times = NtfsTimes::from_unix_micros(1, 2, 3);
        let mut body = times.body();
        body[4] = 0x2; // unknown attribute tag
        assert!(NtfsTimes::parse(&body).is_none());
        body.push(0);
        assert!(NtfsTimes::parse(&body).is_none());
    }
}
