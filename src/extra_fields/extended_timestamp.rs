//! Info-ZIP extended timestamp field (id `0x5455`).

/// Extended timestamp with times in Unix seconds since the epoch.
///
/// The flags byte records which of modify/access/create the producer knows
/// about; which values are actually present in a given header is determined
/// by the field's size. Central directory headers conventionally carry only
/// the modification time even when all three flag bits are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedTimestamp {
    /// Bit 0 modify, bit 1 access, bit 2 create
    pub flags: u8,
    mod_time: Option<u32>,
    ac_time: Option<u32>,
    cr_time: Option<u32>,
}

impl ExtendedTimestamp {
    /// Header id of the extended timestamp field.
    pub const ID: u16 = 0x5455;

    /// Flag bit: modification time present.
    pub const MODIFY: u8 = 0x1;
    /// Flag bit: access time present.
    pub const ACCESS: u8 = 0x2;
    /// Flag bit: creation time present.
    pub const CREATE: u8 = 0x4;

    /// An empty timestamp field with no times set.
    pub fn new() -> Self {
        ExtendedTimestamp {
            flags: 0,
            mod_time: None,
            ac_time: None,
            cr_time: None,
        }
    }

    /// Decode a body; times are assigned positionally for as long as the
    /// body has room. Returns `None` if the body cannot be consumed exactly.
    pub(crate) fn parse(body: &[u8]) -> Option<Self> {
        let (&flags, mut rest) = body.split_first()?;
        let mut take_u32 = || -> Option<u32> {
            if rest.len() >= 4 {
                let (head, tail) = rest.split_at(4);
                rest = tail;
                Some(u32::from_le_bytes(head.try_into().unwrap()))
            } else {
                None
            }
        };
        let mod_time = take_u32();
        let ac_time = take_u32();
        let cr_time = take_u32();
        if !rest.is_empty() {
            return None;
        }
        Some(ExtendedTimestamp {
            flags,
            mod_time,
            ac_time,
            cr_time,
        })
    }

    pub(crate) fn body(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.dsize() as usize);
        data.push(self.flags);
        for time in [self.mod_time, self.ac_time, self.cr_time]
            .into_iter()
            .flatten()
        {
            data.extend_from_slice(&time.to_le_bytes());
        }
        data
    }

    pub(crate) fn dsize(&self) -> u16 {
        1 + 4 * [self.mod_time, self.ac_time, self.cr_time]
            .iter()
            .filter(|t| t.is_some())
            .count() as u16
    }

    /// Set the modification time and its flag bit.
    pub fn last_modified(self, unix_seconds: u32) -> Self {
        ExtendedTimestamp {
            flags: self.flags | Self::MODIFY,
            mod_time: Some(unix_seconds),
            ..self
        }
    }

    /// Set the access time and its flag bit.
    pub fn last_accessed(self, unix_seconds: u32) -> Self {
        ExtendedTimestamp {
            flags: self.flags | Self::ACCESS,
            ac_time: Some(unix_seconds),
            ..self
        }
    }

    /// Set the creation time and its flag bit.
    pub fn created(self, unix_seconds: u32) -> Self {
        ExtendedTimestamp {
            flags: self.flags | Self::CREATE,
            cr_time: Some(unix_seconds),
            ..self
        }
    }

    /// Modification time, if present in this field.
    pub fn mod_time(&self) -> Option<u32> {
        self.mod_time
    }

    /// Access time, if present in this field.
    pub fn ac_time(&self) -> Option<u32> {
        self.ac_time
    }

    /// Creation time, if present in this field.
    pub fn cr_time(&self) -> Option<u32> {
        self.cr_time
    }
}

impl Default for ExtendedTimestamp {
    fn default() -> Self {
        Self::new()
    }
}
