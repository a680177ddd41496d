//! Synthetic hole record.

/// A run of zero bytes with no structural meaning, used to emit sparse
/// archives for size-boundary tests. Never produced by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hole {
    /// Number of zero bytes to emit
    pub length: u64,
}

impl Hole {
    /// A hole of `length` zero bytes.
    pub fn new(length: u64) -> Self {
        Hole { length }
    }

    /// Bytes this record occupies on the wire.
    pub fn wire_size(&self) -> u64 {
        self.length
    }
}
