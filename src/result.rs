//! Error types that can be emitted from this library

use std::io;

use thiserror::Error;

/// Generic result type with ZipError as its error variant
pub type ZipResult<T> = Result<T, ZipError>;

/// Error type for record decoding and encoding
#[derive(Debug, Error)]
pub enum ZipError {
    /// An error caused by I/O on the byte source or sink
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The decoder hit a four-byte value that is not a known record signature
    #[error("unknown record signature 0x{signature:08x} at offset {offset}")]
    UnknownSignature { offset: u64, signature: u32 },

    /// The stream is structurally not a ZIP archive. The reason is enclosed.
    #[error("invalid archive: {0}")]
    InvalidArchive(&'static str),

    /// Inflate failed while measuring the compressed length of an entry
    #[error("inflate error while sizing compressed data: {0}")]
    Deflate(#[from] flate2::DecompressError),

    /// The sink or source position disagrees with the running record offset
    #[error("stream position {actual} does not match running offset {expected}")]
    OffsetMismatch { expected: u64, actual: u64 },
}
