//! A record-level ZIP transformer.
//!
//! `rezip` parses a byte stream holding a ZIP archive into an ordered
//! sequence of typed structural records, lets callers transform that
//! sequence with pure functions, and serializes it back into a byte stream.
//! It exists so that test authors can construct ZIP files with precisely
//! specified shapes, including invalid, unusual, or Zip64-formatted
//! archives, without hand-writing offset arithmetic or little-endian field
//! packing.
//!
//! The pipeline is `bytes -> RecordReader -> transforms -> offset fixing ->
//! RecordWriter -> bytes`. By default the writer re-derives every
//! cross-record offset and count so that the emitted archive is
//! self-consistent after arbitrary edits; disabling the fixer allows
//! deliberately malformed archives.
//!
//! ```
//! use rezip::{ArchiveBuilder, RecordStream, ZipRecord};
//!
//! # fn main() -> rezip::ZipResult<()> {
//! let zip = ArchiveBuilder::new()
//!     .deflated("entry", b"hello")
//!     .stored("stored", b"stored")
//!     .build()?;
//!
//! // Identity transform round-trips bit-exactly.
//! let out = rezip::to_bytes(rezip::stream_bytes(zip.clone()))?;
//! assert_eq!(out, zip);
//!
//! // Drop one entry; counts and offsets are re-derived on encode.
//! let filtered = rezip::to_bytes(
//!     rezip::stream_bytes(zip)
//!         .filter_entries(|loc| !loc.is_named(b"entry"))
//!         .filter_records(|rec| match rec {
//!             ZipRecord::Central(cen) => !cen.is_named(b"entry"),
//!             _ => true,
//!         }),
//! )?;
//! # let _ = filtered;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod combinators;
pub mod compression;
pub mod extra_fields;
mod fixup;
mod inflate;
pub mod read;
pub mod result;
pub mod spec;
mod trace;
pub mod types;
pub mod write;

pub use builder::ArchiveBuilder;
pub use combinators::{concat, RecordStream};
pub use extra_fields::{ExtraField, ExtendedTimestamp, GenericExtra, NtfsTimes, Zip64Extra};
pub use read::{stream, stream_bytes, RecordReader};
pub use result::{ZipError, ZipResult};
pub use spec::{
    CentralDirectoryHeader, DataDescriptor, EndOfCentralDirectory, FileData, Hole,
    LocalFileHeader, Zip64EndLocator, Zip64EndOfCentralDirectory, ZipRecord, ZIP64_MAGIC,
    ZIP64_MAGIC_U16,
};
pub use write::{to_bytes, to_file, RecordWriter};
