//! The typed record model of the ZIP physical layout.
//!
//! An archive is an ordered sequence of records:
//!
//! ```text
//! [local file header 1]                     (0x04034b50)
//! [file data 1]                             (raw, possibly compressed)
//! [data descriptor 1]                       (0x08074b50, optional)
//! ...
//! [central directory header 1]              (0x02014b50)
//! ...
//! [central directory header n]              (0x02014b50)
//! [zip64 end of central directory record]   (0x06064b50, optional)
//! [zip64 end of central directory locator]  (0x07064b50, optional)
//! [end of central directory record]         (0x06054b50)
//! ```
//!
//! Records are immutable value types: public fields, `with_*` withers that
//! return an updated copy, and an exact `wire_size`. The decoder
//! manufactures them, combinators rewrite them, the encoder consumes them.
//! Length-prefix fields (`nlen`, `elen`, `clen`) are stored independently of
//! the regions they describe so tests can write headers that lie.

use std::io::{self, Read};

mod central_directory_header;
mod data_descriptor;
mod end_of_central_directory_record;
mod file_data;
mod hole;
mod local_file_header;
mod zip64_end_of_central_directory_locator;
mod zip64_end_of_central_directory_record;

pub use central_directory_header::CentralDirectoryHeader;
pub use data_descriptor::DataDescriptor;
pub use end_of_central_directory_record::EndOfCentralDirectory;
pub use file_data::FileData;
pub(crate) use file_data::SharedSource;
pub use hole::Hole;
pub use local_file_header::LocalFileHeader;
pub use zip64_end_of_central_directory_locator::Zip64EndLocator;
pub use zip64_end_of_central_directory_record::Zip64EndOfCentralDirectory;

/// Sentinel for 32-bit size, offset and count fields whose real value lives
/// in a [`crate::extra_fields::Zip64Extra`].
pub const ZIP64_MAGIC: u32 = 0xFFFF_FFFF;

/// Sentinel for 16-bit fields whose real value lives in a
/// [`crate::extra_fields::Zip64Extra`].
pub const ZIP64_MAGIC_U16: u16 = 0xFFFF;

/// One structural element of a ZIP archive.
#[derive(Debug, Clone)]
pub enum ZipRecord {
    /// Local file header
    Local(LocalFileHeader),
    /// The payload following a local file header
    FileData(FileData),
    /// Optional data descriptor following a payload
    Descriptor(DataDescriptor),
    /// Central directory header
    Central(CentralDirectoryHeader),
    /// Zip64 end of central directory record
    Zip64End(Zip64EndOfCentralDirectory),
    /// Zip64 end of central directory locator
    Zip64Locator(Zip64EndLocator),
    /// End of central directory record
    End(EndOfCentralDirectory),
    /// A synthetic run of zero bytes; never produced by the decoder
    Hole(Hole),
}

impl ZipRecord {
    /// Exact number of bytes this record serializes to.
    pub fn wire_size(&self) -> u64 {
        match self {
            ZipRecord::Local(loc) => loc.wire_size(),
            ZipRecord::FileData(data) => data.wire_size(),
            ZipRecord::Descriptor(desc) => desc.wire_size(),
            ZipRecord::Central(cen) => cen.wire_size(),
            ZipRecord::Zip64End(rec) => rec.wire_size(),
            ZipRecord::Zip64Locator(loc) => loc.wire_size(),
            ZipRecord::End(eoc) => eoc.wire_size(),
            ZipRecord::Hole(hole) => hole.wire_size(),
        }
    }

    /// True for the Zip64 end record and its locator.
    pub fn is_zip64_end(&self) -> bool {
        matches!(self, ZipRecord::Zip64End(_) | ZipRecord::Zip64Locator(_))
    }
}

pub(crate) fn read_bytes<R: Read + ?Sized>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}
