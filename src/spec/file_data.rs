//! File data: the payload between a local header and the next record.

use std::cell::RefCell;
use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};
use std::rc::Rc;

use crate::result::ZipResult;

pub(crate) trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// A byte source shared between the decoder and the payload handles it
/// hands out. Single-threaded by design.
pub(crate) type SharedSource = Rc<RefCell<dyn ReadSeek>>;

#[derive(Clone)]
enum Contents {
    /// A lazy range into the parsed input; nothing is materialized until
    /// the payload is written or inspected.
    Borrowed {
        source: SharedSource,
        offset: u64,
        length: u64,
    },
    /// Caller-supplied bytes.
    Bytes(Vec<u8>),
}

/// An entry's payload. Holds either a lazy `(source, offset, length)` range
/// into the parsed input or an owned buffer.
///
/// The `size` used for offset accounting defaults to the contents length
/// but can be withered independently to produce archives whose declared
/// layout disagrees with their bytes.
#[derive(Clone)]
pub struct FileData {
    contents: Contents,
    size: u64,
}

impl FileData {
    /// A payload over caller-supplied bytes.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        FileData {
            contents: Contents::Bytes(data),
            size,
        }
    }

    /// A lazy payload borrowing `length` bytes at `offset` of the shared
    /// input. The input must stay alive until the payload is written.
    pub(crate) fn borrowed(source: SharedSource, offset: u64, length: u64) -> Self {
        FileData {
            contents: Contents::Borrowed {
                source,
                offset,
                length,
            },
            size: length,
        }
    }

    /// The size used for offset accounting.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The real length of the contents, regardless of the declared size.
    pub fn contents_len(&self) -> u64 {
        match &self.contents {
            Contents::Borrowed { length, .. } => *length,
            Contents::Bytes(bytes) => bytes.len() as u64,
        }
    }

    /// True when the payload still refers back into the parsed input.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.contents, Contents::Borrowed { .. })
    }

    /// Replace the declared size without touching the contents.
    pub fn with_size(self, size: u64) -> Self {
        FileData { size, ..self }
    }

    /// Replace the contents with owned bytes, updating the declared size.
    pub fn with_bytes(self, data: Vec<u8>) -> Self {
        FileData::from_vec(data)
    }

    /// Materialize the contents.
    pub fn to_vec(&self) -> ZipResult<Vec<u8>> {
        match &self.contents {
            Contents::Bytes(bytes) => Ok(bytes.clone()),
            Contents::Borrowed { .. } => {
                let mut out = Vec::with_capacity(self.contents_len() as usize);
                self.write_to(&mut out)?;
                Ok(out)
            }
        }
    }

    /// Stream the contents into `out` through a fixed-size buffer. A
    /// borrowed source has its position restored afterwards so an in-flight
    /// decode is not disturbed.
    pub(crate) fn write_to<W: Write>(&self, out: &mut W) -> ZipResult<()> {
        match &self.contents {
            Contents::Bytes(bytes) => {
                out.write_all(bytes)?;
                Ok(())
            }
            Contents::Borrowed {
                source,
                offset,
                length,
            } => {
                let mut src = source.borrow_mut();
                let orig = src.stream_position()?;
                src.seek(SeekFrom::Start(*offset))?;
                let mut buf = [0u8; 8192];
                let mut remaining = *length;
                while remaining > 0 {
                    let want = remaining.min(buf.len() as u64) as usize;
                    src.read_exact(&mut buf[..want])?;
                    out.write_all(&buf[..want])?;
                    remaining -= want as u64;
                }
                src.seek(SeekFrom::Start(orig))?;
                Ok(())
            }
        }
    }

    /// Bytes this record occupies on the wire: the declared size.
    pub fn wire_size(&self) -> u64 {
        self.size
    }
}

impl fmt::Debug for FileData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("FileData");
        debug.field("size", &self.size);
        match &self.contents {
            Contents::Borrowed { offset, length, .. } => {
                debug.field("offset", offset).field("length", length);
            }
            Contents::Bytes(bytes) => {
                debug.field("bytes", &bytes.len());
            }
        }
        debug.finish()
    }
}
