//! Streaming record decoder.
//!
//! [`stream`] and [`stream_bytes`] return a [`RecordReader`], a lazy
//! iterator yielding one [`ZipRecord`] at a time in file order. The reader
//! is a forward cursor: it never scans backwards for the central directory,
//! it simply dispatches on each record signature as it arrives. Payloads
//! are not materialized; each [`FileData`] borrows its byte range from the
//! shared source.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Cursor, Seek, SeekFrom};
use std::path::Path;
use std::rc::Rc;

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, warn};

use crate::compression;
use crate::inflate;
use crate::result::{ZipError, ZipResult};
use crate::spec::{
    CentralDirectoryHeader, DataDescriptor, EndOfCentralDirectory, FileData, LocalFileHeader,
    SharedSource, Zip64EndLocator, Zip64EndOfCentralDirectory, ZipRecord,
};

/// Stream the records of a ZIP file on disk.
///
/// The file handle is shared with the borrowed payloads the reader hands
/// out and is released once the reader and all of them are dropped.
pub fn stream<P: AsRef<Path>>(path: P) -> ZipResult<RecordReader> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    debug!("streaming records from a {len}-byte file");
    Ok(RecordReader::from_source(
        Rc::new(RefCell::new(BufReader::new(file))),
        len,
    ))
}

/// Stream the records of an in-memory ZIP archive.
pub fn stream_bytes(bytes: impl Into<Vec<u8>>) -> RecordReader {
    let bytes = bytes.into();
    let len = bytes.len() as u64;
    RecordReader::from_source(Rc::new(RefCell::new(Cursor::new(bytes))), len)
}

/// Per-entry state carried from a local header to its payload and
/// descriptor.
struct PendingEntry {
    method: u16,
    has_descriptor: bool,
    zip64: bool,
    csize: Option<u64>,
}

enum State {
    Signature,
    FileData,
    Descriptor,
}

/// Lazy iterator over the records of one archive.
///
/// Yields `Err` once and then ends if the stream is not a ZIP archive, is
/// truncated, or carries a malformed record.
pub struct RecordReader {
    source: SharedSource,
    len: u64,
    offset: u64,
    state: State,
    pending: Option<PendingEntry>,
    done: bool,
}

impl RecordReader {
    fn from_source(source: SharedSource, len: u64) -> Self {
        RecordReader {
            source,
            len,
            offset: 0,
            state: State::Signature,
            pending: None,
            done: false,
        }
    }

    fn parse_next(&mut self) -> ZipResult<ZipRecord> {
        match self.state {
            State::Signature => self.read_signature_record(),
            State::FileData => self.read_file_data(),
            State::Descriptor => self.read_descriptor(),
        }
    }

    fn read_signature_record(&mut self) -> ZipResult<ZipRecord> {
        let sig = self.source.borrow_mut().read_u32::<LittleEndian>()?;
        match sig {
            LocalFileHeader::SIG => {
                let loc = LocalFileHeader::read(&mut *self.source.borrow_mut())?;
                self.pending = Some(PendingEntry {
                    method: loc.method,
                    has_descriptor: loc.has_descriptor(),
                    zip64: loc.is_zip64(),
                    csize: loc.resolved_csize(),
                });
                self.state = State::FileData;
                Ok(ZipRecord::Local(loc))
            }
            CentralDirectoryHeader::SIG => Ok(ZipRecord::Central(CentralDirectoryHeader::read(
                &mut *self.source.borrow_mut(),
            )?)),
            Zip64EndOfCentralDirectory::SIG => Ok(ZipRecord::Zip64End(
                Zip64EndOfCentralDirectory::read(&mut *self.source.borrow_mut())?,
            )),
            Zip64EndLocator::SIG => Ok(ZipRecord::Zip64Locator(Zip64EndLocator::read(
                &mut *self.source.borrow_mut(),
            )?)),
            EndOfCentralDirectory::SIG => Ok(ZipRecord::End(EndOfCentralDirectory::read(
                &mut *self.source.borrow_mut(),
            )?)),
            _ => {
                warn!(
                    "unknown record signature 0x{sig:08x} at offset {}",
                    self.offset
                );
                Err(ZipError::UnknownSignature {
                    offset: self.offset,
                    signature: sig,
                })
            }
        }
    }

    fn read_file_data(&mut self) -> ZipResult<ZipRecord> {
        let pending = self
            .pending
            .as_ref()
            .ok_or(ZipError::InvalidArchive("file data with no local header"))?;
        let start = self.offset;

        // A deflated payload whose length the headers cannot answer (the
        // descriptor form, or a sentinel with no Zip64 extra) is measured
        // by inflating it; the output is discarded.
        let probe = pending.method == compression::DEFLATED
            && (pending.csize.is_none()
                || (pending.csize == Some(0) && pending.has_descriptor));
        let length = if probe {
            inflate::deflate_stream_length(&mut *self.source.borrow_mut())?
        } else {
            pending.csize.ok_or(ZipError::InvalidArchive(
                "size fields defer to a zip64 extra that is not present",
            ))?
        };
        self.source
            .borrow_mut()
            .seek(SeekFrom::Start(start + length))?;

        if pending.has_descriptor {
            self.state = State::Descriptor;
        } else {
            self.pending = None;
            self.state = State::Signature;
        }
        Ok(ZipRecord::FileData(FileData::borrowed(
            self.source.clone(),
            start,
            length,
        )))
    }

    fn read_descriptor(&mut self) -> ZipResult<ZipRecord> {
        let pending = self
            .pending
            .take()
            .ok_or(ZipError::InvalidArchive("data descriptor with no local header"))?;
        let mut src = self.source.borrow_mut();
        let first = src.read_u32::<LittleEndian>()?;
        let signed = first == DataDescriptor::SIG;
        let desc = DataDescriptor::read(&mut *src, first, signed, pending.zip64)?;
        drop(src);
        self.state = State::Signature;
        Ok(ZipRecord::Descriptor(desc))
    }
}

impl Iterator for RecordReader {
    type Item = ZipResult<ZipRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.len {
            return None;
        }
        let result = self.parse_next().and_then(|rec| {
            let next_offset = self.offset + rec.wire_size();
            let position = self.source.borrow_mut().stream_position()?;
            if position != next_offset {
                return Err(ZipError::OffsetMismatch {
                    expected: next_offset,
                    actual: position,
                });
            }
            self.offset = next_offset;
            Ok(rec)
        });
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}
