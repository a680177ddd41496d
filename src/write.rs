//! Record encoder.
//!
//! [`RecordWriter`] consumes records in order and appends their wire bytes
//! to a seekable sink, tracking the running absolute offset and checking it
//! against the sink position before every record. It never rewrites prior
//! bytes. Offset fixing is on by default and can be disabled to emit
//! archives whose declared offsets or counts are deliberately false.

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::fixup::OffsetFixer;
use crate::result::{ZipError, ZipResult};
use crate::spec::{Hole, ZipRecord};
use crate::trace::Trace;

/// Holes at least this large are emitted as a seek-past sparse region
/// rather than written zeros.
const SPARSE_THRESHOLD: u64 = 4096;

/// Streaming record encoder over a seekable byte sink.
pub struct RecordWriter<W: Write + Seek> {
    sink: W,
    offset: u64,
    fixer: Option<OffsetFixer>,
    trace: Option<Trace>,
}

impl<W: Write + Seek> RecordWriter<W> {
    /// An encoder over `sink` with offset fixing enabled and no trace.
    pub fn new(sink: W) -> Self {
        RecordWriter {
            sink,
            offset: 0,
            fixer: Some(OffsetFixer::new()),
            trace: None,
        }
    }

    /// Turn off offset re-derivation, so that size and offset fields are
    /// written exactly as the records carry them.
    pub fn disable_offset_fixing(mut self) -> Self {
        self.fixer = None;
        self
    }

    /// Write a human-readable disassembly of every record to `sink` as it
    /// is encoded. Records are traced after offset fixing.
    pub fn trace<T: Write + 'static>(mut self, sink: T) -> Self {
        self.trace = Some(Trace::new(Box::new(sink)));
        self
    }

    /// Encode one record.
    pub fn write(&mut self, rec: ZipRecord) -> ZipResult<()> {
        let position = self.sink.stream_position()?;
        if position != self.offset {
            return Err(ZipError::OffsetMismatch {
                expected: self.offset,
                actual: position,
            });
        }
        let rec = match &mut self.fixer {
            Some(fixer) => fixer.apply(rec),
            None => rec,
        };
        if let Some(trace) = &mut self.trace {
            trace.record(&rec)?;
        }
        self.offset += rec.wire_size();
        match &rec {
            ZipRecord::Local(loc) => loc.write(&mut self.sink)?,
            ZipRecord::FileData(data) => data.write_to(&mut self.sink)?,
            ZipRecord::Descriptor(desc) => desc.write(&mut self.sink)?,
            ZipRecord::Central(cen) => cen.write(&mut self.sink)?,
            ZipRecord::Zip64End(rec) => rec.write(&mut self.sink)?,
            ZipRecord::Zip64Locator(loc) => loc.write(&mut self.sink)?,
            ZipRecord::End(eoc) => eoc.write(&mut self.sink)?,
            ZipRecord::Hole(hole) => self.write_hole(hole)?,
        }
        Ok(())
    }

    /// Encode every record of a stream, stopping at the first error.
    pub fn write_all<I>(&mut self, records: I) -> ZipResult<()>
    where
        I: IntoIterator<Item = ZipResult<ZipRecord>>,
    {
        for rec in records {
            self.write(rec?)?;
        }
        Ok(())
    }

    /// Flush and return the sink.
    pub fn finish(mut self) -> ZipResult<W> {
        self.sink.flush()?;
        debug!("encoded {} bytes", self.offset);
        Ok(self.sink)
    }

    fn write_hole(&mut self, hole: &Hole) -> ZipResult<()> {
        if hole.length == 0 {
            return Ok(());
        }
        if hole.length >= SPARSE_THRESHOLD {
            // Seek past all but the final byte and write that one, so the
            // sink's logical length always covers the hole even when it is
            // the last record.
            self.sink.seek(SeekFrom::Current(hole.length as i64 - 1))?;
            self.sink.write_all(&[0])?;
        } else {
            let zeros = [0u8; 512];
            let mut remaining = hole.length;
            while remaining > 0 {
                let chunk = remaining.min(zeros.len() as u64) as usize;
                self.sink.write_all(&zeros[..chunk])?;
                remaining -= chunk as u64;
            }
        }
        Ok(())
    }
}

impl RecordWriter<Cursor<Vec<u8>>> {
    /// An encoder into a growable in-memory buffer.
    pub fn buffer() -> Self {
        RecordWriter::new(Cursor::new(Vec::new()))
    }

    /// Flush and return the encoded bytes.
    pub fn into_bytes(self) -> ZipResult<Vec<u8>> {
        Ok(self.finish()?.into_inner())
    }
}

/// Encode a record stream into a byte buffer with offset fixing enabled.
pub fn to_bytes<I>(records: I) -> ZipResult<Vec<u8>>
where
    I: IntoIterator<Item = ZipResult<ZipRecord>>,
{
    let mut writer = RecordWriter::buffer();
    writer.write_all(records)?;
    writer.into_bytes()
}

/// Encode a record stream into a file with offset fixing enabled. The file
/// is created, or truncated if it exists.
pub fn to_file<P, I>(path: P, records: I) -> ZipResult<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = ZipResult<ZipRecord>>,
{
    let file = File::create(path)?;
    let mut writer = RecordWriter::new(BufWriter::new(file));
    writer.write_all(records)?;
    writer.finish()?;
    Ok(())
}
