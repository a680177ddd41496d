//! A compliant archive producer.
//!
//! Transform tests need well-formed inputs. The builder constructs
//! single-disk archives out of the record model itself and encodes them
//! with offset fixing enabled, so the cross-record fields of the result are
//! correct by construction. Deflated entries are written in streaming
//! style (zero sizes in the local header, signed data descriptor); stored
//! entries carry their sizes and crc inline.

use crc32fast::Hasher;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;

use crate::compression::{DEFLATED, STORED};
use crate::extra_fields::ExtraField;
use crate::result::ZipResult;
use crate::spec::{
    CentralDirectoryHeader, DataDescriptor, EndOfCentralDirectory, FileData, LocalFileHeader,
    ZipRecord,
};
use crate::write;

// 2020-01-01 13:42:34, so builder output is byte-reproducible.
const DEFAULT_DOS_TIME: u16 = 0x6D51;
const DEFAULT_DOS_DATE: u16 = 0x5021;

struct Entry {
    name: Vec<u8>,
    data: Vec<u8>,
    method: u16,
    descriptor: bool,
    comment: Vec<u8>,
    extra: Vec<ExtraField>,
}

/// Builder for well-formed test archives.
pub struct ArchiveBuilder {
    entries: Vec<Entry>,
    time: u16,
    date: u16,
    comment: Vec<u8>,
}

impl ArchiveBuilder {
    /// An empty archive.
    pub fn new() -> Self {
        ArchiveBuilder {
            entries: Vec::new(),
            time: DEFAULT_DOS_TIME,
            date: DEFAULT_DOS_DATE,
            comment: Vec::new(),
        }
    }

    /// Add a deflated entry written in streaming style: flag bit 3 set,
    /// zero crc and sizes in the local header, signed data descriptor after
    /// the payload.
    pub fn deflated(mut self, name: impl Into<Vec<u8>>, data: impl AsRef<[u8]>) -> Self {
        self.entries.push(Entry {
            name: name.into(),
            data: data.as_ref().to_vec(),
            method: DEFLATED,
            descriptor: true,
            comment: Vec::new(),
            extra: Vec::new(),
        });
        self
    }

    /// Add a stored entry with sizes and crc in the local header.
    pub fn stored(mut self, name: impl Into<Vec<u8>>, data: impl AsRef<[u8]>) -> Self {
        self.entries.push(Entry {
            name: name.into(),
            data: data.as_ref().to_vec(),
            method: STORED,
            descriptor: false,
            comment: Vec::new(),
            extra: Vec::new(),
        });
        self
    }

    /// Attach a central directory comment to the most recent entry.
    pub fn entry_comment(mut self, comment: impl Into<Vec<u8>>) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.comment = comment.into();
        }
        self
    }

    /// Attach extensible fields to the most recent entry, in both its local
    /// and central header.
    pub fn entry_extra(mut self, extra: Vec<ExtraField>) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.extra = extra;
        }
        self
    }

    /// Set the archive comment on the end record.
    pub fn archive_comment(mut self, comment: impl Into<Vec<u8>>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Override the packed modification stamp used for every entry.
    pub fn modified(mut self, date: u16, time: u16) -> Self {
        self.date = date;
        self.time = time;
        self
    }

    /// Encode the archive.
    pub fn build(&self) -> ZipResult<Vec<u8>> {
        let mut records: Vec<ZipRecord> = Vec::new();
        let mut centrals: Vec<ZipRecord> = Vec::new();
        for entry in &self.entries {
            let crc = crc32(&entry.data);
            let payload = match entry.method {
                DEFLATED => deflate(&entry.data),
                _ => entry.data.clone(),
            };
            let csize = payload.len() as u32;
            let size = entry.data.len() as u32;
            let extract_version = if entry.method == DEFLATED { 20 } else { 10 };
            let mut flags = LocalFileHeader::FLAG_UTF8;
            if entry.descriptor {
                flags |= LocalFileHeader::FLAG_DATA_DESCRIPTOR;
            }

            let loc = LocalFileHeader {
                sig: LocalFileHeader::SIG,
                extract_version,
                flags,
                method: entry.method,
                time: self.time,
                date: self.date,
                crc: if entry.descriptor { 0 } else { crc },
                csize: if entry.descriptor { 0 } else { csize },
                size: if entry.descriptor { 0 } else { size },
                nlen: entry.name.len() as u16,
                elen: 0,
                name: entry.name.clone(),
                extra: Vec::new(),
            }
            .with_extra(entry.extra.clone());
            records.push(ZipRecord::Local(loc));
            records.push(ZipRecord::FileData(FileData::from_vec(payload)));
            if entry.descriptor {
                records.push(ZipRecord::Descriptor(DataDescriptor {
                    signed: true,
                    zip64: false,
                    crc,
                    csize: csize as u64,
                    size: size as u64,
                }));
            }

            let cen = CentralDirectoryHeader {
                sig: CentralDirectoryHeader::SIG,
                made_by_version: extract_version,
                extract_version,
                flags,
                method: entry.method,
                time: self.time,
                date: self.date,
                crc,
                csize,
                size,
                nlen: entry.name.len() as u16,
                elen: 0,
                clen: entry.comment.len() as u16,
                disk_start: 0,
                internal_attr: 0,
                external_attr: 0,
                local_offset: 0, // derived on encode
                name: entry.name.clone(),
                extra: Vec::new(),
                comment: entry.comment.clone(),
            }
            .with_extra(entry.extra.clone());
            centrals.push(ZipRecord::Central(cen));
        }
        records.extend(centrals);
        records.push(ZipRecord::End(EndOfCentralDirectory {
            this_disk: 0,
            start_disk: 0,
            disk_entries: 0, // derived on encode
            total_entries: 0,
            cen_size: 0,
            cen_offset: 0,
            comment: self.comment.clone(),
        }));
        write::to_bytes(records.into_iter().map(Ok))
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    // Writing into a Vec cannot fail.
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::read::stream_bytes;

    #[test]
    fn builds_a_decodable_two_entry_archive() {
        let zip = ArchiveBuilder::new()
            .deflated("entry", b"hello")
            .stored("stored", b"stored")
            .build()
            .unwrap();

        let records: Vec<ZipRecord> = stream_bytes(zip).map(Result::unwrap).collect();
        let shape: Vec<&str> = records
            .iter()
            .map(|rec| match rec {
                ZipRecord::Local(_) => "loc",
                ZipRecord::FileData(_) => "data",
                ZipRecord::Descriptor(_) => "desc",
                ZipRecord::Central(_) => "cen",
                ZipRecord::End(_) => "end",
                _ => "other",
            })
            .collect();
        assert_eq!(
            shape,
            ["loc", "data", "desc", "loc", "data", "cen", "cen", "end"]
        );
    }

    #[test]
    fn derives_counts_and_offsets() {
        let zip = ArchiveBuilder::new().stored("a", b"aa").build().unwrap();
        let records: Vec<ZipRecord> = stream_bytes(zip).map(Result::unwrap).collect();
        match records.last().unwrap() {
            ZipRecord::End(eoc) => {
                assert_eq!(eoc.total_entries, 1);
                assert_eq!(eoc.disk_entries, 1);
                assert_eq!(eoc.cen_offset as u64, 30 + 1 + 2);
                assert_eq!(eoc.cen_size as u64, 46 + 1);
            }
            other => panic!("expected end record, got {other:?}"),
        }
    }

    #[test]
    fn stored_payloads_round_trip() {
        let zip = ArchiveBuilder::new()
            .stored("stored", b"stored")
            .build()
            .unwrap();
        for rec in stream_bytes(zip) {
            if let ZipRecord::FileData(data) = rec.unwrap() {
                assert_eq!(data.to_vec().unwrap(), b"stored");
            }
        }
    }
}
