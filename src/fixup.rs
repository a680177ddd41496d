//! Offset and size re-derivation.
//!
//! After arbitrary edits the position- and count-dependent fields of a
//! record stream no longer describe its actual layout. The fixer is a
//! stateful one-pass rewrite applied in emission order, just before
//! encoding: it records where each local header lands, pairs central
//! directory headers to those offsets by ordinal, and rewrites the central
//! directory size, offset and entry counts in the end records.
//!
//! It contains the only writes of these cross-cutting values; combinators
//! rely on it instead of hand-editing both sides of a sentinel.

use crate::extra_fields::ExtraField;
use crate::spec::{ZipRecord, ZIP64_MAGIC};

pub(crate) struct OffsetFixer {
    offset: u64,
    local_offsets: Vec<u64>,
    cen_idx: usize,
    cen_offset: u64,
    cen_size: Option<u64>,
    zip64_end_offset: u64,
}

impl OffsetFixer {
    pub(crate) fn new() -> Self {
        OffsetFixer {
            offset: 0,
            local_offsets: Vec::new(),
            cen_idx: 0,
            cen_offset: 0,
            cen_size: None,
            zip64_end_offset: 0,
        }
    }

    /// Rewrite one record. Must be called in emission order; rewrites never
    /// change a record's wire size.
    pub(crate) fn apply(&mut self, rec: ZipRecord) -> ZipRecord {
        let current_offset = self.offset;
        self.offset += rec.wire_size();
        match rec {
            ZipRecord::Local(loc) => {
                self.local_offsets.push(current_offset);
                ZipRecord::Local(loc)
            }
            ZipRecord::Central(cen) => {
                if self.cen_idx == 0 {
                    self.cen_offset = current_offset;
                }
                let Some(&local_offset) = self.local_offsets.get(self.cen_idx) else {
                    // The caller broke the local/central pairing; nothing
                    // sensible to point at.
                    self.cen_idx += 1;
                    return ZipRecord::Central(cen);
                };
                self.cen_idx += 1;
                if cen.local_offset == ZIP64_MAGIC {
                    // The real offset lives in the Zip64 extra.
                    ZipRecord::Central(cen.map_extra(|field| match field {
                        ExtraField::Zip64(z) => {
                            ExtraField::Zip64(z.with_local_offset(local_offset))
                        }
                        other => other,
                    }))
                } else {
                    ZipRecord::Central(cen.with_local_offset(local_offset as u32))
                }
            }
            ZipRecord::Zip64End(rec) => {
                self.zip64_end_offset = current_offset;
                let cen_size = current_offset - self.cen_offset;
                self.cen_size = Some(cen_size);
                ZipRecord::Zip64End(
                    rec.with_cen_offset(self.cen_offset)
                        .with_cen_size(cen_size)
                        .with_disk_entries(self.cen_idx as u64)
                        .with_total_entries(self.cen_idx as u64),
                )
            }
            ZipRecord::Zip64Locator(loc) => {
                ZipRecord::Zip64Locator(loc.with_end_offset(self.zip64_end_offset))
            }
            ZipRecord::End(eoc) if !eoc.is_zip64() => {
                let cen_size = self
                    .cen_size
                    .unwrap_or(current_offset - self.cen_offset);
                ZipRecord::End(
                    eoc.with_cen_offset(self.cen_offset as u32)
                        .with_cen_size(cen_size as u32)
                        .with_disk_entries(self.cen_idx as u16)
                        .with_total_entries(self.cen_idx as u16),
                )
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::ArchiveBuilder;
    use crate::combinators::RecordStream;
    use crate::read::stream_bytes;
    use crate::spec::{EndOfCentralDirectory, ZipRecord};

    fn records_of(zip: Vec<u8>) -> Vec<ZipRecord> {
        stream_bytes(zip).collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn repairs_nonsense_cross_references() {
        let zip = ArchiveBuilder::new()
            .deflated("entry", b"hello")
            .stored("stored", b"stored")
            .build()
            .unwrap();

        // Wreck every cross-reference field, then let the fixer repair them.
        let wrecked = stream_bytes(zip.clone()).map_records(|rec| match rec {
            ZipRecord::Central(cen) => ZipRecord::Central(cen.with_local_offset(0xDEAD)),
            ZipRecord::End(eoc) => ZipRecord::End(
                eoc.with_cen_offset(1)
                    .with_cen_size(2)
                    .with_disk_entries(3)
                    .with_total_entries(4),
            ),
            other => other,
        });
        let fixed = crate::write::to_bytes(wrecked).unwrap();
        assert_eq!(fixed, zip);
    }

    #[test]
    fn records_pass_through_when_pairing_is_broken() {
        let mut fixer = OffsetFixer::new();
        // A central entry with no local header recorded keeps its field.
        let zip = ArchiveBuilder::new().stored("a", b"a").build().unwrap();
        for rec in records_of(zip) {
            if let ZipRecord::Central(cen) = rec {
                let cen = cen.with_local_offset(77);
                match fixer.apply(ZipRecord::Central(cen)) {
                    ZipRecord::Central(out) => assert_eq!(out.local_offset, 77),
                    _ => unreachable!(),
                }
            }
        }
    }

    #[test]
    fn hole_bytes_count_toward_the_end_record() {
        let zip = ArchiveBuilder::new().stored("a", b"a").build().unwrap();

        // A hole in front of the entries shifts every derived offset.
        let mut records = vec![ZipRecord::Hole(crate::spec::Hole::new(10))];
        records.extend(records_of(zip));

        let mut fixer = OffsetFixer::new();
        let mut eoc: Option<EndOfCentralDirectory> = None;
        let mut cen_offset = None;
        for rec in records {
            match fixer.apply(rec) {
                ZipRecord::Central(cen) => cen_offset = Some(cen.local_offset),
                ZipRecord::End(out) => eoc = Some(out),
                _ => {}
            }
        }
        let eoc = eoc.unwrap();
        // The local header landed at 10 instead of 0, one 31-byte header
        // plus a 1-byte payload before the central directory.
        assert_eq!(cen_offset, Some(10));
        assert_eq!(eoc.total_entries, 1);
        assert_eq!(eoc.disk_entries, 1);
        assert_eq!(eoc.cen_offset, 10 + 31 + 1);
        assert_eq!(eoc.cen_size as u64, 46 + 1);
    }
}
