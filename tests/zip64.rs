use std::io::Read;

use flate2::read::DeflateDecoder;
use rezip::{stream_bytes, ArchiveBuilder, RecordStream, ZipRecord, ZIP64_MAGIC, ZIP64_MAGIC_U16};

fn from_hex(hex: &str) -> Vec<u8> {
    assert!(hex.len() % 2 == 0);
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

// A Zip64 archive produced by Info-ZIP: `echo "HELLO" | zip > hello.zip`.
const ZIP64_SAMPLE: &str = concat!(
    "504b03042d000000000028a844566ed7acfdffffffffffffffff01001400",
    "2d010010000600000000000000060000000000000048454c4c4f0a504b01",
    "021e032d000000000028a844566ed7acfd06000000060000000100000000",
    "00000001000000b011000000002d504b06062c000000000000001e032d00",
    "0000000000000000010000000000000001000000000000002f0000000000",
    "00003900000000000000504b060700000000680000000000000001000000",
    "504b050600000000010001002f000000390000000000"
);

#[test]
fn parses_a_real_zip64_archive() {
    let zip = from_hex(ZIP64_SAMPLE);
    let records: Vec<ZipRecord> = stream_bytes(zip).collect::<Result<_, _>>().unwrap();

    assert_eq!(records.len(), 6);

    match &records[0] {
        ZipRecord::Local(loc) => {
            assert_eq!(loc.extract_version, 45);
            assert_eq!(loc.flags, 0);
            assert_eq!(loc.method, 0);
            assert_eq!(loc.csize, ZIP64_MAGIC);
            assert_eq!(loc.size, ZIP64_MAGIC);
            assert!(loc.is_named(b"-"));
            assert_eq!(loc.elen, 20);
            let z64 = loc.zip64_extra().expect("zip64 extra present");
            assert_eq!(z64.size, Some(6));
            assert_eq!(z64.csize, Some(6));
        }
        other => panic!("expected local header, got {other:?}"),
    }
    match &records[1] {
        ZipRecord::FileData(data) => assert_eq!(data.to_vec().unwrap(), b"HELLO\n"),
        other => panic!("expected file data, got {other:?}"),
    }
    match &records[2] {
        ZipRecord::Central(cen) => {
            assert_eq!(cen.made_by_version >> 8, 3); // unix
            assert_eq!(cen.extract_version, 45);
            assert_eq!(cen.csize, 6);
            assert_eq!(cen.size, 6);
            assert_eq!(cen.local_offset, 0);
            assert!(cen.extra.is_empty());
        }
        other => panic!("expected central header, got {other:?}"),
    }
    match &records[3] {
        ZipRecord::Zip64End(rec) => {
            assert_eq!(rec.record_size, 44);
            assert_eq!(rec.disk_entries, 1);
            assert_eq!(rec.total_entries, 1);
            assert_eq!(rec.cen_size, 47);
            assert_eq!(rec.cen_offset, 57);
            assert!(rec.extra.is_empty());
        }
        other => panic!("expected zip64 end record, got {other:?}"),
    }
    match &records[4] {
        ZipRecord::Zip64Locator(loc) => {
            assert_eq!(loc.end_disk, 0);
            assert_eq!(loc.end_offset, 104);
            assert_eq!(loc.total_disks, 1);
        }
        other => panic!("expected zip64 locator, got {other:?}"),
    }
    match &records[5] {
        ZipRecord::End(eoc) => {
            assert_eq!(eoc.total_entries, 1);
            assert_eq!(eoc.cen_size, 47);
            assert_eq!(eoc.cen_offset, 57);
        }
        other => panic!("expected end record, got {other:?}"),
    }
}

#[test]
fn zip64_archive_round_trips_bit_exactly() {
    let zip = from_hex(ZIP64_SAMPLE);
    let out = rezip::to_bytes(stream_bytes(zip.clone())).unwrap();
    assert_eq!(out, zip);
}

#[test]
fn upgrades_an_archive_to_zip64() {
    let zip = ArchiveBuilder::new()
        .deflated("entry", b"hello")
        .stored("stored", b"stored")
        .build()
        .unwrap();

    let upgraded = stream_bytes(zip).to_zip64().to_bytes().unwrap();
    let records: Vec<ZipRecord> = stream_bytes(upgraded).collect::<Result<_, _>>().unwrap();

    let mut locals = 0;
    let mut centrals = 0;
    let mut offsets = Vec::new();
    let mut offset = 0u64;
    for rec in &records {
        match rec {
            ZipRecord::Local(loc) => {
                locals += 1;
                offsets.push(offset);
                assert_eq!(loc.extract_version, 45);
                assert_eq!(loc.size, ZIP64_MAGIC);
                assert_eq!(loc.csize, ZIP64_MAGIC);
                assert!(loc.zip64_extra().is_some());
            }
            ZipRecord::Central(cen) => {
                assert_eq!(cen.size, ZIP64_MAGIC);
                assert_eq!(cen.csize, ZIP64_MAGIC);
                assert_eq!(cen.disk_start, ZIP64_MAGIC_U16);
                assert_eq!(cen.local_offset, ZIP64_MAGIC);
                let z64 = cen.zip64_extra().expect("zip64 extra present");
                // Re-derivation pointed the extra at the paired local header.
                assert_eq!(z64.local_offset, Some(offsets[centrals]));
                centrals += 1;
            }
            ZipRecord::Descriptor(desc) => assert!(desc.zip64),
            _ => {}
        }
        offset += rec.wire_size();
    }
    assert_eq!(locals, 2);
    assert_eq!(centrals, 2);

    // The Zip64 end pair is present and the legacy end record carries
    // sentinels.
    assert!(records.iter().any(|r| matches!(r, ZipRecord::Zip64End(_))));
    assert!(records
        .iter()
        .any(|r| matches!(r, ZipRecord::Zip64Locator(_))));
    match records.last().unwrap() {
        ZipRecord::End(eoc) => {
            assert_eq!(eoc.disk_entries, ZIP64_MAGIC_U16);
            assert_eq!(eoc.total_entries, ZIP64_MAGIC_U16);
            assert_eq!(eoc.cen_size, ZIP64_MAGIC);
            assert_eq!(eoc.cen_offset, ZIP64_MAGIC);
        }
        other => panic!("expected end record, got {other:?}"),
    }

    // Payloads still decode.
    let mut payloads = Vec::new();
    for rec in &records {
        if let ZipRecord::FileData(data) = rec {
            payloads.push(data.to_vec().unwrap());
        }
    }
    let mut hello = String::new();
    DeflateDecoder::new(&payloads[0][..])
        .read_to_string(&mut hello)
        .unwrap();
    assert_eq!(hello, "hello");
    assert_eq!(payloads[1], b"stored");
}

// After re-derivation the Zip64 end record sits at cen_offset + cen_size
// and the locator points at it.
#[test]
fn zip64_end_cross_references_are_derived() {
    let zip = ArchiveBuilder::new()
        .deflated("entry", b"hello")
        .stored("stored", b"stored")
        .build()
        .unwrap();
    let upgraded = stream_bytes(zip).to_zip64().to_bytes().unwrap();

    let mut offset = 0u64;
    let mut zip64_end = None;
    let mut zip64_end_offset = 0;
    let mut locator = None;
    for rec in stream_bytes(upgraded) {
        let rec = rec.unwrap();
        match &rec {
            ZipRecord::Zip64End(r) => {
                zip64_end = Some(r.clone());
                zip64_end_offset = offset;
            }
            ZipRecord::Zip64Locator(l) => locator = Some(*l),
            _ => {}
        }
        offset += rec.wire_size();
    }
    let zip64_end = zip64_end.expect("zip64 end record present");
    let locator = locator.expect("zip64 locator present");
    assert_eq!(zip64_end.cen_offset + zip64_end.cen_size, zip64_end_offset);
    assert_eq!(locator.end_offset, zip64_end_offset);
}

#[test]
fn upgraded_archive_round_trips_bit_exactly() {
    let zip = ArchiveBuilder::new()
        .deflated("entry", b"hello")
        .stored("stored", b"stored")
        .build()
        .unwrap();
    let upgraded = stream_bytes(zip).to_zip64().to_bytes().unwrap();
    let out = rezip::to_bytes(stream_bytes(upgraded.clone())).unwrap();
    assert_eq!(out, upgraded);
}
