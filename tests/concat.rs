use rezip::{concat, stream_bytes, ArchiveBuilder, RecordStream, ZipRecord};

fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = ArchiveBuilder::new();
    for (name, data) in entries {
        builder = builder.stored(*name, data);
    }
    builder.build().unwrap()
}

fn entry_names(zip: Vec<u8>) -> Vec<String> {
    stream_bytes(zip)
        .filter_map(|rec| match rec.unwrap() {
            ZipRecord::Local(loc) => Some(loc.name_str().into_owned()),
            _ => None,
        })
        .collect()
}

// Concatenation keeps the entries of both inputs in order: locals of the
// first archive, locals of the second, then both central directories and
// one merged end record.
#[test]
fn concatenates_two_archives() {
    let a = archive(&[("a", b"a"), ("b", b"b")]);
    let b = archive(&[("c", b"c"), ("d", b"d")]);

    let out = concat(stream_bytes(a), stream_bytes(b))
        .to_bytes()
        .unwrap();

    assert_eq!(entry_names(out.clone()), ["a", "b", "c", "d"]);

    let records: Vec<ZipRecord> = stream_bytes(out).collect::<Result<_, _>>().unwrap();

    // Central entries are contiguous and point at their paired locals.
    let mut offset = 0u64;
    let mut local_offsets = Vec::new();
    let mut central_offsets = Vec::new();
    let mut central_names = Vec::new();
    for rec in &records {
        match rec {
            ZipRecord::Local(loc) => {
                local_offsets.push((loc.name_str().into_owned(), offset));
            }
            ZipRecord::Central(cen) => {
                central_offsets.push(cen.local_offset as u64);
                central_names.push(cen.name_str().into_owned());
            }
            _ => {}
        }
        offset += rec.wire_size();
    }
    assert_eq!(central_names, ["a", "b", "c", "d"]);
    for (name, local_offset) in &local_offsets {
        let idx = central_names.iter().position(|n| n == name).unwrap();
        assert_eq!(central_offsets[idx], *local_offset);
    }

    match records.last().unwrap() {
        ZipRecord::End(eoc) => {
            assert_eq!(eoc.disk_entries, 4);
            assert_eq!(eoc.total_entries, 4);
        }
        other => panic!("expected end record, got {other:?}"),
    }
}

// Entries can be filtered out of one side before concatenation.
#[test]
fn concatenates_with_a_filtered_side() {
    let a = archive(&[("a", b"a"), ("b", b"b")]);
    let b = archive(&[("c", b"c"), ("d", b"d")]);

    let filtered = stream_bytes(b)
        .filter_entries(|loc| !loc.is_named(b"c"))
        .filter_records(|rec| match rec {
            ZipRecord::Central(cen) => !cen.is_named(b"c"),
            _ => true,
        });
    let out = concat(stream_bytes(a), filtered).to_bytes().unwrap();

    assert_eq!(entry_names(out.clone()), ["a", "b", "d"]);
    match stream_bytes(out).last().unwrap().unwrap() {
        ZipRecord::End(eoc) => assert_eq!(eoc.total_entries, 3),
        other => panic!("expected end record, got {other:?}"),
    }
}

// Zip64 end records from either input are dropped; re-upgrading the
// concatenation is the caller's move.
#[test]
fn drops_zip64_end_records_from_both_inputs() {
    let a = archive(&[("a", b"a")]);
    let b = archive(&[("b", b"b")]);
    let a64 = stream_bytes(a).to_zip64().to_bytes().unwrap();
    let b64 = stream_bytes(b).to_zip64().to_bytes().unwrap();

    let out = concat(stream_bytes(a64), stream_bytes(b64))
        .to_bytes()
        .unwrap();

    let records: Vec<ZipRecord> = stream_bytes(out).collect::<Result<_, _>>().unwrap();
    assert!(!records.iter().any(ZipRecord::is_zip64_end));
    match records.last().unwrap() {
        ZipRecord::End(eoc) => {
            assert_eq!(eoc.total_entries, 2);
            assert_eq!(eoc.disk_entries, 2);
        }
        other => panic!("expected end record, got {other:?}"),
    }
}

// Concatenating with an empty archive keeps the populated side intact.
#[test]
fn concatenates_with_an_empty_archive() {
    let a = archive(&[("a", b"a")]);
    let empty = ArchiveBuilder::new().build().unwrap();

    let out = concat(stream_bytes(a), stream_bytes(empty))
        .to_bytes()
        .unwrap();

    assert_eq!(entry_names(out.clone()), ["a"]);
    match stream_bytes(out).last().unwrap().unwrap() {
        ZipRecord::End(eoc) => assert_eq!(eoc.total_entries, 1),
        other => panic!("expected end record, got {other:?}"),
    }
}
