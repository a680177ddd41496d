use rezip::{stream, stream_bytes, ArchiveBuilder, Hole, RecordStream, RecordWriter, ZipRecord};

const GIB: u64 = 1 << 30;

// A gigabyte hole between the central directory and the end record grows
// the file's logical length without disturbing the end record. Offset
// fixing stays off, since a hole counts toward the running offset and
// would otherwise be folded into the central directory size.
#[test]
fn emits_a_sparse_gigabyte_hole() {
    let zip = ArchiveBuilder::new()
        .stored("entry", b"payload")
        .build()
        .unwrap();
    let base_len = zip.len() as u64;
    let base_tail = zip[zip.len() - 22..].to_vec();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sparse.zip");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = RecordWriter::new(file).disable_offset_fixing();
    writer
        .write_all(stream_bytes(zip).flat_map_records(|rec| match rec {
            ZipRecord::End(eoc) => {
                vec![ZipRecord::Hole(Hole::new(GIB)), ZipRecord::End(eoc)]
            }
            other => vec![other],
        }))
        .unwrap();
    writer.finish().unwrap();

    let len = std::fs::metadata(&path).unwrap().len();
    assert_eq!(len, base_len + GIB);

    // The end record rode through untouched.
    let written = std::fs::read(&path).unwrap();
    assert_eq!(&written[written.len() - 22..], &base_tail[..]);
}

// A small hole is written as literal zeros and still counts toward the
// running offset.
#[test]
fn small_holes_write_zeros() {
    let zip = ArchiveBuilder::new().stored("a", b"a").build().unwrap();
    let base_len = zip.len() as u64;

    let mut writer = RecordWriter::buffer().disable_offset_fixing();
    writer
        .write_all(stream_bytes(zip).flat_map_records(|rec| match rec {
            ZipRecord::End(eoc) => vec![ZipRecord::Hole(Hole::new(64)), ZipRecord::End(eoc)],
            other => vec![other],
        }))
        .unwrap();
    let out = writer.into_bytes().unwrap();

    assert_eq!(out.len() as u64, base_len + 64);
    let hole_start = out.len() - 22 - 64;
    assert!(out[hole_start..hole_start + 64].iter().all(|&b| b == 0));
}

// Decoding stops cleanly at the end of the source, so a sparse file can
// still be streamed up to the hole.
#[test]
fn sparse_file_decodes_until_the_hole() {
    let zip = ArchiveBuilder::new().stored("a", b"a").build().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("holey.zip");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = RecordWriter::new(file).disable_offset_fixing();
    writer
        .write_all(stream_bytes(zip).flat_map_records(|rec| match rec {
            ZipRecord::End(eoc) => {
                vec![ZipRecord::Hole(Hole::new(8192)), ZipRecord::End(eoc)]
            }
            other => vec![other],
        }))
        .unwrap();
    writer.finish().unwrap();

    // Records up to the hole parse; the zero run then fails as an unknown
    // signature rather than looping forever.
    let mut reader = stream(&path).unwrap();
    let mut ok = 0;
    let mut failed = false;
    for rec in &mut reader {
        match rec {
            Ok(_) => ok += 1,
            Err(rezip::ZipError::UnknownSignature { signature, .. }) => {
                assert_eq!(signature, 0);
                failed = true;
                break;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(ok, 3); // local header, file data, central header
    assert!(failed);
}
