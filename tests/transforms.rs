use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use rezip::{
    stream_bytes, ArchiveBuilder, ExtendedTimestamp, ExtraField, NtfsTimes, RecordStream,
    RecordWriter, ZipRecord,
};

fn two_entry_zip() -> Vec<u8> {
    ArchiveBuilder::new()
        .stored("a", b"a")
        .stored("b", b"b")
        .build()
        .unwrap()
}

// Dropping an entry drops its local header, file data and descriptor as a
// unit, and re-derivation repairs the counts and offsets.
#[test]
fn drops_an_entry_and_rederives_the_layout() {
    let zip = ArchiveBuilder::new()
        .deflated("a", b"payload a")
        .stored("b", b"b")
        .build()
        .unwrap();

    let out = stream_bytes(zip)
        .filter_entries(|loc| !loc.is_named(b"a"))
        .filter_records(|rec| match rec {
            ZipRecord::Central(cen) => !cen.is_named(b"a"),
            _ => true,
        })
        .to_bytes()
        .unwrap();

    let records: Vec<ZipRecord> = stream_bytes(out).collect::<Result<_, _>>().unwrap();
    let mut names = Vec::new();
    for rec in &records {
        match rec {
            ZipRecord::Local(loc) => names.push(loc.name_str().into_owned()),
            ZipRecord::Central(cen) => {
                assert!(cen.is_named(b"b"));
                assert_eq!(cen.local_offset, 0);
            }
            ZipRecord::End(eoc) => {
                assert_eq!(eoc.disk_entries, 1);
                assert_eq!(eoc.total_entries, 1);
            }
            _ => {}
        }
    }
    assert_eq!(names, ["b"]);
}

// Renaming rewrites the local and central header in tandem.
#[test]
fn renames_local_and_central_names_together() {
    let zip = ArchiveBuilder::new()
        .deflated("entry", b"hello")
        .stored("stored", b"stored")
        .build()
        .unwrap();

    let out = stream_bytes(zip)
        .rename(|name| match name {
            "entry" => "entry.txt".to_string(),
            other => other.to_string(),
        })
        .to_bytes()
        .unwrap();

    let mut names = Vec::new();
    for rec in stream_bytes(out.clone()) {
        match rec.unwrap() {
            ZipRecord::Local(loc) => names.push(format!("loc:{}", loc.name_str())),
            ZipRecord::Central(cen) => names.push(format!("cen:{}", cen.name_str())),
            _ => {}
        }
    }
    assert_eq!(
        names,
        ["loc:entry.txt", "loc:stored", "cen:entry.txt", "cen:stored"]
    );

    // The renamed archive still round-trips.
    assert_eq!(rezip::to_bytes(stream_bytes(out.clone())).unwrap(), out);
}

// With offset fixing disabled a mapped field value lands in the output
// verbatim.
#[test]
fn disabled_fixing_emits_the_lying_offset() {
    let zip = ArchiveBuilder::new().stored("a", b"a").build().unwrap();

    let mut writer = RecordWriter::buffer().disable_offset_fixing();
    writer
        .write_all(stream_bytes(zip).map_records(|rec| match rec {
            ZipRecord::End(eoc) => ZipRecord::End(eoc.with_cen_offset(0x7FFF_FFFF)),
            other => other,
        }))
        .unwrap();
    let out = writer.into_bytes().unwrap();

    // The end record is the trailing 22 bytes; cen_offset sits 6 bytes
    // before the end.
    let field = &out[out.len() - 6..out.len() - 2];
    assert_eq!(field, 0x7FFF_FFFFu32.to_le_bytes());
}

// A lying name length corrupts the record framing for any later reader.
#[test]
fn corrupt_name_length_breaks_decoding() {
    let zip = two_entry_zip();
    let out = stream_bytes(zip)
        .map_records(|rec| match rec {
            ZipRecord::Central(cen) if cen.is_named(b"a") => {
                ZipRecord::Central(cen.with_nlen(42))
            }
            other => other,
        })
        .to_bytes()
        .unwrap();

    assert!(stream_bytes(out).any(|rec| rec.is_err()));
}

// An invalid signature is written verbatim and trips the decoder with the
// offset and value in the error.
#[test]
fn corrupt_signature_is_reported_with_its_offset() {
    let zip = two_entry_zip();
    let out = stream_bytes(zip)
        .map_records(|rec| match rec {
            ZipRecord::Local(loc) if loc.is_named(b"b") => {
                ZipRecord::Local(loc.with_sig(0xCAFEBABE))
            }
            other => other,
        })
        .to_bytes()
        .unwrap();

    let err = stream_bytes(out)
        .find_map(Result::err)
        .expect("decode should fail");
    match err {
        rezip::ZipError::UnknownSignature { signature, offset } => {
            assert_eq!(signature, 0xCAFEBABE);
            // First entry: 31-byte local header plus 1 payload byte.
            assert_eq!(offset, 32);
        }
        other => panic!("expected unknown signature, got {other}"),
    }
}

// Injected timestamp extras survive a round trip in both headers.
#[test]
fn timestamp_extras_round_trip() {
    let ts = ExtendedTimestamp::new()
        .last_modified(1_577_885_000)
        .last_accessed(1_577_885_001)
        .created(1_577_884_999);
    let zip = ArchiveBuilder::new()
        .stored("entry", b"x")
        .entry_extra(vec![ExtraField::Timestamp(ts)])
        .build()
        .unwrap();

    for rec in stream_bytes(zip) {
        match rec.unwrap() {
            ZipRecord::Local(loc) => {
                let got = loc.timestamp_extra().expect("timestamp extra present");
                assert_eq!(got.mod_time(), Some(1_577_885_000));
                assert_eq!(got.ac_time(), Some(1_577_885_001));
                assert_eq!(got.cr_time(), Some(1_577_884_999));
            }
            ZipRecord::Central(cen) => {
                assert!(cen.timestamp_extra().is_some());
            }
            _ => {}
        }
    }
}

#[test]
fn ntfs_extras_round_trip() {
    let times = NtfsTimes::from_unix_micros(1_577_885_000_000_000, 2, 3);
    let zip = ArchiveBuilder::new()
        .stored("entry", b"x")
        .entry_extra(vec![ExtraField::Ntfs(times)])
        .build()
        .unwrap();

    let mut seen = 0;
    for rec in stream_bytes(zip) {
        match rec.unwrap() {
            ZipRecord::Local(loc) => {
                assert_eq!(loc.ntfs_extra(), Some(&times));
                seen += 1;
            }
            ZipRecord::Central(cen) => {
                assert_eq!(cen.ntfs_extra(), Some(&times));
                seen += 1;
            }
            _ => {}
        }
    }
    assert_eq!(seen, 2);
}

/// A clonable sink so the test can inspect what the encoder traced.
#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn trace_disassembles_every_record() {
    let sink = SharedSink::default();
    let zip = ArchiveBuilder::new()
        .deflated("entry", b"hello")
        .build()
        .unwrap();

    let mut writer = RecordWriter::buffer().trace(sink.clone());
    writer.write_all(stream_bytes(zip)).unwrap();
    writer.into_bytes().unwrap();

    let text = String::from_utf8(sink.0.borrow().clone()).unwrap();
    assert!(text.contains("------  Local File Header  ------"));
    assert!(text.contains("------  File Data  ------"));
    assert!(text.contains("------  Data Descriptor  ------"));
    assert!(text.contains("------  Central Directory File Header  ------"));
    assert!(text.contains("------  End of Central Directory  ------"));
    assert!(text.contains("Deflated"));
    assert!(text.contains("'entry'"));
    // Offsets are six digits wide and the first row starts at zero.
    assert!(text.contains("000000  signature"));
}
