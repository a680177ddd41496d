//! Human-readable record disassembly.
//!
//! A passthrough attached to the encoder; each record that flows past is
//! printed as a section of field rows with absolute offsets, raw values and
//! decoded interpretations. The format is for eyeballs, not for parsing.

use std::io::{self, Write};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::compression;
use crate::extra_fields::{self, ExtendedTimestamp, ExtraField, NtfsTimes, Zip64Extra};
use crate::spec::{DataDescriptor, ZipRecord};
use crate::types;

pub(crate) struct Trace {
    out: Box<dyn Write>,
    offset: u64,
}

impl Trace {
    pub(crate) fn new(out: Box<dyn Write>) -> Self {
        Trace { out, offset: 0 }
    }

    pub(crate) fn record(&mut self, rec: &ZipRecord) -> io::Result<()> {
        match rec {
            ZipRecord::Local(loc) => {
                self.header("Local File Header")?;
                self.row("signature", format!("0x{:08x}", loc.sig), 4, "")?;
                self.row("version", format!("{}", loc.extract_version), 2, "")?;
                self.row("flags", format!("0x{:04x}", loc.flags), 2, "")?;
                self.row(
                    "method",
                    format!("{}", loc.method),
                    2,
                    compression::describe(loc.method),
                )?;
                self.time_and_date(loc.time, loc.date)?;
                self.row("crc", format!("0x{:08x}", loc.crc), 4, "")?;
                self.row("csize", format!("{}", loc.csize), 4, "")?;
                self.row("size", format!("{}", loc.size), 4, "")?;
                self.row("nlen", format!("{}", loc.nlen), 2, "")?;
                self.row("elen", format!("{}", loc.elen), 2, "")?;
                let name = format!("'{}'", loc.name_str());
                self.row(
                    "name",
                    format!("{} bytes", loc.name.len()),
                    loc.name.len() as u64,
                    &name,
                )?;
                self.ext_fields(&loc.extra)?;
            }
            ZipRecord::FileData(data) => {
                self.header("File Data")?;
                self.row("data", format!("{} bytes", data.size()), data.size(), "")?;
            }
            ZipRecord::Descriptor(desc) => {
                self.header("Data Descriptor")?;
                if desc.signed {
                    self.row("signature", format!("0x{:08x}", DataDescriptor::SIG), 4, "")?;
                }
                let width = if desc.zip64 { 8 } else { 4 };
                self.row("crc", format!("0x{:08x}", desc.crc), 4, "")?;
                self.row("csize", format!("{}", desc.csize), width, "")?;
                self.row("size", format!("{}", desc.size), width, "")?;
            }
            ZipRecord::Central(cen) => {
                self.header("Central Directory File Header")?;
                self.row("signature", format!("0x{:08x}", cen.sig), 4, "")?;
                self.row("made by version", format!("{}", cen.made_by_version), 2, "")?;
                self.row("extract version", format!("{}", cen.extract_version), 2, "")?;
                self.row("flags", format!("0x{:04x}", cen.flags), 2, "")?;
                self.row(
                    "method",
                    format!("{}", cen.method),
                    2,
                    compression::describe(cen.method),
                )?;
                self.time_and_date(cen.time, cen.date)?;
                self.row("crc", format!("0x{:08x}", cen.crc), 4, "")?;
                self.row("csize", format!("{}", cen.csize), 4, "")?;
                self.row("size", format!("{}", cen.size), 4, "")?;
                self.row("nlen", format!("{}", cen.nlen), 2, "")?;
                self.row("elen", format!("{}", cen.elen), 2, "")?;
                self.row("clen", format!("{}", cen.clen), 2, "")?;
                self.row("diskstart", format!("{}", cen.disk_start), 2, "")?;
                self.row("iattr", format!("0x{:02x}", cen.internal_attr), 2, "")?;
                self.row("eattr", format!("0x{:04x}", cen.external_attr), 4, "")?;
                self.row("loc offset", format!("{}", cen.local_offset), 4, "")?;
                let name = format!("'{}'", cen.name_str());
                self.row(
                    "name",
                    format!("{} bytes", cen.name.len()),
                    cen.name.len() as u64,
                    &name,
                )?;
                self.ext_fields(&cen.extra)?;
                if !cen.comment.is_empty() {
                    let comment = format!("'{}'", String::from_utf8_lossy(&cen.comment));
                    self.row(
                        "comment",
                        format!("{} bytes", cen.comment.len()),
                        cen.comment.len() as u64,
                        &comment,
                    )?;
                }
            }
            ZipRecord::Zip64End(rec) => {
                self.header("Zip64 End of Central Directory Record")?;
                self.row("signature", format!("0x{:08x}", rec.sig), 4, "")?;
                self.row("record size", format!("{}", rec.record_size), 8, "")?;
                self.row("made by version", format!("{}", rec.made_by_version), 2, "")?;
                self.row("extract version", format!("{}", rec.extract_version), 2, "")?;
                self.row("this disk", format!("{}", rec.this_disk), 4, "")?;
                self.row("cen disk", format!("{}", rec.start_disk), 4, "")?;
                self.row("entries", format!("{}", rec.disk_entries), 8, "")?;
                self.row("total entries", format!("{}", rec.total_entries), 8, "")?;
                self.row("cen size", format!("{}", rec.cen_size), 8, "")?;
                self.row("cen offset", format!("{}", rec.cen_offset), 8, "")?;
                self.ext_fields(&rec.extra)?;
            }
            ZipRecord::Zip64Locator(loc) => {
                self.header("Zip64 End of Central Directory Locator")?;
                self.row(
                    "signature",
                    format!("0x{:08x}", crate::spec::Zip64EndLocator::SIG),
                    4,
                    "",
                )?;
                self.row("eoc disk", format!("{}", loc.end_disk), 4, "")?;
                self.row("eoc offset", format!("{}", loc.end_offset), 8, "")?;
                self.row("total disks", format!("{}", loc.total_disks), 4, "")?;
            }
            ZipRecord::End(eoc) => {
                self.header("End of Central Directory")?;
                self.row(
                    "signature",
                    format!("0x{:08x}", crate::spec::EndOfCentralDirectory::SIG),
                    4,
                    "",
                )?;
                self.row("this disk", format!("{}", eoc.this_disk), 2, "")?;
                self.row("cen disk", format!("{}", eoc.start_disk), 2, "")?;
                self.row("entries disk", format!("{}", eoc.disk_entries), 2, "")?;
                self.row("entries total", format!("{}", eoc.total_entries), 2, "")?;
                self.row("cen size", format!("{}", eoc.cen_size), 4, "")?;
                self.row("cen offset", format!("{}", eoc.cen_offset), 4, "")?;
                self.row("clen", format!("{}", eoc.clen()), 2, "")?;
                if !eoc.comment.is_empty() {
                    let comment = format!("'{}'", String::from_utf8_lossy(&eoc.comment));
                    self.row(
                        "comment",
                        format!("{} bytes", eoc.comment.len()),
                        eoc.comment.len() as u64,
                        &comment,
                    )?;
                }
            }
            ZipRecord::Hole(hole) => {
                self.header("File Hole")?;
                self.row("length", format!("{} bytes", hole.length), hole.length, "")?;
            }
        }
        writeln!(self.out)
    }

    fn header(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "------  {name}  ------")
    }

    fn row(
        &mut self,
        name: &str,
        value: impl AsRef<str>,
        size: u64,
        interpretation: impl AsRef<str>,
    ) -> io::Result<()> {
        writeln!(
            self.out,
            "{:06}  {:<18} {:<15}{}",
            self.offset,
            name,
            value.as_ref(),
            interpretation.as_ref()
        )?;
        self.offset += size;
        Ok(())
    }

    fn time_and_date(&mut self, time: u16, date: u16) -> io::Result<()> {
        let decoded_time = types::dos_time(time)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "invalid time".into());
        self.row("time", format!("0x{time:04x}"), 2, &decoded_time)?;
        let decoded_date = types::dos_date(date)
            .map(|d| d.to_string())
            .unwrap_or_else(|| "invalid date".into());
        self.row("date", format!("0x{date:04x}"), 2, &decoded_date)
    }

    fn ext_fields(&mut self, fields: &[ExtraField]) -> io::Result<()> {
        for field in fields {
            self.row(
                "ext id",
                format!("0x{:04x}", field.id()),
                2,
                extra_fields::describe(field.id()),
            )?;
            self.row("ext size", format!("{}", field.dsize()), 2, "")?;
            match field {
                ExtraField::Zip64(z) => self.zip64_rows(z)?,
                ExtraField::Timestamp(ts) => self.timestamp_rows(ts)?,
                ExtraField::Ntfs(nt) => self.ntfs_rows(nt)?,
                ExtraField::Generic(g) => {
                    let hex: Vec<String> =
                        g.data.iter().map(|b| format!("{b:02x}")).collect();
                    self.row(
                        "ext data",
                        format!("{} bytes", g.data.len()),
                        g.data.len() as u64,
                        hex.join(" "),
                    )?;
                }
            }
        }
        Ok(())
    }

    fn zip64_rows(&mut self, z: &Zip64Extra) -> io::Result<()> {
        if let Some(size) = z.size {
            self.row("z64 size", format!("{size}"), 8, "")?;
        }
        if let Some(csize) = z.csize {
            self.row("z64 csize", format!("{csize}"), 8, "")?;
        }
        if let Some(local_offset) = z.local_offset {
            self.row("z64 locoff", format!("{local_offset}"), 8, "")?;
        }
        if let Some(disk_start) = z.disk_start {
            self.row("z64 diskstart", format!("{disk_start}"), 4, "")?;
        }
        Ok(())
    }

    fn timestamp_rows(&mut self, ts: &ExtendedTimestamp) -> io::Result<()> {
        self.row("ts flag", format!("0x{:02x}", ts.flags), 1, "")?;
        for (name, value) in [
            ("ts modtime", ts.mod_time()),
            ("ts actime", ts.ac_time()),
            ("ts crtime", ts.cr_time()),
        ] {
            if let Some(seconds) = value {
                self.row(name, format!("{seconds}"), 4, unix_stamp(seconds as i64))?;
            }
        }
        Ok(())
    }

    fn ntfs_rows(&mut self, nt: &NtfsTimes) -> io::Result<()> {
        self.row("wnt res", format!("0x{:x}", nt.reserved), 4, "")?;
        self.row("wnt tag", format!("0x{:x}", NtfsTimes::TIME_TAG), 2, "")?;
        self.row("wnt size", format!("{}", NtfsTimes::TIME_TAG_SIZE), 2, "")?;
        for (name, ticks) in [
            ("wnt mtime", nt.mtime),
            ("wnt atime", nt.atime),
            ("wnt ctime", nt.ctime),
        ] {
            self.row(name, format!("{ticks}"), 8, unix_stamp(NtfsTimes::to_unix_micros(ticks) / 1_000_000))?;
        }
        Ok(())
    }
}

fn unix_stamp(seconds: i64) -> String {
    OffsetDateTime::from_unix_timestamp(seconds)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_default()
}
