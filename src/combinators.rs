//! Combinators over record streams.
//!
//! The transformation surface is an extension trait over any iterator of
//! decoded records. Combinators are pure: they rewrite or drop `Ok`
//! records and pass decode errors through untouched.

use std::collections::VecDeque;
use std::path::Path;

use crate::result::ZipResult;
use crate::spec::{
    CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader, Zip64EndLocator,
    Zip64EndOfCentralDirectory, ZipRecord,
};

/// Transformation surface for record streams.
pub trait RecordStream: Iterator<Item = ZipResult<ZipRecord>> + Sized {
    /// Keep only the records for which `pred` returns true.
    fn filter_records<P>(self, pred: P) -> FilterRecords<Self, P>
    where
        P: FnMut(&ZipRecord) -> bool,
    {
        FilterRecords { inner: self, pred }
    }

    /// Per-entry filter: the predicate sees each local file header, and its
    /// decision drops or keeps the header together with its file data and
    /// optional data descriptor. All other records pass.
    fn filter_entries<P>(self, pred: P) -> FilterEntries<Self, P>
    where
        P: FnMut(&LocalFileHeader) -> bool,
    {
        FilterEntries {
            inner: self,
            pred,
            keep_current: true,
        }
    }

    /// Rewrite every record through `f`.
    fn map_records<F>(self, f: F) -> MapRecords<Self, F>
    where
        F: FnMut(ZipRecord) -> ZipRecord,
    {
        MapRecords { inner: self, f }
    }

    /// Rewrite every record into zero or more records through `f`.
    fn flat_map_records<F>(self, f: F) -> FlatMapRecords<Self, F>
    where
        F: FnMut(ZipRecord) -> Vec<ZipRecord>,
    {
        FlatMapRecords {
            inner: self,
            f,
            queue: VecDeque::new(),
        }
    }

    /// Rename entries, rewriting local and central header names in tandem
    /// through the same function so the pairing by name stays intact.
    /// Names are decoded lossily; an entry whose rename is a no-op keeps
    /// its original bytes.
    fn rename<F>(self, f: F) -> Rename<Self, F>
    where
        F: FnMut(&str) -> String,
    {
        Rename { inner: self, f }
    }

    /// Upgrade the stream to the Zip64 format: local headers, descriptors
    /// and central headers move their sizes into Zip64 extras, and each end
    /// record expands into a Zip64 end record, its locator, and the
    /// sentinel-bearing end record.
    fn to_zip64(self) -> FlatMapRecords<Self, fn(ZipRecord) -> Vec<ZipRecord>> {
        self.flat_map_records(upgrade_to_zip64)
    }

    /// Encode the stream into a byte buffer with offset fixing enabled.
    fn to_bytes(self) -> ZipResult<Vec<u8>> {
        crate::write::to_bytes(self)
    }

    /// Encode the stream into a file with offset fixing enabled.
    fn to_file<P: AsRef<Path>>(self, path: P) -> ZipResult<()> {
        crate::write::to_file(path, self)
    }
}

impl<I: Iterator<Item = ZipResult<ZipRecord>>> RecordStream for I {}

fn upgrade_to_zip64(rec: ZipRecord) -> Vec<ZipRecord> {
    match rec {
        ZipRecord::Local(loc) => vec![ZipRecord::Local(loc.to_zip64())],
        ZipRecord::Descriptor(desc) => vec![ZipRecord::Descriptor(desc.to_zip64())],
        ZipRecord::Central(cen) => vec![ZipRecord::Central(cen.to_zip64())],
        ZipRecord::End(eoc) => vec![
            ZipRecord::Zip64End(Zip64EndOfCentralDirectory::from_end(&eoc)),
            ZipRecord::Zip64Locator(Zip64EndLocator::from_end(&eoc)),
            ZipRecord::End(eoc.to_zip64()),
        ],
        other => vec![other],
    }
}

/// See [`RecordStream::filter_records`].
pub struct FilterRecords<I, P> {
    inner: I,
    pred: P,
}

impl<I, P> Iterator for FilterRecords<I, P>
where
    I: Iterator<Item = ZipResult<ZipRecord>>,
    P: FnMut(&ZipRecord) -> bool,
{
    type Item = ZipResult<ZipRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(rec) => {
                    if (self.pred)(&rec) {
                        return Some(Ok(rec));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// See [`RecordStream::filter_entries`].
pub struct FilterEntries<I, P> {
    inner: I,
    pred: P,
    keep_current: bool,
}

impl<I, P> Iterator for FilterEntries<I, P>
where
    I: Iterator<Item = ZipResult<ZipRecord>>,
    P: FnMut(&LocalFileHeader) -> bool,
{
    type Item = ZipResult<ZipRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(rec) => {
                    let keep = match &rec {
                        ZipRecord::Local(loc) => {
                            self.keep_current = (self.pred)(loc);
                            self.keep_current
                        }
                        ZipRecord::FileData(_) | ZipRecord::Descriptor(_) => self.keep_current,
                        _ => true,
                    };
                    if keep {
                        return Some(Ok(rec));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// See [`RecordStream::map_records`].
pub struct MapRecords<I, F> {
    inner: I,
    f: F,
}

impl<I, F> Iterator for MapRecords<I, F>
where
    I: Iterator<Item = ZipResult<ZipRecord>>,
    F: FnMut(ZipRecord) -> ZipRecord,
{
    type Item = ZipResult<ZipRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|rec| rec.map(&mut self.f))
    }
}

/// See [`RecordStream::flat_map_records`].
pub struct FlatMapRecords<I, F> {
    inner: I,
    f: F,
    queue: VecDeque<ZipRecord>,
}

impl<I, F> Iterator for FlatMapRecords<I, F>
where
    I: Iterator<Item = ZipResult<ZipRecord>>,
    F: FnMut(ZipRecord) -> Vec<ZipRecord>,
{
    type Item = ZipResult<ZipRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(rec) = self.queue.pop_front() {
                return Some(Ok(rec));
            }
            match self.inner.next()? {
                Ok(rec) => self.queue.extend((self.f)(rec)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// See [`RecordStream::rename`].
pub struct Rename<I, F> {
    inner: I,
    f: F,
}

impl<I, F> Iterator for Rename<I, F>
where
    I: Iterator<Item = ZipResult<ZipRecord>>,
    F: FnMut(&str) -> String,
{
    type Item = ZipResult<ZipRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let rec = self.inner.next()?;
        Some(rec.map(|rec| match rec {
            ZipRecord::Local(loc) => {
                let name = loc.name_str().into_owned();
                let renamed = (self.f)(&name);
                if renamed == name {
                    ZipRecord::Local(loc)
                } else {
                    ZipRecord::Local(loc.with_name(renamed.into_bytes()))
                }
            }
            ZipRecord::Central(cen) => {
                let name = cen.name_str().into_owned();
                let renamed = (self.f)(&name);
                if renamed == name {
                    ZipRecord::Central(cen)
                } else {
                    ZipRecord::Central(cen.with_name(renamed.into_bytes()))
                }
            }
            other => other,
        }))
    }
}

/// Concatenate two archives into one: the entries of `a` followed by the
/// entries of `b`, their central directories likewise, and a single merged
/// end record whose counts and sizes sum the inputs'. Zip64 end records
/// from either input are dropped; a caller needing Zip64 re-applies
/// [`RecordStream::to_zip64`] to the concatenation.
pub fn concat<A, B>(a: A, b: B) -> Concat<A, B>
where
    A: Iterator<Item = ZipResult<ZipRecord>>,
    B: Iterator<Item = ZipResult<ZipRecord>>,
{
    Concat {
        a,
        b,
        phase: Phase::HeadA,
        a_first_cen: None,
        b_first_cen: None,
        a_end: None,
        b_end: None,
    }
}

enum Phase {
    /// Entries of `a`, until its first central header
    HeadA,
    /// Entries of `b`, until its first central header
    HeadB,
    /// Central directory of `a`, until its end record
    CenA,
    /// Central directory of `b`, until its end record
    CenB,
    /// The single merged end record
    Merged,
    Done,
}

/// See [`concat`].
pub struct Concat<A, B> {
    a: A,
    b: B,
    phase: Phase,
    a_first_cen: Option<CentralDirectoryHeader>,
    b_first_cen: Option<CentralDirectoryHeader>,
    a_end: Option<EndOfCentralDirectory>,
    b_end: Option<EndOfCentralDirectory>,
}

impl<A, B> Iterator for Concat<A, B>
where
    A: Iterator<Item = ZipResult<ZipRecord>>,
    B: Iterator<Item = ZipResult<ZipRecord>>,
{
    type Item = ZipResult<ZipRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.phase {
                Phase::HeadA => match self.a.next() {
                    None => self.phase = Phase::HeadB,
                    Some(Err(e)) => {
                        self.phase = Phase::Done;
                        return Some(Err(e));
                    }
                    Some(Ok(ZipRecord::Central(cen))) => {
                        self.a_first_cen = Some(cen);
                        self.phase = Phase::HeadB;
                    }
                    Some(Ok(ZipRecord::End(eoc))) => {
                        self.a_end = Some(eoc);
                        self.phase = Phase::HeadB;
                    }
                    Some(Ok(rec)) if rec.is_zip64_end() => {}
                    Some(Ok(rec)) => return Some(Ok(rec)),
                },
                Phase::HeadB => match self.b.next() {
                    None => self.phase = Phase::CenA,
                    Some(Err(e)) => {
                        self.phase = Phase::Done;
                        return Some(Err(e));
                    }
                    Some(Ok(ZipRecord::Central(cen))) => {
                        self.b_first_cen = Some(cen);
                        self.phase = Phase::CenA;
                    }
                    Some(Ok(ZipRecord::End(eoc))) => {
                        self.b_end = Some(eoc);
                        self.phase = Phase::CenA;
                    }
                    Some(Ok(rec)) if rec.is_zip64_end() => {}
                    Some(Ok(rec)) => return Some(Ok(rec)),
                },
                Phase::CenA => {
                    if let Some(cen) = self.a_first_cen.take() {
                        return Some(Ok(ZipRecord::Central(cen)));
                    }
                    if self.a_end.is_some() {
                        self.phase = Phase::CenB;
                        continue;
                    }
                    match self.a.next() {
                        None => self.phase = Phase::CenB,
                        Some(Err(e)) => {
                            self.phase = Phase::Done;
                            return Some(Err(e));
                        }
                        Some(Ok(ZipRecord::End(eoc))) => {
                            self.a_end = Some(eoc);
                            self.phase = Phase::CenB;
                        }
                        Some(Ok(rec)) if rec.is_zip64_end() => {}
                        Some(Ok(rec)) => return Some(Ok(rec)),
                    }
                }
                Phase::CenB => {
                    if let Some(cen) = self.b_first_cen.take() {
                        return Some(Ok(ZipRecord::Central(cen)));
                    }
                    if self.b_end.is_some() {
                        self.phase = Phase::Merged;
                        continue;
                    }
                    match self.b.next() {
                        None => self.phase = Phase::Merged,
                        Some(Err(e)) => {
                            self.phase = Phase::Done;
                            return Some(Err(e));
                        }
                        Some(Ok(ZipRecord::End(eoc))) => {
                            self.b_end = Some(eoc);
                            self.phase = Phase::Merged;
                        }
                        Some(Ok(rec)) if rec.is_zip64_end() => {}
                        Some(Ok(rec)) => return Some(Ok(rec)),
                    }
                }
                Phase::Merged => {
                    self.phase = Phase::Done;
                    let merged = match (self.a_end.take(), self.b_end.take()) {
                        (Some(a), Some(b)) => Some(
                            a.clone()
                                .with_disk_entries(a.disk_entries.wrapping_add(b.disk_entries))
                                .with_total_entries(
                                    a.total_entries.wrapping_add(b.total_entries),
                                )
                                .with_cen_size(a.cen_size.wrapping_add(b.cen_size))
                                .with_cen_offset(a.cen_offset.wrapping_add(b.cen_offset)),
                        ),
                        (Some(a), None) => Some(a),
                        (None, Some(b)) => Some(b),
                        (None, None) => None,
                    };
                    match merged {
                        Some(eoc) => return Some(Ok(ZipRecord::End(eoc))),
                        None => return None,
                    }
                }
                Phase::Done => return None,
            }
        }
    }
}
