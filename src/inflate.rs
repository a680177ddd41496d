//! Compressed-length discovery for deflated payloads.
//!
//! When a deflated entry uses a data descriptor its local header carries
//! zero sizes, so the only way to find where the payload ends is to run the
//! deflate stream to completion. The decompressed output is discarded; only
//! the consumed input count matters.

use std::io::{self, Read};

use flate2::{Decompress, FlushDecompress, Status};

use crate::result::{ZipError, ZipResult};

/// Inflate from the reader's current position until the deflate stream
/// ends, returning the number of compressed bytes it occupied. The reader
/// is over-read past the stream end; the caller re-seeks.
pub(crate) fn deflate_stream_length<R: Read + ?Sized>(reader: &mut R) -> ZipResult<u64> {
    let mut inflater = Decompress::new(false);
    let mut input = [0u8; 4096];
    let mut output = [0u8; 4096];
    loop {
        let n = reader.read(&mut input)?;
        if n == 0 {
            return Err(ZipError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "unexpected end of deflate stream",
            )));
        }
        let mut consumed = 0;
        while consumed < n {
            let before = inflater.total_in();
            let status =
                inflater.decompress(&input[consumed..n], &mut output, FlushDecompress::None)?;
            consumed += (inflater.total_in() - before) as usize;
            match status {
                Status::StreamEnd => return Ok(inflater.total_in()),
                Status::Ok => {}
                Status::BufError => {
                    return Err(ZipError::InvalidArchive("deflate stream stalled"));
                }
            }
        }
    }
}
