//! Compression method constants.
//!
//! Records store the method as a raw `u16` so that tests can write any
//! value; this module names the two methods the transformer understands and
//! describes the rest for trace output.

/// The entry data is stored with no compression.
pub const STORED: u16 = 0;

/// The entry data is compressed with raw deflate.
pub const DEFLATED: u16 = 8;

/// Human-readable name of a compression method, for trace output.
pub fn describe(method: u16) -> &'static str {
    match method {
        0 => "Stored (no compression)",
        1 => "Shrunk",
        2 => "Reduced with compression factor 1",
        3 => "Reduced with compression factor 2",
        4 => "Reduced with compression factor 3",
        5 => "Reduced with compression factor 4",
        6 => "Imploded",
        7 => "Reserved for Tokenizing compression algorithm",
        8 => "Deflated",
        9 => "Enhanced Deflating using Deflate64(tm)",
        10 => "PKWARE Data Compression Library Imploding (old IBM TERSE)",
        11 | 13 | 15 | 17 => "Reserved by PKWARE",
        12 => "BZIP2",
        14 => "LZMA",
        16 => "IBM z/OS CMPSC Compression",
        18 => "IBM TERSE (new)",
        19 => "IBM LZ77 z Architecture",
        20 => "deprecated (use method 93 for zstd)",
        93 => "Zstandard (zstd) Compression",
        94 => "MP3",
        95 => "XZ",
        96 => "JPEG variant",
        97 => "WavPack",
        98 => "PPMd version I, Rev 1",
        99 => "AE-x encryption marker",
        _ => "Unknown compression method",
    }
}
