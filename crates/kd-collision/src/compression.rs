//! Zlib compression of compiled maps.
//!
//! Compiled maps are stored as a zlib stream (with header and checksum) so a
//! damaged file fails decompression before any section is parsed.

use flate2::read::{ZlibDecoder, ZlibEncoder};
use flate2::Compression;
use std::io::{self, Read};

/// Compresses `data` with the default compression level.
pub fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(data, Compression::default());
    let mut compressed = Vec::with_capacity(data.len() / 2);
    encoder.read_to_end(&mut compressed)?;
    Ok(compressed)
}

/// Decompresses a zlib stream.
pub fn decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::with_capacity(data.len() * 4);
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}
