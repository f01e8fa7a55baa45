use std::io::Write;

use crate::codec::Compressor;
use crate::errors::{FilerErr, FilerResult};

pub const DEFAULT_LEVEL: i32 = 3;

/// Zstandard codec, better ratio than zlib at similar speed.
#[derive(Debug, Clone)]
pub struct ZstdCompressor {
    level: i32,
}

impl ZstdCompressor {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCompressor {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

impl Compressor for ZstdCompressor {
    fn compress(&self, raw: &[u8]) -> FilerResult<Vec<u8>> {
        let mut encoder = zstd::stream::Encoder::new(Vec::with_capacity(raw.len() / 2), self.level)?;
        // without a checksum a flipped byte can decode into plausible output
        encoder.include_checksum(true)?;
        encoder.write_all(raw)?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, compressed: &[u8]) -> FilerResult<Vec<u8>> {
        if compressed.is_empty() {
            return Err(FilerErr::corrupt("empty zstd stream"));
        }
        zstd::decode_all(compressed).map_err(FilerErr::corrupt)
    }

    fn token(&self) -> &'static str {
        "zst"
    }
}
