use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::codec::Compressor;
use crate::errors::{FilerErr, FilerResult};

/// Deflate-family codec: moderate ratio, small memory footprint.
#[derive(Debug, Clone, Default)]
pub struct ZlibCompressor;

impl Compressor for ZlibCompressor {
    fn compress(&self, raw: &[u8]) -> FilerResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
        encoder.write_all(raw)?;
        Ok(encoder.finish()?)
    }

    // Driven by hand instead of through `ZlibDecoder`: the reader reports a
    // stream that stops early as a clean EOF.
    fn decompress(&self, compressed: &[u8]) -> FilerResult<Vec<u8>> {
        let mut inflater = Decompress::new(true);
        let mut out = Vec::with_capacity(compressed.len().saturating_mul(4).max(64));
        loop {
            if out.len() == out.capacity() {
                out.reserve(out.capacity());
            }
            let consumed = inflater.total_in() as usize;
            let produced = inflater.total_out();
            let status = inflater
                .decompress_vec(&compressed[consumed..], &mut out, FlushDecompress::None)
                .map_err(FilerErr::corrupt)?;
            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    let stalled = inflater.total_in() as usize == consumed && inflater.total_out() == produced;
                    if stalled && out.len() < out.capacity() {
                        return Err(FilerErr::corrupt("zlib stream ends before its end marker"));
                    }
                }
            }
        }
        if inflater.total_in() as usize != compressed.len() {
            return Err(FilerErr::corrupt("trailing bytes after zlib stream"));
        }
        Ok(out)
    }

    fn token(&self) -> &'static str {
        "zlib"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zlib_header() {
        let c = ZlibCompressor::default().compress(b"hello hello hello").unwrap();
        // CMF byte for deflate with a 32K window
        assert_eq!(c[0], 0x78);
    }

    #[test]
    fn test_zlib_reads_any_level() {
        let data = b"aaaaaaaaaabbbbbbbbbbaaaaaaaaaabbbbbbbbbb".repeat(500);
        for level in [0, 1, 6, 9] {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
            encoder.write_all(&data).unwrap();
            let c = encoder.finish().unwrap();
            assert_eq!(ZlibCompressor.decompress(&c).unwrap(), data);
        }
    }

    #[test]
    fn test_zlib_trailing_bytes_rejected() {
        let codec = ZlibCompressor::default();
        let mut c = codec.compress(b"payload").unwrap();
        c.extend_from_slice(b"junk");
        assert!(matches!(codec.decompress(&c), Err(FilerErr::CorruptStream(_))));
    }

    #[test]
    fn test_zlib_bit_flip_rejected() {
        let codec = ZlibCompressor::default();
        let data = b"the quick brown fox jumps over the lazy dog".repeat(100);
        let mut c = codec.compress(&data).unwrap();
        let last = c.len() - 1;
        // the adler32 trailer no longer matches
        c[last] ^= 0xFF;
        assert!(matches!(codec.decompress(&c), Err(FilerErr::CorruptStream(_))));
    }
}
