use std::io::{Read, Write};

use lz4_flex::frame::{FrameDecoder, FrameEncoder, FrameInfo};

use crate::codec::Compressor;
use crate::errors::{FilerErr, FilerResult};

const FRAME_MAGIC: u32 = 0x184D_2204;
const FLG_DICT_ID: u8 = 0x01;
const FLG_CONTENT_CHECKSUM: u8 = 0x04;
const FLG_CONTENT_SIZE: u8 = 0x08;
const FLG_BLOCK_CHECKSUM: u8 = 0x10;
/// magic, FLG, BD, content size
const CONTENT_SIZE_END: usize = 14;
const UNCOMPRESSED_BLOCK: u32 = 0x8000_0000;
/// Upper bound of the LZ4 expansion ratio, used to cap the output buffer a
/// header can ask for.
const MAX_RATIO: usize = 255;

/// LZ4 frame codec, fastest of the set with the lowest ratio. Suited to
/// large payloads where throughput matters more than size.
///
/// Frames carry their content size and a content checksum. The decoder
/// stops quietly at a missing block, so every frame is walked block by block
/// before decoding and must end with its end mark and checksum.
#[derive(Debug, Clone, Default)]
pub struct Lz4Compressor;

fn read_u32(frame: &[u8], at: usize) -> Option<u32> {
    let word = frame.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
}

/// Checks the frame layout and returns the content size its header declares.
fn declared_content_size(frame: &[u8]) -> FilerResult<u64> {
    let truncated = || FilerErr::corrupt("lz4 frame is truncated");
    if read_u32(frame, 0) != Some(FRAME_MAGIC) {
        return Err(FilerErr::corrupt("not an lz4 frame"));
    }
    let flg = *frame.get(4).ok_or_else(truncated)?;
    if flg & FLG_CONTENT_SIZE == 0 {
        return Err(FilerErr::corrupt("lz4 frame does not declare its content size"));
    }
    let size = frame.get(6..CONTENT_SIZE_END).ok_or_else(truncated)?;
    let size = u64::from_le_bytes(<[u8; 8]>::try_from(size).map_err(|_| truncated())?);

    let dict_id = if flg & FLG_DICT_ID != 0 { 4 } else { 0 };
    let block_checksum = if flg & FLG_BLOCK_CHECKSUM != 0 { 4 } else { 0 };
    // header checksum byte follows the optional dictionary id
    let mut pos = CONTENT_SIZE_END + dict_id + 1;
    loop {
        let word = read_u32(frame, pos).ok_or_else(truncated)?;
        pos += 4;
        if word == 0 {
            break;
        }
        let len = (word & !UNCOMPRESSED_BLOCK) as usize;
        pos = pos
            .checked_add(len + block_checksum)
            .filter(|end| *end <= frame.len())
            .ok_or_else(truncated)?;
    }
    if flg & FLG_CONTENT_CHECKSUM != 0 {
        pos += 4;
    }
    if pos > frame.len() {
        return Err(truncated());
    }
    if pos < frame.len() {
        return Err(FilerErr::corrupt("trailing bytes after lz4 frame"));
    }
    Ok(size)
}

impl Compressor for Lz4Compressor {
    fn compress(&self, raw: &[u8]) -> FilerResult<Vec<u8>> {
        let info = FrameInfo::new()
            .content_checksum(true)
            .content_size(Some(raw.len() as u64));
        let mut encoder = FrameEncoder::with_frame_info(info, Vec::with_capacity(raw.len() / 2));
        encoder.write_all(raw)?;
        encoder.finish().map_err(|e| FilerErr::Io(std::io::Error::other(e)))
    }

    fn decompress(&self, compressed: &[u8]) -> FilerResult<Vec<u8>> {
        let declared = declared_content_size(compressed)?;
        let capacity = usize::try_from(declared)
            .unwrap_or(usize::MAX)
            .min(compressed.len().saturating_mul(MAX_RATIO));
        let mut out = Vec::with_capacity(capacity);
        FrameDecoder::new(compressed)
            .read_to_end(&mut out)
            .map_err(FilerErr::corrupt)?;
        if out.len() as u64 != declared {
            return Err(FilerErr::corrupt(format!(
                "lz4 frame declares {declared} bytes but holds {}",
                out.len()
            )));
        }
        Ok(out)
    }

    fn token(&self) -> &'static str {
        "lz4"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::noise;

    /// Offset of the first block size word in frames this codec writes.
    const FIRST_BLOCK: usize = CONTENT_SIZE_END + 1;

    #[test]
    fn test_lz4_frame_magic() {
        let c = Lz4Compressor.compress(b"abc").unwrap();
        assert_eq!(&c[..4], &[0x04, 0x22, 0x4D, 0x18]);
        assert_eq!(declared_content_size(&c).unwrap(), 3);
    }

    #[test]
    fn test_lz4_checksum_catches_flipped_byte() {
        let data = b"lz4 payload with some repetition repetition repetition".repeat(64);
        let mut c = Lz4Compressor.compress(&data).unwrap();
        let last = c.len() - 1;
        c[last] ^= 0x01;
        assert!(matches!(Lz4Compressor.decompress(&c), Err(FilerErr::CorruptStream(_))));
    }

    #[test]
    fn test_lz4_cut_at_block_boundary() {
        let data = noise(9_000_000, 11);
        let c = Lz4Compressor.compress(&data).unwrap();
        let first_len = (read_u32(&c, FIRST_BLOCK).unwrap() & !UNCOMPRESSED_BLOCK) as usize;
        let cut = FIRST_BLOCK + 4 + first_len;
        assert!(cut < c.len());

        let err = Lz4Compressor.decompress(&c[..cut]).unwrap_err();
        assert!(matches!(err, FilerErr::CorruptStream(_)), "{err}");
    }

    #[test]
    fn test_lz4_missing_end_mark_and_checksum() {
        let data = b"abcdefgh".repeat(40_000);
        let c = Lz4Compressor.compress(&data).unwrap();
        for drop in 1..=8 {
            let err = Lz4Compressor.decompress(&c[..c.len() - drop]).unwrap_err();
            assert!(matches!(err, FilerErr::CorruptStream(_)), "dropped {drop}: {err}");
        }
    }

    #[test]
    fn test_lz4_trailing_bytes_rejected() {
        let mut c = Lz4Compressor.compress(b"payload").unwrap();
        c.extend_from_slice(b"junk");
        assert!(matches!(Lz4Compressor.decompress(&c), Err(FilerErr::CorruptStream(_))));
    }

    #[test]
    fn test_lz4_frame_without_content_size_rejected() {
        let mut encoder = FrameEncoder::new(Vec::new());
        encoder.write_all(b"no size in header").unwrap();
        let c = encoder.finish().unwrap();
        assert!(matches!(Lz4Compressor.decompress(&c), Err(FilerErr::CorruptStream(_))));
    }
}
