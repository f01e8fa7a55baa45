//! Deterministic payloads for tests.

/// Pseudo-random bytes from a xorshift generator.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

fn with_header(header: &[u8], len: usize, seed: u64) -> Vec<u8> {
    let mut data = header.to_vec();
    data.extend(noise(len.saturating_sub(header.len()), seed));
    data.truncate(len);
    data
}

/// PNG signature and IHDR chunk header followed by noise.
pub fn fake_png(len: usize) -> Vec<u8> {
    with_header(b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR", len, 0x504E47)
}

/// JPEG SOI and JFIF APP0 marker followed by noise.
pub fn fake_jpeg(len: usize) -> Vec<u8> {
    with_header(b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00", len, 0x4A5047)
}
