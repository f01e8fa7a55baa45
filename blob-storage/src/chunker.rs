//! Splitting of compressed payloads into bounded-size parts and their
//! reassembly.

use crate::errors::{FilerErr, FilerResult};

/// Part size used by existing deployments.
pub const DEFAULT_MAX_PART_SIZE: usize = 128_000;

/// One index-ordered slice of a compressed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub index: usize,
    pub data: Vec<u8>,
}

impl Part {
    pub fn new(index: usize, data: Vec<u8>) -> Self {
        Self { index, data }
    }
}

/// Number of parts `split` produces for `len` bytes.
pub fn part_count(len: usize, max_part_size: usize) -> usize {
    len.div_ceil(max_part_size.max(1))
}

/// Splits `data` into consecutive slices of at most `max_part_size` bytes.
///
/// Empty input gives no parts; the last part is never empty.
pub fn split(data: &[u8], max_part_size: usize) -> FilerResult<Vec<&[u8]>> {
    if max_part_size == 0 {
        return Err(FilerErr::InvalidConfig("max part size must be positive".into()));
    }
    Ok(data.chunks(max_part_size).collect())
}

/// Concatenates parts by their index, ignoring the order they arrived in.
///
/// Every index in `[0, expected)` must be present exactly once.
pub fn join(mut parts: Vec<Part>, expected: usize) -> FilerResult<Vec<u8>> {
    parts.sort_by_key(|p| p.index);

    let mut joined = Vec::with_capacity(parts.iter().map(|p| p.data.len()).sum());
    let mut next = 0usize;
    for part in parts {
        if part.index < next {
            return Err(FilerErr::DuplicatePart { index: part.index });
        }
        if part.index != next || next >= expected {
            return Err(FilerErr::MissingPart { index: next, count: expected });
        }
        joined.extend_from_slice(&part.data);
        next += 1;
    }
    if next != expected {
        return Err(FilerErr::MissingPart { index: next, count: expected });
    }
    Ok(joined)
}
