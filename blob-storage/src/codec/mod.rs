use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::codec::lz4::Lz4Compressor;
use crate::codec::zlib::ZlibCompressor;
use crate::codec::zstandard::ZstdCompressor;
use crate::errors::{FilerErr, FilerResult};

pub mod lz4;
pub mod zlib;
pub mod zstandard;

/// A symmetric compression transform over whole in-memory payloads.
///
/// Implementations keep no state between calls, so a single instance can be
/// shared by every concurrent save and read.
pub trait Compressor: Send + Sync {
    /// Compresses the full payload.
    fn compress(&self, raw: &[u8]) -> FilerResult<Vec<u8>>;

    /// Restores a payload produced by `compress` of the same codec.
    ///
    /// Anything else, including a stream that stops before its end marker,
    /// fails with `FilerErr::CorruptStream`.
    fn decompress(&self, compressed: &[u8]) -> FilerResult<Vec<u8>>;

    /// Short stable name of the codec, used for storage path naming.
    fn token(&self) -> &'static str;

    /// File suffix written after a record id, e.g. `.zlib`.
    fn extension(&self) -> String {
        format!(".{}", self.token())
    }
}

/// Names a codec in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Zlib,
    Zstd,
    Lz4,
}

impl FromStr for CodecKind {
    type Err = FilerErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zlib" => Ok(CodecKind::Zlib),
            "zstd" => Ok(CodecKind::Zstd),
            "lz4" => Ok(CodecKind::Lz4),
            other => Err(FilerErr::UnknownCodec(other.to_string())),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecKind::Zlib => write!(f, "zlib"),
            CodecKind::Zstd => write!(f, "zstd"),
            CodecKind::Lz4 => write!(f, "lz4"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Codecs {
    Zlib(ZlibCompressor),
    Zstd(ZstdCompressor),
    Lz4(Lz4Compressor),
}

impl Codecs {
    pub fn new(kind: CodecKind, zstd_level: i32) -> Self {
        match kind {
            CodecKind::Zlib => Codecs::Zlib(ZlibCompressor::default()),
            CodecKind::Zstd => Codecs::Zstd(ZstdCompressor::new(zstd_level)),
            CodecKind::Lz4 => Codecs::Lz4(Lz4Compressor),
        }
    }

    /// Returns a reference to the inner value as a trait object.
    pub fn as_trait(&self) -> &dyn Compressor {
        match self {
            Codecs::Zlib(c) => c,
            Codecs::Zstd(c) => c,
            Codecs::Lz4(c) => c,
        }
    }

    pub fn kind(&self) -> CodecKind {
        match self {
            Codecs::Zlib(_) => CodecKind::Zlib,
            Codecs::Zstd(_) => CodecKind::Zstd,
            Codecs::Lz4(_) => CodecKind::Lz4,
        }
    }

    /// Picks the codec whose suffix ends `location`.
    ///
    /// Decoding does not depend on a zstd level, so the default one is used.
    pub fn from_extension(location: &str) -> FilerResult<Self> {
        let token = location
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .ok_or_else(|| FilerErr::UnknownCodec(location.to_string()))?;
        [CodecKind::Zlib, CodecKind::Zstd, CodecKind::Lz4]
            .into_iter()
            .map(|kind| Codecs::new(kind, zstandard::DEFAULT_LEVEL))
            .find(|codec| codec.as_trait().token() == token)
            .ok_or_else(|| FilerErr::UnknownCodec(token.to_string()))
    }
}

impl Default for Codecs {
    fn default() -> Self {
        Codecs::new(CodecKind::default(), zstandard::DEFAULT_LEVEL)
    }
}
