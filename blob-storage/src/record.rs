use serde::Serialize;

use crate::codec::Codecs;

/// What a caller gets back from a successful save.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct FileContext {
    pub id: String,
    pub name: String,
    pub content_type: String,
}

/// A file read back from storage, decompressed.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// The compressed form of a record as a backend hands it back.
#[derive(Debug)]
pub struct StoredBlob {
    pub name: String,
    /// Present when the backend persisted the descriptor at save time.
    pub content_type: Option<String>,
    /// The codec that wrote `payload`.
    pub codec: Codecs,
    pub payload: Vec<u8>,
}
