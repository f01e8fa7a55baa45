use thiserror::Error;

pub type FilerResult<T> = Result<T, FilerErr>;

#[derive(Debug, Error)]
pub enum FilerErr {
    #[error("No file stored under id {0}")]
    NotFound(String),

    #[error("Compressed stream is corrupt: {0}")]
    CorruptStream(String),

    #[error("Part {index} of {count} is missing")]
    MissingPart { index: usize, count: usize },

    #[error("Part {index} appears more than once")]
    DuplicatePart { index: usize },

    #[error("Value of {size} bytes exceeds the store limit of {limit} bytes")]
    ValueTooLarge { size: usize, limit: usize },

    #[error("Unknown codec: {0}")]
    UnknownCodec(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RocksDB error: {0}")]
    Rocks(#[from] rocksdb::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] sqlx::Error),
}

impl FilerErr {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FilerErr::NotFound(_))
    }

    pub(crate) fn corrupt(msg: impl std::fmt::Display) -> Self {
        FilerErr::CorruptStream(msg.to_string())
    }
}
