use async_trait::async_trait;

use crate::catalog_store::CatalogFileStore;
use crate::codec::Codecs;
use crate::errors::FilerResult;
use crate::kv_store::RocksFileStore;
use crate::record::{FileContext, StoredBlob};

/// Durable storage for compressed records, keyed by record id.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persists the record described by `file` with its compressed payload.
    ///
    /// Either the whole record becomes visible or none of it does.
    async fn put_file(&self, file: &FileContext, codec: &Codecs, compressed: &[u8]) -> FilerResult<()>;

    /// Loads the compressed record stored under `id`.
    ///
    /// `codec` is the deployment default; a store that remembers which codec
    /// wrote the record returns that one instead.
    async fn get_file(&self, id: &str, codec: &Codecs) -> FilerResult<StoredBlob>;

    /// Releases the store's resources. Meant to run once, at shutdown.
    async fn cleanup(&self) -> FilerResult<()>;
}

#[derive(Debug)]
pub enum FileStores {
    Rocks(RocksFileStore),
    Catalog(CatalogFileStore),
}

impl FileStores {
    /// Returns a reference to the inner value as a trait object.
    pub fn as_trait(&self) -> &dyn FileStore {
        match self {
            FileStores::Rocks(a) => a,
            FileStores::Catalog(b) => b,
        }
    }
}
