use uuid::Uuid;

use crate::catalog_store::CatalogFileStore;
use crate::codec::Codecs;
use crate::config::{BackendKind, FilerConfig};
use crate::errors::{FilerErr, FilerResult};
use crate::kv_store::RocksFileStore;
use crate::record::{FileContext, StoredFile};
use crate::sniff::detect_content_type;
use crate::store::FileStores;

/// Entry point of the crate: one storage backend plus the codec every save
/// goes through.
///
/// A `Filer` is built once at startup and shared by every request; it keeps
/// no per-record state of its own.
#[derive(Debug)]
pub struct Filer {
    store: FileStores,
    codec: Codecs,
}

impl Filer {
    pub fn new(store: FileStores, codec: Codecs) -> Self {
        Self { store, codec }
    }

    /// Opens the backend named by `config`. Any failure to bring the backend
    /// up is reported as `BackendUnavailable`.
    pub async fn open(config: &FilerConfig) -> FilerResult<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            FilerErr::BackendUnavailable(format!("cannot create {}: {e}", config.data_dir.display()))
        })?;

        let store = match config.backend {
            BackendKind::Kv => FileStores::Rocks(RocksFileStore::open(config.rocks_path())?),
            BackendKind::Catalog => FileStores::Catalog(
                CatalogFileStore::open(config.catalog_path(), config.max_part_size).await?,
            ),
        };
        tracing::info!("filer ready on {} backend with {} codec", config.backend, config.codec);
        Ok(Self::new(store, Codecs::new(config.codec, config.zstd_level)))
    }

    /// Compresses and stores `data` under a freshly generated id.
    pub async fn save_file(&self, name: &str, data: &[u8]) -> FilerResult<FileContext> {
        let file = FileContext {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            content_type: detect_content_type(data).to_string(),
        };
        let compressed = self.codec.as_trait().compress(data)?;

        if let Err(e) = self.store.as_trait().put_file(&file, &self.codec, &compressed).await {
            tracing::error!("failed to save {}: {}", name, e);
            return Err(e);
        }
        tracing::info!(
            "saved {} as {} ({} bytes, {} compressed)",
            file.name,
            file.id,
            data.len(),
            compressed.len()
        );
        Ok(file)
    }

    /// Loads and decompresses the file stored under `id`.
    pub async fn read_file(&self, id: &str) -> FilerResult<StoredFile> {
        let blob = self.store.as_trait().get_file(id, &self.codec).await?;
        let data = blob.codec.as_trait().decompress(&blob.payload).map_err(|e| {
            tracing::error!("stored payload of {} does not decompress: {}", id, e);
            e
        })?;
        // stores that do not keep the descriptor get it re-derived from the same bytes
        let content_type = blob
            .content_type
            .unwrap_or_else(|| detect_content_type(&data).to_string());

        tracing::debug!("read {} ({} bytes)", id, data.len());
        Ok(StoredFile {
            id: id.to_string(),
            name: blob.name,
            content_type,
            data,
        })
    }

    /// Releases the backend. Called once, at shutdown.
    pub async fn cleanup(&self) -> FilerResult<()> {
        self.store.as_trait().cleanup().await
    }
}
