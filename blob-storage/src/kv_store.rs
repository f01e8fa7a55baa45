use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use rocksdb::{Options, WriteBatch, WriteOptions, DB};

use crate::codec::Codecs;
use crate::errors::{FilerErr, FilerResult};
use crate::record::{FileContext, StoredBlob};
use crate::store::FileStore;

/// Namespace of the keys holding compressed payloads. Record ids are UUIDs,
/// so no name key can ever collide with a data key.
pub const DATA_KEY_PREFIX: &str = "file:///";

/// Largest single value RocksDB accepts.
pub const MAX_VALUE_SIZE: usize = u32::MAX as usize;

fn name_key(id: &str) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn data_key(id: &str) -> Vec<u8> {
    format!("{DATA_KEY_PREFIX}{id}").into_bytes()
}

/// Keeps each record as two RocksDB keys: `<id>` for the name and
/// `file:///<id>` for the compressed bytes. Payloads are not chunked, so a
/// record is bounded by [`MAX_VALUE_SIZE`].
///
/// `cleanup` drops the handle, releasing the database lock while the store
/// value itself may still be shared.
pub struct RocksFileStore {
    db: RwLock<Option<DB>>,
    path: PathBuf,
}

impl fmt::Debug for RocksFileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let closed = self.db.read().map(|db| db.is_none()).unwrap_or(true);
        f.debug_struct("RocksFileStore")
            .field("path", &self.path)
            .field("closed", &closed)
            .finish()
    }
}

impl RocksFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> FilerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, &path).map_err(|e| {
            FilerErr::BackendUnavailable(format!("cannot open RocksDB at {}: {e}", path.display()))
        })?;
        tracing::info!("opened RocksDB file store at {}", path.display());
        Ok(Self::from_db(db, path))
    }

    fn from_db(db: DB, path: PathBuf) -> Self {
        Self { db: RwLock::new(Some(db)), path }
    }

    fn unavailable(&self, why: &str) -> FilerErr {
        FilerErr::BackendUnavailable(format!("RocksDB file store at {} {why}", self.path.display()))
    }

    /// Runs `f` against the open handle. The lock is never held across an
    /// await point.
    fn with_db<T>(&self, f: impl FnOnce(&DB) -> FilerResult<T>) -> FilerResult<T> {
        let guard = self.db.read().map_err(|_| self.unavailable("has a poisoned lock"))?;
        let db = guard.as_ref().ok_or_else(|| self.unavailable("was cleaned up"))?;
        f(db)
    }
}

#[async_trait]
impl FileStore for RocksFileStore {
    async fn put_file(&self, file: &FileContext, _codec: &Codecs, compressed: &[u8]) -> FilerResult<()> {
        if compressed.len() > MAX_VALUE_SIZE {
            return Err(FilerErr::ValueTooLarge { size: compressed.len(), limit: MAX_VALUE_SIZE });
        }

        let mut batch = WriteBatch::default();
        batch.put(name_key(&file.id), file.name.as_bytes());
        batch.put(data_key(&file.id), compressed);

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.with_db(|db| Ok(db.write_opt(batch, &write_opts)?))
    }

    async fn get_file(&self, id: &str, codec: &Codecs) -> FilerResult<StoredBlob> {
        let (name, payload) = self.with_db(|db| {
            // both keys come from the same point in time
            let snapshot = db.snapshot();
            let name = snapshot
                .get(name_key(id))?
                .ok_or_else(|| FilerErr::NotFound(id.to_string()))?;
            let payload = snapshot
                .get(data_key(id))?
                .ok_or_else(|| FilerErr::NotFound(id.to_string()))?;
            Ok((name, payload))
        })?;

        let name = String::from_utf8(name)
            .map_err(|e| FilerErr::corrupt(format!("name stored under {id} is not UTF-8: {e}")))?;
        Ok(StoredBlob {
            name,
            content_type: None,
            codec: codec.clone(),
            payload,
        })
    }

    async fn cleanup(&self) -> FilerResult<()> {
        let db = self
            .db
            .write()
            .map_err(|_| self.unavailable("has a poisoned lock"))?
            .take();
        let Some(db) = db else {
            return Ok(());
        };
        let flushed = db.flush().and_then(|_| db.flush_wal(true));
        drop(db);
        flushed?;
        tracing::info!("closed RocksDB file store at {}", self.path.display());
        Ok(())
    }
}
