use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};

use crate::chunker::{self, Part};
use crate::codec::Codecs;
use crate::errors::{FilerErr, FilerResult};
use crate::record::{FileContext, StoredBlob};
use crate::store::FileStore;

const MAX_CONNECTIONS: u32 = 8;

/// One `meta` row per record plus one `block` row per part, all keyed by
/// the record id. `idx` is 0 for the meta row and the part index for blocks.
const CREATE_FILE_BLOCKS: &str = r#"
CREATE TABLE IF NOT EXISTS file_blocks (
    file_id      TEXT    NOT NULL,
    type         TEXT    NOT NULL CHECK (type IN ('meta', 'block')),
    idx          INTEGER NOT NULL,
    name         TEXT,
    content_type TEXT,
    location     TEXT,
    part_count   INTEGER,
    data         BLOB,
    created_at   INTEGER,
    PRIMARY KEY (file_id, type, idx)
)
"#;

#[derive(sqlx::FromRow)]
struct MetaRow {
    name: String,
    content_type: String,
    location: String,
    part_count: i64,
}

#[derive(sqlx::FromRow)]
struct BlockRow {
    idx: i64,
    data: Vec<u8>,
}

/// SQLite catalog keeping compressed payloads as ordered block rows of at
/// most `max_part_size` bytes.
///
/// The meta row's `location` is `<id><codec suffix>`, which is how a read
/// finds the codec that wrote the record regardless of the current default.
#[derive(Debug, Clone)]
pub struct CatalogFileStore {
    pool: SqlitePool,
    path: PathBuf,
    max_part_size: usize,
}

impl CatalogFileStore {
    pub async fn open<P: AsRef<Path>>(path: P, max_part_size: usize) -> FilerResult<Self> {
        if max_part_size == 0 {
            return Err(FilerErr::InvalidConfig("max part size must be positive".into()));
        }
        let path = path.as_ref().to_path_buf();
        let unavailable = |e: sqlx::Error| {
            FilerErr::BackendUnavailable(format!("cannot open catalog at {}: {e}", path.display()))
        };

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(unavailable)?;
        sqlx::query(CREATE_FILE_BLOCKS).execute(&pool).await.map_err(unavailable)?;

        tracing::info!("opened catalog file store at {}", path.display());
        Ok(Self { pool, path, max_part_size })
    }

    fn ensure_open(&self) -> FilerResult<()> {
        if self.pool.is_closed() {
            return Err(FilerErr::BackendUnavailable(format!(
                "catalog at {} was cleaned up",
                self.path.display()
            )));
        }
        Ok(())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[async_trait]
impl FileStore for CatalogFileStore {
    async fn put_file(&self, file: &FileContext, codec: &Codecs, compressed: &[u8]) -> FilerResult<()> {
        self.ensure_open()?;
        let parts = chunker::split(compressed, self.max_part_size)?;
        let location = format!("{}{}", file.id, codec.as_trait().extension());

        // dropping the transaction on any error rolls the whole record back
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO file_blocks (file_id, type, idx, name, content_type, location, part_count, created_at) \
             VALUES (?, 'meta', 0, ?, ?, ?, ?, ?)",
        )
        .bind(file.id.as_str())
        .bind(file.name.as_str())
        .bind(file.content_type.as_str())
        .bind(location.as_str())
        .bind(parts.len() as i64)
        .bind(unix_now())
        .execute(&mut *tx)
        .await?;

        for (index, data) in parts.iter().enumerate() {
            sqlx::query("INSERT INTO file_blocks (file_id, type, idx, data) VALUES (?, 'block', ?, ?)")
                .bind(file.id.as_str())
                .bind(index as i64)
                .bind(*data)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!("catalog stored {} as {} part(s) at {}", file.id, parts.len(), location);
        Ok(())
    }

    async fn get_file(&self, id: &str, _codec: &Codecs) -> FilerResult<StoredBlob> {
        self.ensure_open()?;
        let mut tx = self.pool.begin().await?;
        let meta = sqlx::query_as::<_, MetaRow>(
            "SELECT name, content_type, location, part_count FROM file_blocks \
             WHERE file_id = ? AND type = 'meta' AND idx = 0",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| FilerErr::NotFound(id.to_string()))?;

        let blocks = sqlx::query_as::<_, BlockRow>(
            "SELECT idx, data FROM file_blocks WHERE file_id = ? AND type = 'block' ORDER BY idx",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let expected = usize::try_from(meta.part_count)
            .map_err(|_| FilerErr::corrupt(format!("negative part count for {id}")))?;
        let parts = blocks
            .into_iter()
            .map(|b| {
                usize::try_from(b.idx)
                    .map(|index| Part::new(index, b.data))
                    .map_err(|_| FilerErr::corrupt(format!("negative part index for {id}")))
            })
            .collect::<FilerResult<Vec<_>>>()?;
        let payload = chunker::join(parts, expected)?;

        Ok(StoredBlob {
            codec: Codecs::from_extension(&meta.location)?,
            name: meta.name,
            content_type: Some(meta.content_type),
            payload,
        })
    }

    async fn cleanup(&self) -> FilerResult<()> {
        self.pool.close().await;
        tracing::info!("closed catalog file store at {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecKind;
    use crate::sniff::detect_content_type;
    use crate::test_support::{fake_jpeg, noise};
    use tempfile::{tempdir, TempDir};
    use uuid::Uuid;

    async fn open_store(max_part_size: usize) -> (TempDir, CatalogFileStore) {
        let dir = tempdir().unwrap();
        let store = CatalogFileStore::open(dir.path().join("catalog.db"), max_part_size)
            .await
            .unwrap();
        (dir, store)
    }

    fn context(name: &str, content_type: &str) -> FileContext {
        FileContext {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            content_type: content_type.to_string(),
        }
    }

    async fn count_rows(store: &CatalogFileStore, id: &str, kind: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM file_blocks WHERE file_id = ? AND type = ?")
            .bind(id)
            .bind(kind)
            .fetch_one(&store.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get_multi_part() {
        let (_dir, store) = open_store(100).await;
        let file = context("blob.bin", "application/octet-stream");
        let payload = noise(1_050, 7);

        store.put_file(&file, &Codecs::default(), &payload).await.unwrap();

        assert_eq!(count_rows(&store, &file.id, "meta").await, 1);
        assert_eq!(count_rows(&store, &file.id, "block").await, 11);
        let blob = store.get_file(&file.id, &Codecs::default()).await.unwrap();
        assert_eq!(blob.payload, payload);
        assert_eq!(blob.name, "blob.bin");
        assert_eq!(blob.content_type.as_deref(), Some("application/octet-stream"));
    }

    #[tokio::test]
    async fn test_empty_payload_has_no_blocks() {
        let (_dir, store) = open_store(100).await;
        let file = context("empty", "text/plain; charset=utf-8");

        store.put_file(&file, &Codecs::default(), &[]).await.unwrap();

        assert_eq!(count_rows(&store, &file.id, "block").await, 0);
        let blob = store.get_file(&file.id, &Codecs::default()).await.unwrap();
        assert!(blob.payload.is_empty());
    }

    #[tokio::test]
    async fn test_jpeg_fits_single_part() {
        let (_dir, store) = open_store(128_000).await;
        let codec = Codecs::new(CodecKind::Zlib, 3);
        let raw = fake_jpeg(82_569);
        let file = context("test.jpg", detect_content_type(&raw));
        let compressed = codec.as_trait().compress(&raw).unwrap();

        store.put_file(&file, &codec, &compressed).await.unwrap();

        assert_eq!(count_rows(&store, &file.id, "block").await, 1);
        let blob = store.get_file(&file.id, &codec).await.unwrap();
        let restored = blob.codec.as_trait().decompress(&blob.payload).unwrap();
        assert_eq!(restored.len(), 82_569);
        assert_eq!(detect_content_type(&restored), "image/jpeg");
        assert_eq!(blob.content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_location_records_codec() {
        let (_dir, store) = open_store(100).await;
        let file = context("z.bin", "application/octet-stream");
        let writer = Codecs::new(CodecKind::Lz4, 3);

        store.put_file(&file, &writer, b"abc").await.unwrap();

        let location: String =
            sqlx::query_scalar("SELECT location FROM file_blocks WHERE file_id = ? AND type = 'meta'")
                .bind(file.id.as_str())
                .fetch_one(&store.pool)
                .await
                .unwrap();
        assert_eq!(location, format!("{}.lz4", file.id));
        let blob = store.get_file(&file.id, &Codecs::default()).await.unwrap();
        assert_eq!(blob.codec.kind(), CodecKind::Lz4);
    }

    #[tokio::test]
    async fn test_unknown_id_not_found() {
        let (_dir, store) = open_store(100).await;
        let err = store.get_file("nonexistent-id", &Codecs::default()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_block_insert_rolls_back() {
        let (_dir, store) = open_store(64).await;
        sqlx::query(
            "CREATE TRIGGER fail_second_block BEFORE INSERT ON file_blocks \
             WHEN NEW.type = 'block' AND NEW.idx = 1 \
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END",
        )
        .execute(&store.pool)
        .await
        .unwrap();
        let file = context("doomed.bin", "application/octet-stream");

        let res = store.put_file(&file, &Codecs::default(), &noise(300, 3)).await;

        assert!(matches!(res, Err(FilerErr::Catalog(_))));
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM file_blocks")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(total, 0);
        let err = store.get_file(&file.id, &Codecs::default()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_block_detected() {
        let (_dir, store) = open_store(10).await;
        let file = context("holes.bin", "application/octet-stream");
        store.put_file(&file, &Codecs::default(), &noise(35, 1)).await.unwrap();

        sqlx::query("DELETE FROM file_blocks WHERE file_id = ? AND type = 'block' AND idx = 3")
            .bind(file.id.as_str())
            .execute(&store.pool)
            .await
            .unwrap();

        let err = store.get_file(&file.id, &Codecs::default()).await.unwrap_err();
        assert!(matches!(err, FilerErr::MissingPart { index: 3, count: 4 }));
    }

    #[tokio::test]
    async fn test_cleanup_closes_pool() {
        let (_dir, store) = open_store(10).await;
        store.cleanup().await.unwrap();
        store.cleanup().await.unwrap();
        let err = store.get_file("any", &Codecs::default()).await.unwrap_err();
        assert!(matches!(err, FilerErr::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_zero_part_size_rejected() {
        let dir = tempdir().unwrap();
        let err = CatalogFileStore::open(dir.path().join("c.db"), 0).await.unwrap_err();
        assert!(matches!(err, FilerErr::InvalidConfig(_)));
    }
}
