use std::path::PathBuf;

use blob_storage::{BackendKind, CodecKind, FilerConfig};
use clap::Parser;

#[derive(Parser, Debug)]
pub struct Args {
    #[clap(long, env = "FILER_HTTP_ADDR", default_value = "127.0.0.1:8000")]
    pub(crate) http_addr: String,
    #[clap(long, env = "FILER_DATA_DIR", default_value = "filer_data")]
    pub(crate) data_dir: PathBuf,
    /// `kv` (RocksDB) or `catalog` (SQLite)
    #[clap(long, env = "FILER_BACKEND", default_value = "kv")]
    pub(crate) backend: BackendKind,
    /// `zlib`, `zstd` or `lz4`
    #[clap(long, env = "FILER_CODEC", default_value = "zlib")]
    pub(crate) codec: CodecKind,
    #[clap(long, env = "FILER_ZSTD_LEVEL", default_value_t = 3)]
    pub(crate) zstd_level: i32,
    #[clap(long, env = "FILER_MAX_PART_SIZE", default_value_t = 128_000)]
    pub(crate) max_part_size: usize,
    #[clap(long, env = "FILER_MAX_UPLOAD_BYTES", default_value_t = 64 * 1024 * 1024)]
    pub(crate) max_upload_bytes: usize,
}

impl Args {
    pub fn filer_config(&self) -> FilerConfig {
        FilerConfig {
            backend: self.backend,
            codec: self.codec,
            data_dir: self.data_dir.clone(),
            max_part_size: self.max_part_size,
            zstd_level: self.zstd_level,
        }
    }
}
