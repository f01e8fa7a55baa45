use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::chunker::DEFAULT_MAX_PART_SIZE;
use crate::codec::zstandard::DEFAULT_LEVEL;
use crate::codec::CodecKind;
use crate::errors::FilerErr;

/// Which storage backend a filer runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// RocksDB, two keys per record.
    #[default]
    Kv,
    /// SQLite catalog with the payload split into block rows.
    Catalog,
}

impl FromStr for BackendKind {
    type Err = FilerErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kv" | "rocks" | "filer_rocks" => Ok(BackendKind::Kv),
            "catalog" | "sqlite" | "filer_catalog" => Ok(BackendKind::Catalog),
            other => Err(FilerErr::InvalidConfig(format!("unknown backend `{other}`"))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Kv => write!(f, "kv"),
            BackendKind::Catalog => write!(f, "catalog"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilerConfig {
    pub backend: BackendKind,
    pub codec: CodecKind,
    /// Directory holding the RocksDB files or the catalog database.
    pub data_dir: PathBuf,
    pub max_part_size: usize,
    pub zstd_level: i32,
}

impl Default for FilerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            codec: CodecKind::default(),
            data_dir: PathBuf::from("filer_data"),
            max_part_size: DEFAULT_MAX_PART_SIZE,
            zstd_level: DEFAULT_LEVEL,
        }
    }
}

impl FilerConfig {
    pub fn rocks_path(&self) -> PathBuf {
        self.data_dir.join("rocks_db")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog.db")
    }

    pub fn validate(&self) -> Result<(), FilerErr> {
        if self.max_part_size == 0 {
            return Err(FilerErr::InvalidConfig("max_part_size must be positive".into()));
        }
        if !(1..=22).contains(&self.zstd_level) {
            return Err(FilerErr::InvalidConfig(format!(
                "zstd_level {} is outside 1..=22",
                self.zstd_level
            )));
        }
        Ok(())
    }
}
