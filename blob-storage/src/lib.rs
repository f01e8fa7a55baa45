//! Compressed blob storage behind a single `Filer` facade.
//!
//! Payloads are compressed with a configurable codec and persisted either in
//! RocksDB (two keys per record) or in a SQLite catalog that splits the
//! compressed bytes into ordered block rows.

pub mod catalog_store;
pub mod chunker;
pub mod codec;
pub mod config;
pub mod errors;
pub mod filer;
pub mod kv_store;
pub mod record;
pub mod sniff;
pub mod store;

#[cfg(test)]
mod test_support;

pub use codec::{CodecKind, Codecs, Compressor};
pub use config::{BackendKind, FilerConfig};
pub use errors::{FilerErr, FilerResult};
pub use filer::Filer;
pub use record::{FileContext, StoredFile};
