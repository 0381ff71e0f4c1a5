mod storage_runtime;
mod storage_scope;

pub use storage_runtime::{BackendKind, StorageBackends};
pub use storage_scope::{JsonFileStore, KeyValueStore, MemoryStore};

pub(crate) use storage_runtime::{repair_ids, sanitize_stored_groups};
