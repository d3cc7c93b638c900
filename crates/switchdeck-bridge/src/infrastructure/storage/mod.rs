//! File-system storage for the bridge.

pub mod mappings;

pub use mappings::{load_mapping_table, read_mapping_document, StorageError};
