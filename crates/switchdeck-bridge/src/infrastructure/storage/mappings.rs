//! Mapping document loading.
//!
//! The mapping file is read in two ways:
//!
//! - [`load_mapping_table`] parses it once at startup into the typed
//!   [`MappingTable`] the translator uses for the rest of the run.
//! - [`read_mapping_document`] re-reads it as an untyped JSON value for the
//!   `/api/mappings` endpoint, so the UI always sees the file as it is on
//!   disk now, not as it was at startup.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use switchdeck_core::domain::mapping::MappingCategory;
use switchdeck_core::{IgnoredKey, MappingError, MappingTable};

/// Error type for mapping file operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The file could not be read.
    #[error("I/O error reading mappings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its content is not a valid mapping document.
    #[error("failed to parse mappings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: MappingError,
    },

    /// The file is not valid JSON.
    #[error("mappings at {path} are not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads and parses the mapping document at `path`.
///
/// Entries that can never fire (unknown action strings, actions bound in the
/// wrong table) are kept and logged as warnings; triggering them later is a
/// logged no-op.  Keys that are not MIDI numbers in 0–127 are dropped with a
/// warning.
///
/// # Errors
///
/// Returns [`StorageError::Io`] if the file cannot be read and
/// [`StorageError::Parse`] if it is not a valid mapping document.
pub fn load_mapping_table(path: &Path) -> Result<MappingTable, StorageError> {
    let content = std::fs::read_to_string(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (table, ignored) = MappingTable::parse(&content).map_err(|source| StorageError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let cc_count = table.control_change_mappings.as_ref().map_or(0, |m| m.len());
    info!(
        "loaded {} note and {cc_count} control-change mappings from {}",
        table.note_mappings.len(),
        path.display()
    );

    for IgnoredKey { category, key } in ignored {
        warn!(
            "{} key '{key}' is not a MIDI number in 0-127; entry dropped",
            kind_name(category)
        );
    }

    for (category, id, entry) in table.unusable_entries() {
        let kind = kind_name(category);
        warn!(
            "{kind} {id} is bound to '{}', which is not a {kind} action; it will be ignored",
            entry.action_name()
        );
    }

    Ok(table)
}

fn kind_name(category: MappingCategory) -> &'static str {
    match category {
        MappingCategory::Note => "note",
        MappingCategory::ControlChange => "controller",
    }
}

/// Reads the mapping document at `path` as raw JSON.
///
/// # Errors
///
/// Returns [`StorageError::Io`] if the file cannot be read and
/// [`StorageError::Json`] if it is not valid JSON.
pub async fn read_mapping_document(path: &Path) -> Result<serde_json::Value, StorageError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_str(&content).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
