//! File persistence with corruption recovery
//!
//! Features:
//! - Atomic save (write `<app-id>.json.tmp`, then rename over `<app-id>.json`)
//! - Corruption detection on load
//! - Backup of unreadable files to `<app-id>.unreadable.json`
//! - Post-save change notification

pub mod paths;
pub mod store;

pub use paths::ConfigPaths;
pub use store::{LoadOutcome, PersistenceStore, SaveListener};

use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecError;

/// Errors raised by store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unable to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl StoreError {
    pub(crate) fn io(
        op: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StoreError::Io { op, path, source }
    }
}
