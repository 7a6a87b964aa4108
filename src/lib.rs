//! Framework config - persisted application settings
//!
//! Core modules:
//! - `schema`: Field table and the `Schema` trait
//! - `settings`: The option set and its defaults
//! - `codec`: JSON encoding with default fallback
//! - `persistence`: Atomic save, load and corrupt-file backup
//! - `cache`: Lazily loaded process-wide instance
//! - `form`: Schema-driven option form

pub mod cache;
pub mod codec;
pub mod form;
pub mod persistence;
pub mod schema;
pub mod settings;

pub use cache::{Instance, InstanceCache};
pub use persistence::{ConfigPaths, PersistenceStore, StoreError};
pub use schema::Schema;
pub use settings::{CustomObject, Options, RecordId, TriState};

use std::sync::OnceLock;

/// Host application identifier; names the config files
pub const APP_ID: &str = "framework";

static CONFIG: OnceLock<InstanceCache<Options>> = OnceLock::new();

/// The process-wide options cache.
///
/// Files live under [`ConfigPaths::from_env`] for [`APP_ID`]. Nothing is read
/// from disk until the first [`InstanceCache::get`].
pub fn config() -> &'static InstanceCache<Options> {
    CONFIG.get_or_init(|| InstanceCache::new(ConfigPaths::from_env(APP_ID)))
}

/// Shorthand for `config().get()`.
///
/// Hold at most one instance per thread. While it is held, `config().save()`
/// is deferred until it drops, and another `options()` on the same thread
/// panics.
pub fn options() -> Instance<'static, Options> {
    config().get()
}
