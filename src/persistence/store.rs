//! Load, atomic save and backup against a fixed config path

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::{ConfigPaths, StoreError};
use crate::codec;
use crate::schema::Schema;

/// Callback invoked with the freshly saved instance after every successful save
pub type SaveListener<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Result of reading the primary file
#[derive(Debug)]
pub enum LoadOutcome<S> {
    /// No file on disk yet
    Missing,
    Loaded(S),
    /// The file could not be read or decoded. It has been moved to the backup
    /// slot unless that move failed.
    Unreadable,
}

impl<S> LoadOutcome<S> {
    pub fn into_instance(self) -> Option<S> {
        match self {
            LoadOutcome::Loaded(instance) => Some(instance),
            _ => None,
        }
    }
}

/// File operations for one schema type
pub struct PersistenceStore<S: Schema> {
    paths: ConfigPaths,
    listener: RwLock<Option<SaveListener<S>>>,
    // Held across encode, write and rename
    write_lock: Mutex<()>,
}

impl<S: Schema> PersistenceStore<S> {
    pub fn new(paths: ConfigPaths) -> Self {
        Self {
            paths,
            listener: RwLock::new(None),
            write_lock: Mutex::new(()),
        }
    }

    /// Register the change listener at construction time
    pub fn with_listener<F>(self, f: F) -> Self
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.set_listener(f);
        self
    }

    /// Install or replace the change listener
    pub fn set_listener<F>(&self, f: F)
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        *self.listener.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(f));
    }

    pub fn clear_listener(&self) {
        *self.listener.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Read the primary file.
    ///
    /// Only a file that does not exist is [`LoadOutcome::Missing`]. Any
    /// other read or decode failure moves the file to the backup slot and
    /// reports [`LoadOutcome::Unreadable`]; the caller falls back to defaults.
    pub fn load(&self) -> LoadOutcome<S> {
        let file = self.paths.primary();
        match read(&file) {
            Ok(None) => {
                log::info!("No config at {}, using defaults", file.display());
                LoadOutcome::Missing
            }
            Ok(Some(instance)) => {
                log::info!("Loaded config from {}", file.display());
                LoadOutcome::Loaded(instance)
            }
            Err(e) => {
                log::error!("Unable to load config: {}", e);
                if let Err(e) = self.backup() {
                    log::error!("Unable to back up config file: {}", e);
                }
                log::warn!("Resetting config");
                LoadOutcome::Unreadable
            }
        }
    }

    /// Move the primary file onto the backup slot, replacing any earlier backup
    pub fn backup(&self) -> Result<(), StoreError> {
        let file = self.paths.primary();
        let backup = self.paths.backup();
        log::warn!("Moving {} to {}", file.display(), backup.display());

        ensure_dir(self.paths.dir())?;
        fs::rename(&file, &backup).map_err(StoreError::io("rename", &file))
    }

    /// Persist an instance.
    ///
    /// Runs [`Schema::before_save`], writes the temp file in full, then renames
    /// it over the primary file. On any failure the primary file keeps its
    /// previous content. The listener runs only after a successful rename.
    pub fn save(&self, instance: &mut S) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        instance.before_save();
        let json = codec::encode(instance)?;

        ensure_dir(self.paths.dir())?;
        let file = self.paths.primary();
        let temp = self.paths.temp();

        if let Err(e) = write_synced(&temp, json.as_bytes()) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp, &file) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::io("rename", &temp)(e));
        }

        log::info!("Saved config to {}", file.display());
        self.notify(instance);
        Ok(())
    }

    fn notify(&self, instance: &S) {
        // Clone out so the listener may replace itself
        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener(instance);
        }
    }
}

fn read<S: Schema>(file: &Path) -> Result<Option<S>, StoreError> {
    let bytes = match fs::read(file) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io("read", file)(e)),
    };
    Ok(Some(codec::decode(&bytes)?))
}

fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(StoreError::io("create directory", dir))
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut f = File::create(path).map_err(StoreError::io("create", path))?;
    f.write_all(bytes).map_err(StoreError::io("write", path))?;
    f.sync_all().map_err(StoreError::io("sync", path))
}
