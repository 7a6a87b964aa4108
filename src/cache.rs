//! Process-wide holder of the live settings instance
//!
//! Lifecycle: the cache starts unloaded. The first [`InstanceCache::get`]
//! loads the file (or builds defaults) exactly once; later calls hand out
//! the same instance behind a lock. [`InstanceCache::reset_and_save`]
//! replaces the instance with defaults and persists it. The instance is
//! never dropped while the cache lives.
//!
//! None of the operations return errors. Load, backup and save failures are
//! logged by the store and absorbed here.
//!
//! One [`Instance`] per thread at a time. While a thread holds one,
//! [`InstanceCache::save`] on that thread is deferred until the instance is
//! dropped; [`InstanceCache::get`] and [`InstanceCache::reset_and_save`] panic
//! instead of deadlocking.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

use crate::persistence::{ConfigPaths, PersistenceStore};
use crate::schema::Schema;

/// Owner of the single live instance of `S`
pub struct InstanceCache<S: Schema> {
    store: PersistenceStore<S>,
    slot: OnceLock<Slot<S>>,
}

struct Slot<S> {
    value: Mutex<S>,
    // Thread currently holding an `Instance`
    holder: Mutex<Option<ThreadId>>,
    // Set by `InstanceCache::save` from the holding thread
    save_pending: AtomicBool,
}

impl<S> Slot<S> {
    fn new(value: S) -> Self {
        Self {
            value: Mutex::new(value),
            holder: Mutex::new(None),
            save_pending: AtomicBool::new(false),
        }
    }

    fn held_here(&self) -> bool {
        let holder = self.holder.lock().unwrap_or_else(PoisonError::into_inner);
        *holder == Some(thread::current().id())
    }

    fn set_holder(&self, holder: Option<ThreadId>) {
        *self.holder.lock().unwrap_or_else(PoisonError::into_inner) = holder;
    }
}

/// Locked access to the live instance.
///
/// Other threads block until this is dropped. Mutate fields through it and
/// call [`Instance::save`] to persist.
pub struct Instance<'a, S: Schema> {
    guard: MutexGuard<'a, S>,
    slot: &'a Slot<S>,
    store: &'a PersistenceStore<S>,
}

impl<S: Schema> InstanceCache<S> {
    pub fn new(paths: ConfigPaths) -> Self {
        Self::with_store(PersistenceStore::new(paths))
    }

    pub fn with_store(store: PersistenceStore<S>) -> Self {
        Self {
            store,
            slot: OnceLock::new(),
        }
    }

    pub fn store(&self) -> &PersistenceStore<S> {
        &self.store
    }

    /// Register the callback run after every successful save.
    ///
    /// The callback runs while the instance is held. Calling [`Self::save`]
    /// from it does nothing; calling [`Self::get`] panics.
    pub fn set_listener<F>(&self, f: F)
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.store.set_listener(f);
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.get().is_some()
    }

    /// The live instance, loading it on first access.
    ///
    /// # Panics
    ///
    /// If the calling thread already holds an [`Instance`] from this cache.
    pub fn get(&self) -> Instance<'_, S> {
        let slot = self
            .slot
            .get_or_init(|| Slot::new(self.store.load().into_instance().unwrap_or_default()));
        self.lock(slot)
    }

    /// Ensure the instance is loaded, persist it, and return it
    pub fn get_and_save(&self) -> Instance<'_, S> {
        let mut instance = self.get();
        instance.save();
        instance
    }

    /// Replace the instance with defaults, persist it, and return it.
    ///
    /// Overwrites whatever was on disk. Panics like [`Self::get`].
    pub fn reset_and_save(&self) -> Instance<'_, S> {
        let slot = self.slot.get_or_init(|| Slot::new(S::default()));
        let mut instance = self.lock(slot);
        *instance = S::default();
        instance.save();
        instance
    }

    /// Persist the live instance. Does nothing before the first access.
    ///
    /// Called from a thread that holds an [`Instance`], the save runs when
    /// that instance is dropped.
    pub fn save(&self) {
        let Some(slot) = self.slot.get() else {
            return;
        };
        if slot.held_here() {
            slot.save_pending.store(true, Ordering::Release);
            return;
        }
        self.lock(slot).save();
    }

    fn lock<'a>(&'a self, slot: &'a Slot<S>) -> Instance<'a, S> {
        if slot.held_here() {
            panic!("config instance is already held by this thread");
        }
        let guard = slot.value.lock().unwrap_or_else(PoisonError::into_inner);
        slot.set_holder(Some(thread::current().id()));
        Instance {
            guard,
            slot,
            store: &self.store,
        }
    }
}

impl<S: Schema> Instance<'_, S> {
    /// Persist the current field values; failures are logged
    pub fn save(&mut self) {
        if let Err(e) = self.store.save(&mut self.guard) {
            log::error!("Unable to save config: {}", e);
        }
        // Covers any save requested while this one ran
        self.slot.save_pending.store(false, Ordering::Release);
    }
}

impl<S: Schema> Drop for Instance<'_, S> {
    fn drop(&mut self) {
        if self.slot.save_pending.load(Ordering::Acquire) {
            self.save();
        }
        self.slot.set_holder(None);
    }
}

impl<S: Schema> Deref for Instance<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.guard
    }
}

impl<S: Schema> DerefMut for Instance<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.guard
    }
}
