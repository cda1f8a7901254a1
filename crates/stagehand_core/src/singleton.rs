//! Singleton registry
//!
//! At most one live instance per type. The registry is an explicit value that
//! callers pass around (cheap to clone, shared underneath) instead of a static
//! accessor, so tests get their own isolated registry.
//!
//! Registration hands back a [`SingletonGuard`]. Dropping the guard models the
//! owning component being destroyed. The slot is cleared once the last guard
//! for the instance it holds is gone; guards for a replaced instance leave it
//! alone.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::RegistryError;

type Slots = RwLock<HashMap<TypeId, SingletonEntry>>;

struct SingletonEntry {
    instance: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    /// Survives `clear_transient`
    persistent: bool,
    /// Live guards for this instance
    owners: usize,
}

impl SingletonEntry {
    fn is_instance(&self, other: *const ()) -> bool {
        Arc::as_ptr(&self.instance) as *const () == other
    }
}

/// Process-wide directory of singleton instances keyed by type
#[derive(Clone, Default)]
pub struct SingletonRegistry {
    slots: Arc<Slots>,
}

impl SingletonRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the instance for `T`
    ///
    /// Fails with `AlreadyRegistered` if a different instance owns the slot;
    /// the existing instance wins and the caller should discard its own.
    /// Registering the instance that already owns the slot succeeds.
    pub fn register<T>(&self, instance: Arc<T>) -> Result<SingletonGuard<T>, RegistryError>
    where
        T: Send + Sync + 'static,
    {
        self.insert(instance, false)
    }

    /// Register an instance that survives [`clear_transient`](Self::clear_transient)
    pub fn register_persistent<T>(&self, instance: Arc<T>) -> Result<SingletonGuard<T>, RegistryError>
    where
        T: Send + Sync + 'static,
    {
        self.insert(instance, true)
    }

    fn insert<T>(&self, instance: Arc<T>, persistent: bool) -> Result<SingletonGuard<T>, RegistryError>
    where
        T: Send + Sync + 'static,
    {
        let ptr = Arc::as_ptr(&instance) as *const ();
        let mut slots = self.slots.write();

        if let Some(existing) = slots.get_mut(&TypeId::of::<T>()) {
            if !existing.is_instance(ptr) {
                log::warn!(
                    "Duplicate singleton {} discarded, keeping the existing instance",
                    existing.type_name
                );
                return Err(RegistryError::AlreadyRegistered(type_name::<T>().into()));
            }
            existing.owners += 1;
        } else {
            slots.insert(
                TypeId::of::<T>(),
                SingletonEntry {
                    instance: instance.clone(),
                    type_name: type_name::<T>(),
                    persistent,
                    owners: 1,
                },
            );
            log::debug!("Registered singleton {}", type_name::<T>());
        }

        Ok(SingletonGuard {
            instance,
            slots: Some(Arc::downgrade(&self.slots)),
        })
    }

    /// Resolve the live instance for `T`
    ///
    /// A missing singleton is a setup bug, so this logs at error level.
    pub fn resolve<T>(&self) -> Result<Arc<T>, RegistryError>
    where
        T: Send + Sync + 'static,
    {
        self.try_resolve::<T>().ok_or_else(|| {
            log::error!("Singleton {} is not registered", type_name::<T>());
            RegistryError::NotFound(type_name::<T>().into())
        })
    }

    /// Resolve without logging
    pub fn try_resolve<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.slots
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.instance.clone().downcast::<T>().ok())
    }

    /// Clear the slot for `T`; a no-op when already empty
    pub fn unregister<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let entry = self.slots.write().remove(&TypeId::of::<T>())?;
        log::debug!("Unregistered singleton {}", entry.type_name);
        entry.instance.downcast::<T>().ok()
    }

    /// Check if `T` has a live instance
    pub fn contains<T: 'static>(&self) -> bool {
        self.slots.read().contains_key(&TypeId::of::<T>())
    }

    /// Drop every non-persistent instance, returning how many were removed
    pub fn clear_transient(&self) -> usize {
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|_, entry| entry.persistent);
        before - slots.len()
    }

    /// Number of registered singletons
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

impl fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        let mut names: Vec<_> = slots.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        f.debug_struct("SingletonRegistry")
            .field("types", &names)
            .finish()
    }
}

/// Ownership token for a registered singleton
pub struct SingletonGuard<T: Send + Sync + 'static> {
    instance: Arc<T>,
    slots: Option<Weak<Slots>>,
}

impl<T: Send + Sync + 'static> SingletonGuard<T> {
    /// The registered instance
    pub fn instance(&self) -> &Arc<T> {
        &self.instance
    }

    /// Keep the registration alive past this guard
    pub fn detach(mut self) -> Arc<T> {
        self.slots = None;
        self.instance.clone()
    }
}

impl<T: Send + Sync + 'static> Deref for SingletonGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.instance
    }
}

impl<T: Send + Sync + 'static> Drop for SingletonGuard<T> {
    fn drop(&mut self) {
        let Some(slots) = self.slots.take().and_then(|w| w.upgrade()) else {
            return;
        };
        let ptr = Arc::as_ptr(&self.instance) as *const ();
        let mut slots = slots.write();
        let Some(entry) = slots
            .get_mut(&TypeId::of::<T>())
            .filter(|entry| entry.is_instance(ptr))
        else {
            return;
        };
        entry.owners = entry.owners.saturating_sub(1);
        if entry.owners == 0 {
            slots.remove(&TypeId::of::<T>());
            log::debug!("Singleton {} destroyed", type_name::<T>());
        }
    }
}

impl<T: Send + Sync + fmt::Debug + 'static> fmt::Debug for SingletonGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SingletonGuard").field(&self.instance).finish()
    }
}
