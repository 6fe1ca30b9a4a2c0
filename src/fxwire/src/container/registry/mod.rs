use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::probe::{Injectable, TypeDescriptor};

/// Book-keeping of every object the container has handed out.
///
/// Singletons are held strongly, keyed by their type. Presenters are held
/// weakly: the registry never keeps a presenter alive, it only remembers it
/// so that it can be destroyed at shutdown.
pub struct Registry {
    singletons: RwLock<HashMap<&'static TypeDescriptor, Arc<dyn Injectable>>>,
    presenters: Mutex<Vec<Weak<dyn Injectable>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            singletons: RwLock::new(HashMap::new()),
            presenters: Mutex::new(Vec::new()),
        }
    }

    pub fn get_singleton(&self, descriptor: &'static TypeDescriptor) -> Option<Arc<dyn Injectable>> {
        self.singletons.read().get(descriptor).cloned()
    }

    pub fn contains_singleton(&self, descriptor: &'static TypeDescriptor) -> bool {
        self.singletons.read().contains_key(descriptor)
    }

    /// Publishes `instance` unless another instance of the same type has been
    /// published before. Returns whichever instance ends up in the registry.
    pub fn put_singleton_if_absent(
        &self,
        descriptor: &'static TypeDescriptor,
        instance: Arc<dyn Injectable>,
    ) -> Arc<dyn Injectable> {
        let mut singletons = self.singletons.write();
        Arc::clone(singletons.entry(descriptor).or_insert(instance))
    }

    /// Replaces any existing mapping for the type.
    pub fn force_set_singleton(
        &self,
        descriptor: &'static TypeDescriptor,
        instance: Arc<dyn Injectable>,
    ) -> Option<Arc<dyn Injectable>> {
        self.singletons.write().insert(descriptor, instance)
    }

    /// Remembers a presenter. Tracking the same allocation twice is a no-op.
    pub fn track_presenter(&self, instance: &Arc<dyn Injectable>) {
        let mut presenters = self.presenters.lock();
        presenters.retain(|presenter| presenter.strong_count() > 0);

        let address = Arc::as_ptr(instance);
        let tracked = presenters
            .iter()
            .any(|presenter| std::ptr::addr_eq(presenter.as_ptr(), address));
        if !tracked {
            presenters.push(Arc::downgrade(instance));
        }
    }

    pub fn snapshot_singletons(&self) -> Vec<Arc<dyn Injectable>> {
        self.singletons.read().values().cloned().collect()
    }

    /// Upgrades every presenter which is still alive.
    pub fn snapshot_presenters(&self) -> Vec<Arc<dyn Injectable>> {
        let mut presenters = self.presenters.lock();
        presenters.retain(|presenter| presenter.strong_count() > 0);
        presenters.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn live_presenters(&self) -> usize {
        let mut presenters = self.presenters.lock();
        presenters.retain(|presenter| presenter.strong_count() > 0);
        presenters.len()
    }

    pub fn clear_all(&self) {
        self.presenters.lock().clear();
        self.singletons.write().clear();
    }
}
