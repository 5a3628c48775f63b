//! Component registry and cookies.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::component::{Component, RegistrationInfo};

/// Opaque cookie identifying a registered component.
///
/// Cookies start at 1 and are strictly increasing; they are never reused
/// within the lifetime of the registry. Zero is reserved to mean "no
/// component" and is never handed out.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ComponentId(u64);

impl ComponentId {
    pub const fn raw(self) -> u64 {
        self.0
    }
}

struct Entry {
    component: Rc<dyn Component>,
    info: RegistrationInfo,
}

/// Mapping from cookie to live registration entry. Insertion order carries no
/// contractual meaning.
#[derive(Default)]
pub struct ComponentRegistry {
    entries: BTreeMap<ComponentId, Entry>,
    last_id: u64,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `component` under the next cookie and returns it.
    pub fn insert(&mut self, component: Rc<dyn Component>, info: RegistrationInfo) -> ComponentId {
        self.last_id = self
            .last_id
            .checked_add(1)
            .expect("component cookie overflowed u64");
        let id = ComponentId(self.last_id);
        self.entries.insert(id, Entry { component, info });
        id
    }

    /// Removes the entry for `id`. Returns false for an unknown cookie.
    pub fn remove(&mut self, id: ComponentId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Replaces the registration info for `id`. Returns false for an unknown
    /// cookie.
    pub fn update(&mut self, id: ComponentId, info: RegistrationInfo) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.info = info;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn component(&self, id: ComponentId) -> Option<Rc<dyn Component>> {
        self.entries.get(&id).map(|e| Rc::clone(&e.component))
    }

    pub fn info(&self, id: ComponentId) -> Option<RegistrationInfo> {
        self.entries.get(&id).map(|e| e.info)
    }

    /// Snapshot of every registered component handle, for notification
    /// fan-out. Iterating the snapshot keeps callbacks that mutate the
    /// registry from invalidating the walk; they simply are not part of it.
    pub fn components(&self) -> Vec<Rc<dyn Component>> {
        self.entries.values().map(|e| Rc::clone(&e.component)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
