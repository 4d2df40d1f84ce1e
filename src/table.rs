use crate::error::AttributeError;
use log::trace;
use std::{
    any::{self, Any},
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::Rc,
};

/// Implemented by every type that caches attributes.
///
/// Usually derived, see [`macro@crate::HasAttributes`].
pub trait HasAttributes {
    fn attributes(&self) -> &AttributeTable;
}

/// The per-object table of already computed attribute values.
///
/// Values are reference counted, so that a borrow of the table never outlives a single method
/// call. This way a cached attribute can be computed while values of other attributes are still
/// held by the caller.
#[derive(Default, Clone)]
pub struct AttributeTable {
    entries: RefCell<HashMap<&'static str, Rc<dyn Any>>>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `name`, if any.
    ///
    /// Fails if the value stored is not a `V`.
    pub fn get<V: Any>(&self, name: &'static str) -> Result<Option<Rc<V>>, AttributeError> {
        let Some(value) = self.entries.borrow().get(name).cloned() else {
            return Ok(None);
        };
        value
            .downcast::<V>()
            .map(Some)
            .map_err(|_| AttributeError::TypeMismatch {
                name,
                expected: any::type_name::<V>(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    /// Stores `value` under `name`, replacing the previous value.
    ///
    /// Returns `true` if a value was replaced.
    pub fn insert<V: Any>(&self, name: &'static str, value: V) -> bool {
        self.store(name, Rc::new(value))
    }

    pub(crate) fn store(&self, name: &'static str, value: Rc<dyn Any>) -> bool {
        let previous = self.entries.borrow_mut().insert(name, value);
        let replaced = previous.is_some();
        trace!("stored attribute `{name}` (replaced: {replaced})");
        replaced
    }

    /// Removes the value stored under `name`. The next read of the attribute recomputes it.
    ///
    /// Returns `true` if there was a value to remove.
    pub fn remove(&self, name: &str) -> bool {
        // Values are dropped after the borrow ended, their destructors may access this table.
        let removed = self.entries.borrow_mut().remove(name);
        let removed = removed.is_some();
        if removed {
            trace!("removed attribute `{name}`");
        }
        removed
    }

    pub fn clear(&self) {
        let entries = self.entries.take();
        trace!("cleared {} attribute(s)", entries.len());
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Names of all stored attributes, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.borrow().keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for AttributeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
