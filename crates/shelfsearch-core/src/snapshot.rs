//! Atomic snapshot replacement.
//!
//! Readers take an `Arc` of the current value and keep using it for the
//! whole request; `replace` swaps in a new value without disturbing them.
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug)]
pub struct SnapshotCell<T> {
    current: RwLock<Arc<T>>,
}

impl<T> SnapshotCell<T> {
    pub fn new(value: T) -> Self {
        Self { current: RwLock::new(Arc::new(value)) }
    }

    pub fn load(&self) -> Arc<T> {
        // A poisoned lock still guards a fully written Arc.
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Install `value` as the current snapshot and return the previous one.
    pub fn replace(&self, value: T) -> Arc<T> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(value))
    }
}
