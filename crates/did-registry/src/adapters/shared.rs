use crate::errors::StoreError;
use crate::ports::outbound::{BatchOperation, SlotStore};
use parking_lot::RwLock;
use std::sync::Arc;

/// A cloneable handle to one underlying slot store.
///
/// Lets two logic versions read and write the same slots, which is how
/// an upgrade keeps every document.
#[derive(Debug, Default)]
pub struct SharedSlotStore<S> {
    inner: Arc<RwLock<S>>,
}

impl<S> Clone for SharedSlotStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SlotStore> SharedSlotStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Number of live handles to the underlying store.
    pub fn handles(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Run `f` with shared access to the underlying store.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let guard = self.inner.read();
        f(&*guard)
    }
}

impl<S: SlotStore> SlotStore for SharedSlotStore<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.read().get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.inner.write().put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.inner.write().delete(key)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        self.inner.write().atomic_batch_write(operations)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        self.inner.read().exists(key)
    }
}
