//! # Write Overlay
//!
//! Buffers every write of one operation over a read-only view of the slot
//! store. Reads see buffered writes first. Nothing reaches the store until
//! the overlay is turned into a single atomic batch, so an operation that
//! fails midway leaves the store untouched.

use crate::errors::StoreError;
use crate::ports::outbound::{BatchOperation, SlotStore};
use std::collections::BTreeMap;

/// Pending writes layered over a slot store.
pub struct WriteOverlay<'a, S: SlotStore + ?Sized> {
    base: &'a S,
    /// `None` marks a pending delete.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a, S: SlotStore + ?Sized> WriteOverlay<'a, S> {
    pub fn new(base: &'a S) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => self.base.get(key),
        }
    }

    pub fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        match self.writes.get(key) {
            Some(pending) => Ok(pending.is_some()),
            None => self.base.exists(key),
        }
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    /// Number of slots with a pending write.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    pub fn is_clean(&self) -> bool {
        self.writes.is_empty()
    }

    /// Consume the overlay, yielding its writes in key order.
    pub fn into_batch(self) -> Vec<BatchOperation> {
        self.writes
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOperation::Put { key, value },
                None => BatchOperation::Delete { key },
            })
            .collect()
    }
}
