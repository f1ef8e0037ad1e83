//! # Enumerable Map
//!
//! A key/value map laid out in slots so it can be both looked up by key
//! and enumerated densely by position.
//!
//! Removal is swap-and-pop: removing position `i` of `n` moves the last
//! entry into `i` and shrinks the count. Enumeration order therefore
//! matches insertion order only until the first removal.

use super::layout::slot_key;
use super::overlay::WriteOverlay;
use crate::domain::codec::{Decodable, Encodable};
use crate::errors::StoreError;
use crate::ports::outbound::SlotStore;

/// A map stored under one slot namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerableMap {
    namespace: Vec<u8>,
}

impl EnumerableMap {
    pub fn new(namespace: Vec<u8>) -> Self {
        Self { namespace }
    }

    fn len_slot(&self) -> Vec<u8> {
        slot_key(&[&self.namespace, b"len"])
    }

    fn index_slot(&self, index: u64) -> Vec<u8> {
        slot_key(&[&self.namespace, b"idx", &index.to_be_bytes()])
    }

    fn position_slot(&self, key: &[u8]) -> Vec<u8> {
        slot_key(&[&self.namespace, b"pos", key])
    }

    fn value_slot(&self, key: &[u8]) -> Vec<u8> {
        slot_key(&[&self.namespace, b"val", key])
    }

    /// Number of entries.
    pub fn size<S: SlotStore + ?Sized>(&self, slots: &WriteOverlay<'_, S>) -> Result<u64, StoreError> {
        Ok(read_u64(slots, &self.len_slot())?.unwrap_or(0))
    }

    pub fn contains<S: SlotStore + ?Sized>(
        &self,
        slots: &WriteOverlay<'_, S>,
        key: &[u8],
    ) -> Result<bool, StoreError> {
        slots.exists(&self.position_slot(key))
    }

    /// Value for `key`, or `NotFound`.
    pub fn get<S: SlotStore + ?Sized>(
        &self,
        slots: &WriteOverlay<'_, S>,
        key: &[u8],
    ) -> Result<Vec<u8>, StoreError> {
        self.try_get(slots, key)?.ok_or(StoreError::NotFound)
    }

    pub fn try_get<S: SlotStore + ?Sized>(
        &self,
        slots: &WriteOverlay<'_, S>,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, StoreError> {
        if !self.contains(slots, key)? {
            return Ok(None);
        }
        slots
            .get(&self.value_slot(key))?
            .map(Some)
            .ok_or_else(|| corrupted("entry without value"))
    }

    /// Insert or overwrite. Returns true if the key was new.
    pub fn set<S: SlotStore + ?Sized>(
        &self,
        slots: &mut WriteOverlay<'_, S>,
        key: &[u8],
        value: &[u8],
    ) -> Result<bool, StoreError> {
        let inserted = !self.contains(slots, key)?;
        if inserted {
            let len = self.size(slots)?;
            slots.put(self.index_slot(len), key.to_vec());
            slots.put(self.position_slot(key), len.to_bytes());
            slots.put(self.len_slot(), (len + 1).to_bytes());
        }
        slots.put(self.value_slot(key), value.to_vec());
        Ok(inserted)
    }

    /// Remove `key` by swap-and-pop, or `NotFound`.
    pub fn remove<S: SlotStore + ?Sized>(
        &self,
        slots: &mut WriteOverlay<'_, S>,
        key: &[u8],
    ) -> Result<(), StoreError> {
        let position = read_u64(slots, &self.position_slot(key))?.ok_or(StoreError::NotFound)?;
        let len = self.size(slots)?;
        let last = len
            .checked_sub(1)
            .ok_or_else(|| corrupted("entry present in empty map"))?;

        if position != last {
            let moved = self.key_at(slots, last)?;
            slots.put(self.index_slot(position), moved.clone());
            slots.put(self.position_slot(&moved), position.to_bytes());
        }
        slots.delete(self.index_slot(last));
        slots.delete(self.position_slot(key));
        slots.delete(self.value_slot(key));
        slots.put(self.len_slot(), last.to_bytes());
        Ok(())
    }

    /// Key at 0-based `index`, or `NotFound` when out of range.
    pub fn key_at<S: SlotStore + ?Sized>(
        &self,
        slots: &WriteOverlay<'_, S>,
        index: u64,
    ) -> Result<Vec<u8>, StoreError> {
        if index >= self.size(slots)? {
            return Err(StoreError::NotFound);
        }
        slots
            .get(&self.index_slot(index))?
            .ok_or_else(|| corrupted("hole in index"))
    }

    /// All keys in enumeration order.
    pub fn keys<S: SlotStore + ?Sized>(
        &self,
        slots: &WriteOverlay<'_, S>,
    ) -> Result<Vec<Vec<u8>>, StoreError> {
        (0..self.size(slots)?)
            .map(|index| self.key_at(slots, index))
            .collect()
    }

    /// All entries in enumeration order.
    pub fn entries<S: SlotStore + ?Sized>(
        &self,
        slots: &WriteOverlay<'_, S>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.keys(slots)?
            .into_iter()
            .map(|key| {
                let value = self.get(slots, &key)?;
                Ok((key, value))
            })
            .collect()
    }

    /// Remove every entry.
    pub fn clear<S: SlotStore + ?Sized>(
        &self,
        slots: &mut WriteOverlay<'_, S>,
    ) -> Result<(), StoreError> {
        for key in self.keys(slots)? {
            slots.delete(self.position_slot(&key));
            slots.delete(self.value_slot(&key));
        }
        for index in 0..self.size(slots)? {
            slots.delete(self.index_slot(index));
        }
        slots.delete(self.len_slot());
        Ok(())
    }

    /// Make the map hold exactly `target`, in `target`'s order.
    ///
    /// Stale keys are removed individually; if the survivors are not a
    /// prefix of `target` the map is rewritten from scratch.
    pub fn sync<S: SlotStore + ?Sized>(
        &self,
        slots: &mut WriteOverlay<'_, S>,
        target: &[(Vec<u8>, Vec<u8>)],
    ) -> Result<(), StoreError> {
        for key in self.keys(slots)? {
            if !target.iter().any(|(k, _)| *k == key) {
                self.remove(slots, &key)?;
            }
        }
        let survivors = self.keys(slots)?;
        let in_order = survivors.len() <= target.len()
            && survivors.iter().zip(target).all(|(a, (b, _))| a == b);
        if !in_order {
            self.clear(slots)?;
        }
        for (key, value) in target {
            if self.try_get(slots, key)?.as_deref() != Some(value.as_slice()) {
                self.set(slots, key, value)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn corrupted(message: &str) -> StoreError {
    StoreError::Corrupted {
        message: message.to_owned(),
    }
}

pub(crate) fn read_u64<S: SlotStore + ?Sized>(
    slots: &WriteOverlay<'_, S>,
    key: &[u8],
) -> Result<Option<u64>, StoreError> {
    slots
        .get(key)?
        .map(|bytes| u64::from_bytes(&bytes).map_err(|e| corrupted(&e.to_string())))
        .transpose()
}
