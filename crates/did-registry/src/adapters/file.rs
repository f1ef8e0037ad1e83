//! File-backed slot store.
//!
//! The whole slot map lives in one file, rewritten through a temp file and
//! a rename on every write, so a crash leaves either the old or the new
//! file on disk.
//!
//! File format: a sequence of `bytes(key) bytes(value)` records in the
//! codec's varint-prefixed byte encoding, sorted by key.

use crate::domain::codec::{ZeroCopySink, ZeroCopySource};
use crate::errors::{CodecError, StoreError};
use crate::ports::outbound::{BatchOperation, SlotStore};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Slot store persisted to a single file.
#[derive(Debug)]
pub struct FileBackedSlotStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
}

fn io_error(err: std::io::Error) -> StoreError {
    StoreError::Io {
        message: err.to_string(),
    }
}

impl FileBackedSlotStore {
    /// Open the store at `path`, loading existing slots if the file exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read(&path) {
            Ok(bytes) => Self::decode(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no slot file yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(io_error(e)),
        };
        info!(path = %path.display(), slots = data.len(), "opened slot store");
        Ok(Self { data, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn decode(bytes: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, StoreError> {
        let mut source = ZeroCopySource::new(bytes);
        let mut data = BTreeMap::new();
        let corrupt = |e: CodecError| StoreError::Corrupted {
            message: format!("slot file: {e}"),
        };
        while !source.is_exhausted() {
            let key = source.read_bytes().map_err(corrupt)?;
            let value = source.read_bytes().map_err(corrupt)?;
            data.insert(key.to_vec(), value.to_vec());
        }
        Ok(data)
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut sink = ZeroCopySink::new();
        for (key, value) in &self.data {
            sink.write_bytes(key);
            sink.write_bytes(value);
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).map_err(io_error)?;
        file.write_all(sink.as_bytes()).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        fs::rename(&temp_path, &self.path).map_err(io_error)?;

        debug!(path = %self.path.display(), bytes = sink.len(), "persisted slot file");
        Ok(())
    }
}

impl SlotStore for FileBackedSlotStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.atomic_batch_write(vec![BatchOperation::put(key, value)])
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.atomic_batch_write(vec![BatchOperation::delete(key)])
    }

    /// Applied to a copy first; memory and disk change only if the file
    /// write succeeds.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        let previous = self.data.clone();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        if let Err(e) = self.persist() {
            self.data = previous;
            return Err(e);
        }
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.data.contains_key(key))
    }
}
