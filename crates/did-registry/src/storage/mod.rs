//! # Storage Layer
//!
//! Maps documents onto the generic slot store.
//!
//! - `overlay`: per-operation write buffer committed as one atomic batch
//! - `enumerable`: dense, enumerable maps built from slots
//! - `layout`: slot key construction and namespaces
//! - `repository`: document load and incremental save

pub mod enumerable;
pub mod layout;
pub mod overlay;
pub mod repository;

pub use enumerable::EnumerableMap;
pub use layout::{slot_key, SlotKeys};
pub use overlay::WriteOverlay;
pub use repository::DocumentRepository;
