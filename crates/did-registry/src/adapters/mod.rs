//! # Adapters Layer (Outer Hexagon)
//!
//! - `memory`: `InMemorySlotStore` for tests and ephemeral registries
//! - `file`: `FileBackedSlotStore`, single-file persistence
//! - `shared`: `SharedSlotStore`, one store behind many handles
//! - `proxy`: `UpgradeProxy`, swaps registry logic over a kept store

pub mod file;
pub mod memory;
pub mod proxy;
pub mod shared;

pub use file::FileBackedSlotStore;
pub use memory::InMemorySlotStore;
pub use proxy::UpgradeProxy;
pub use shared::SharedSlotStore;
