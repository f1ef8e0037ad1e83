//! # DID Registry Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Fixed test keys, registry builders, tracing setup
//! └── integration/      # End-to-end flows through the public API
//!     ├── lifecycle.rs  # Key, context and service lifecycles
//!     ├── controller.rs # Controller-delegated authorization
//!     ├── signed.rs     # Signed-mode authorization
//!     ├── upgrade.rs    # Logic upgrades over a shared store
//!     └── persistence.rs# File-backed store
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p did-registry-tests
//! RUST_LOG=did_registry=debug cargo test -p did-registry-tests integration::signed
//!
//! # Benchmarks
//! cargo bench -p did-registry-tests
//! ```

#![allow(dead_code)]

pub mod integration;
