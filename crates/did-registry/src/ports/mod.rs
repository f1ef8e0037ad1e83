//! # Ports Layer
//!
//! - **Driving Port (Inbound)**: `DidRegistryApi`
//! - **Driven Port (Outbound)**: `SlotStore`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
