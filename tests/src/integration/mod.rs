//! # Integration Flows
//!
//! Every test drives the registry through `DidRegistryApi` only, the way
//! an external caller would.

pub mod lifecycle;
pub mod persistence;
pub mod signed;
pub mod upgrade;
