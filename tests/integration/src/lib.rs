//! Integration test utilities for the messaging core
//!
//! This crate provides helpers for driving conversation views end to end
//! against the in-memory store.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
