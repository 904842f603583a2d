//! Verdant Core - Shared types library.
//!
//! This crate provides common types used across all Verdant components:
//! - `storefront` - Public-facing storefront backend
//! - `integration-tests` - Workspace integration test suite
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, cart tokens, prices,
//!   and the order status state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
