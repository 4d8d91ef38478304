//! Vendor Dash Core - Shared types library.
//!
//! This crate provides common types used across all vendor dashboard components:
//! - `admin` - Session guard, cart store and backend client
//! - `cli` - One-shot catalog, order and cart commands
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, roles, quantities, prices and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
