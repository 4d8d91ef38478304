//! Vendor dashboard library.
//!
//! Headless core of the vendor dashboard: a session guard in front of the
//! admin area, an observable cart store, and typed access to the hosted
//! backend that holds profiles, catalog, orders and carts.
//!
//! # Layout
//!
//! - [`backend`] - HTTP client for the auth and row-storage surfaces
//! - [`repo`] - typed repositories over backend collections
//! - [`session`] - process-wide session store with change notifications
//! - [`guard`] - admin-only session guard
//! - [`cart`] - cart store and its remote backend
//! - [`services`] - auth, catalog and orders
//! - [`state`] - wiring used by the binaries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod repo;
pub mod services;
pub mod session;
pub mod state;
pub mod telemetry;
