//! Lootsplit storage.
//!
//! This crate defines the storage contract for the loot lifecycle:
//! - items with their participants and per-participant shares
//! - the append-only profit history written when an item is distributed
//!
//! Design stance:
//! - SQLite is the transactional source of truth.
//! - The in-memory adapter mirrors its all-or-nothing semantics for tests.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod config;
mod error;
mod guard;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
mod traits;

pub use config::{open_storage, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use traits::{ItemStore, LootStorage, ProfitHistoryStore};
