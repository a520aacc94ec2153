//! Two-tier response cache.
//!
//! - An ephemeral tier (moka, in-process) answers hot keys without I/O.
//! - A durable tier (SQLite via tokio-rusqlite) is the source of truth and
//!   survives restarts.
//!
//! [`CacheCoordinator`] runs the read-through/backfill protocol across both.
//! Keys come from [`derive_key`] and are never influenced by time or
//! request identity.

pub mod connection;
pub mod coordinator;
pub mod durable;
pub mod ephemeral;
pub mod key;
pub mod migrations;
pub mod tier;

pub use crate::Error;

pub use connection::DurableStore;
pub use coordinator::{CacheCoordinator, DEFAULT_EPHEMERAL_TTL};
pub use ephemeral::EphemeralTier;
pub use key::{CacheKey, derive_key};
pub use tier::CacheTier;
