//! Core types and shared functionality for edgesearch.
//!
//! This crate provides:
//! - The abuse gate, request normalizer and cache key deriver
//! - The provider registry and the dispatcher seam
//! - A two-tier cache (moka ephemeral tier, SQLite durable tier)
//! - The search pipeline tying them together
//! - Unified error types and configuration structures

pub mod abuse;
pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod query;

pub use abuse::{AbuseSignal, Admission, admit};
pub use cache::{CacheCoordinator, CacheKey, CacheTier, DurableStore, EphemeralTier, derive_key};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use pipeline::{RequestContext, SearchHit, SearchPipeline};
pub use provider::{ProviderConfig, ProviderDispatcher, ProviderFamily, ProviderRegistry};
pub use query::{Category, NormalizedQuery, SafeSearch, SearchRequest, normalize};
