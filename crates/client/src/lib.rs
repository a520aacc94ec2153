//! Network client code for edgesearch.
//!
//! This crate provides the reqwest-backed [`HttpDispatcher`], the production
//! implementation of [`edgesearch_core::ProviderDispatcher`].

pub mod dispatch;

pub use dispatch::{DispatchConfig, DispatchError, HttpDispatcher};
