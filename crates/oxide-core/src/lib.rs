//! Oxide Core
//!
//! Core domain types, traits, and error handling for Oxide cache restore.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used across the other crates.

pub mod cache;
pub mod error;
pub mod ports;

pub use error::{Error, Result, StoreError};
