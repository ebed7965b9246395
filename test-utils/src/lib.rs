//! Shared test utilities for the vault-secrets workspace.
//!
//! This crate provides:
//! - Proptest generators for paths, keys and secrets configs
//! - Sample store payloads (KV v1, KV v2, login)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use generators::*;
