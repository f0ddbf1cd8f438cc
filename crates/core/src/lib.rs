//! Rootedlane Core - Shared types library.
//!
//! This crate provides the types used by every Rootedlane component:
//! - `api` - REST backend (durable `PostgreSQL` documents or in-memory mock)
//! - `integration-tests` - End-to-end HTTP tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Collections, schemaless documents and local id generation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
