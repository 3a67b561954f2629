//! core
//!
//! Core domain types, value encoding and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: MonitorId, MetadataEvent, ListKey
//! - [`codec`] - Wire encoding of boolean and integer values
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing keeps monitor identities and list keys apart from plain strings
//! - Encoding is strict for booleans and forgiving for integers
//! - Schemas are strict and self-describing

pub mod codec;
pub mod config;
pub mod types;
