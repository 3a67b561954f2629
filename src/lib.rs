//! Dirmeta - Client-side proxy for a per-directory metadata store
//!
//! Dirmeta lets a file manager attach small annotations (icon positions,
//! sort order, view preferences) to the files in a directory while an
//! out-of-process service owns and persists them.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`client`] - Connection, per-directory handle cache, accessors and monitors
//! - [`service`] - The metafile service traits plus in-memory and mock stores
//! - [`core`] - Domain types, value codec and configuration
//!
//! # Correctness Invariants
//!
//! Dirmeta maintains the following invariants:
//!
//! 1. A directory opens its metafile at most once, and remembers a failed open
//! 2. The factory strategy is fixed before the factory is first used
//! 3. A directory holds at most one registered change monitor
//! 4. Metadata failures never reach the caller as errors, only as defaults

pub mod client;
pub mod core;
pub mod service;
