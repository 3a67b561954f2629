//! service
//!
//! The metadata service surface consumed by the client layer.
//!
//! # Architecture
//!
//! The `Metafile` and `MetafileFactory` traits describe the remote
//! per-directory metadata store. The client never names a concrete
//! implementation; it is handed one through a [`FactoryStrategy`].
//!
//! - Metadata failures never corrupt local state; callers fall back to
//!   defaults
//! - The store's persistence and multi-client arbitration live behind the
//!   traits
//!
//! # Modules
//!
//! - `traits`: Core `Metafile`, `MetafileFactory` and `Activator` traits
//! - [`memory`]: In-process store for self-contained use
//! - [`mock`]: Mock implementation for deterministic testing
//!
//! [`FactoryStrategy`]: crate::client::FactoryStrategy

pub mod memory;
pub mod mock;
mod traits;

pub use memory::{MemoryMetafile, MemoryMetafileFactory};
pub use traits::*;
