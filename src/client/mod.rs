//! client
//!
//! Client-side proxy for the per-directory metadata store.
//!
//! # Architecture
//!
//! A single [`Connection`] owns the process-wide metafile factory. Each
//! logical directory gets a [`Directory`], which lazily opens and caches
//! its remote metafile through the connection.
//!
//! ```text
//! directory model -> Directory -> Connection -> MetafileFactory
//!                        |
//!                        +-------> Metafile (cached per directory)
//! ```
//!
//! # Failure Policy
//!
//! - Factory activation failure is fatal (see [`die_on_failed_activation`])
//! - Opening a metafile or any later call failing is soft: logged at
//!   `debug` and mapped to the caller's default
//! - Empty identifying strings are caller bugs: logged at `error` and
//!   mapped to the caller's default
//!
//! # Modules
//!
//! - `connection`: Factory strategy selection and caching
//! - `directory`: Per-directory handle cache
//! - `access`: Typed get/set accessors
//! - `propagation`: Copy, rename and remove
//! - `monitor`: Change notification registration
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dirmeta::client::{Connection, Directory, FactoryStrategy};
//!
//! # tokio_test::block_on(async {
//! let connection = Arc::new(Connection::new(FactoryStrategy::self_contained()));
//! let directory = Directory::new(connection, "file:///home/user/Documents");
//!
//! directory
//!     .set_boolean_file_metadata("notes.txt", "show_thumbnail", false, true)
//!     .await;
//! assert!(
//!     directory
//!         .get_boolean_file_metadata("notes.txt", "show_thumbnail", false)
//!         .await
//! );
//! # });
//! ```

/// Log a failed precondition and return early.
///
/// The two-argument form returns the given value; the one-argument form
/// returns `()`.
macro_rules! return_if_fail {
    ($cond:expr) => {
        return_if_fail!($cond, ())
    };
    ($cond:expr, $ret:expr) => {
        if !$cond {
            tracing::error!(condition = stringify!($cond), "precondition failed");
            return $ret;
        }
    };
}

mod access;
mod connection;
mod directory;
mod monitor;
mod propagation;

pub use connection::{
    die_on_failed_activation, valid_strategy_names, Connection, ConnectionError, FactoryStrategy,
    StrategyKind,
};
pub use directory::Directory;
pub use monitor::MonitorHandle;
