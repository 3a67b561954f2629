//! client::directory
//!
//! Per-directory handle cache.
//!
//! # Design
//!
//! A [`Directory`] caches at most one metafile handle. The first open is
//! remembered whatever its outcome, so a directory whose open failed keeps
//! answering with defaults instead of retrying on every call.
//!
//! ```text
//! Unresolved --open ok--> Open(handle)
//!     |
//!     +------open failed--> Unavailable
//! ```
//!
//! A successful directory rename moves the slot back to `Unresolved` under
//! the new URI.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};

use super::connection::Connection;
use super::monitor::MonitorHandle;
use crate::core::types::MetadataEvent;
use crate::service::Metafile;

pub(super) enum MetafileSlot {
    Unresolved,
    Open(Arc<dyn Metafile>),
    Unavailable,
}

pub(super) struct HandleState {
    pub(super) uri: String,
    pub(super) metafile: MetafileSlot,
}

/// Metadata proxy for one logical directory.
///
/// Created and dropped together with the directory model entry it serves.
pub struct Directory {
    pub(super) connection: Arc<Connection>,
    pub(super) state: RwLock<HandleState>,
    pub(super) monitor: Mutex<Option<MonitorHandle>>,
    pub(super) events: broadcast::Sender<MetadataEvent>,
}

impl Directory {
    /// Create the proxy for the directory at `uri`.
    ///
    /// Nothing is opened until the first metadata call.
    pub fn new(connection: Arc<Connection>, uri: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(connection.event_buffer());
        Self {
            connection,
            state: RwLock::new(HandleState {
                uri: uri.into(),
                metafile: MetafileSlot::Unresolved,
            }),
            monitor: Mutex::new(None),
            events,
        }
    }

    /// Get the directory's current URI.
    pub async fn uri(&self) -> String {
        self.state.read().await.uri.clone()
    }

    /// Get the connection this directory opens through.
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Receive change events delivered by the registered monitor.
    pub fn subscribe(&self) -> broadcast::Receiver<MetadataEvent> {
        self.events.subscribe()
    }

    /// Get the directory's metafile handle, opening it on first call.
    ///
    /// Returns `None` if the open failed, now or on an earlier call.
    pub async fn metafile(&self) -> Option<Arc<dyn Metafile>> {
        {
            let state = self.state.read().await;
            match &state.metafile {
                MetafileSlot::Open(metafile) => return Some(metafile.clone()),
                MetafileSlot::Unavailable => return None,
                MetafileSlot::Unresolved => {}
            }
        }

        let mut state = self.state.write().await;
        match &state.metafile {
            MetafileSlot::Open(metafile) => return Some(metafile.clone()),
            MetafileSlot::Unavailable => return None,
            MetafileSlot::Unresolved => {}
        }

        let opened = self.connection.open_metafile(&state.uri).await;
        state.metafile = match &opened {
            Some(metafile) => MetafileSlot::Open(metafile.clone()),
            None => MetafileSlot::Unavailable,
        };
        opened
    }

    /// Tear down the directory's metadata state.
    ///
    /// Unregisters a live monitor and drops the cached handle. Later calls
    /// see no handle and return their defaults.
    pub async fn close(&self) {
        let mut monitor = self.monitor.lock().await;
        self.release_monitor(&mut monitor).await;

        let mut state = self.state.write().await;
        state.metafile = MetafileSlot::Unavailable;
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory").finish_non_exhaustive()
    }
}
