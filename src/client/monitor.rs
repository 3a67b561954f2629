//! client::monitor
//!
//! Change notification registration.
//!
//! # State
//!
//! ```text
//! Unregistered --register--> Registered --unregister--> Unregistered
//! ```
//!
//! A directory holds at most one [`MonitorHandle`]. Registering again is a
//! no-op, and unregistering without a monitor is a caller bug. Events
//! arrive on the channel returned by [`Directory::subscribe`].

use tokio::sync::broadcast;
use tracing::debug;

use super::directory::Directory;
use crate::core::types::{MetadataEvent, MonitorId};
use crate::service::MonitorEndpoint;

/// A directory's registered change monitor.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    endpoint: MonitorEndpoint,
}

impl MonitorHandle {
    fn new(sender: &broadcast::Sender<MetadataEvent>) -> Self {
        Self {
            endpoint: MonitorEndpoint::new(MonitorId::new(), sender),
        }
    }

    /// Get the monitor's identity.
    pub fn id(&self) -> MonitorId {
        self.endpoint.id()
    }
}

impl Directory {
    /// Start receiving change events for this directory.
    ///
    /// Does nothing if a monitor is already registered or there is no
    /// metafile to register with.
    pub async fn register_metadata_monitor(&self) {
        let mut slot = self.monitor.lock().await;
        if slot.is_some() {
            return;
        }

        let Some(metafile) = self.metafile().await else {
            return;
        };

        let handle = MonitorHandle::new(&self.events);
        if let Err(err) = metafile.register_monitor(handle.endpoint.clone()).await {
            debug!(monitor = %handle.id(), error = %err, "failed to register metadata monitor");
        }
        *slot = Some(handle);
    }

    /// Stop receiving change events.
    ///
    /// The monitor is released locally even if the remote call fails.
    pub async fn unregister_metadata_monitor(&self) {
        let mut slot = self.monitor.lock().await;
        return_if_fail!(slot.is_some());

        self.release_monitor(&mut slot).await;
    }

    /// Release the monitor in `slot`, if any.
    ///
    /// The caller holds the monitor lock for the whole release.
    pub(super) async fn release_monitor(&self, slot: &mut Option<MonitorHandle>) {
        let Some(handle) = slot.take() else {
            return;
        };

        if let Some(metafile) = self.metafile().await {
            if let Err(err) = metafile.unregister_monitor(handle.id()).await {
                debug!(monitor = %handle.id(), error = %err, "failed to unregister metadata monitor");
            }
        }
    }

    /// Check whether a monitor is registered.
    pub async fn is_monitor_registered(&self) -> bool {
        self.monitor.lock().await.is_some()
    }

    /// Get the registered monitor's identity.
    pub async fn monitor_id(&self) -> Option<MonitorId> {
        self.monitor.lock().await.as_ref().map(MonitorHandle::id)
    }
}
