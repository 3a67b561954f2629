//! service::traits
//!
//! The remote surface the client layer drives.
//!
//! # Design
//!
//! The traits are async because every call is a round trip to another
//! process. All methods return `Result` so the client can map transport
//! failures onto defaults instead of surfacing them.
//!
//! - [`MetafileFactory`] opens one [`Metafile`] per directory URI.
//! - [`Metafile`] carries the per-directory get/set, list, structural and
//!   monitor operations.
//! - [`Activator`] locates a factory living in another process.
//!
//! # Example
//!
//! ```
//! use dirmeta::service::{MemoryMetafileFactory, Metafile, MetafileFactory};
//!
//! # tokio_test::block_on(async {
//! let factory = MemoryMetafileFactory::new();
//! let metafile = factory.open("file:///home/user").await.unwrap();
//!
//! metafile.set("a.txt", "icon_position", "", "10,20").await.unwrap();
//! let value = metafile.get("a.txt", "icon_position", "").await.unwrap();
//! assert_eq!(value, "10,20");
//! # });
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::core::types::{MetadataEvent, MonitorId};

/// Errors from metadata service calls.
///
/// These are transport-level failures. The client layer logs them and
/// falls back to defaults, so they never reach the directory model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service cannot handle this directory URI.
    #[error("unsupported uri: {0}")]
    UnsupportedUri(String),

    /// The connection to the service was lost.
    #[error("service disconnected: {0}")]
    Disconnected(String),

    /// The service raised an exception while handling the call.
    #[error("remote exception: {0}")]
    Remote(String),

    /// The monitor is not registered with this metafile.
    #[error("unknown monitor: {0}")]
    UnknownMonitor(MonitorId),
}

/// Errors from activating a remote factory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    /// Activation reported success but produced no usable handle.
    #[error("activation returned no handle")]
    NoHandle,

    /// The activation mechanism reported a general failure.
    #[error("activation failed: {0}")]
    Failed(String),

    /// The transport failed while activating.
    #[error("activation transport error: {0}")]
    Transport(#[from] ServiceError),
}

impl ActivationError {
    /// Human-readable failure detail for fatal diagnostics.
    pub fn details(&self) -> String {
        match self {
            ActivationError::NoHandle => "got no handle but no error".to_string(),
            ActivationError::Failed(description) => description.clone(),
            ActivationError::Transport(err) => err.to_string(),
        }
    }
}

/// Where a metafile delivers change events for one directory.
///
/// Delivery is a non-blocking broadcast send, so a slow or absent
/// receiver never stalls the service. The endpoint only holds a weak
/// reference to the channel; once the owning directory is dropped the
/// endpoint goes dead and stores may prune it.
#[derive(Clone)]
pub struct MonitorEndpoint {
    id: MonitorId,
    sender: broadcast::WeakSender<MetadataEvent>,
}

impl MonitorEndpoint {
    /// Create an endpoint publishing onto `sender`.
    pub fn new(id: MonitorId, sender: &broadcast::Sender<MetadataEvent>) -> Self {
        Self {
            id,
            sender: sender.downgrade(),
        }
    }

    /// Get the endpoint's identity.
    pub fn id(&self) -> MonitorId {
        self.id
    }

    /// Check whether the channel owner still exists.
    pub fn is_live(&self) -> bool {
        self.sender.upgrade().is_some()
    }

    /// Deliver an event.
    ///
    /// Returns `false` if the channel is gone or nobody is currently
    /// subscribed.
    pub fn notify(&self, event: MetadataEvent) -> bool {
        match self.sender.upgrade() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }
}

impl std::fmt::Debug for MonitorEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorEndpoint")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

/// A handle to one directory's remote metadata.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a handle is shared by every
/// caller touching the directory.
#[async_trait]
pub trait Metafile: Send + Sync {
    /// Check whether the store has finished loading this directory.
    async fn is_read(&self) -> Result<bool, ServiceError>;

    /// Get a scalar value.
    ///
    /// Returns `default` when the key is unset. The client sends `""` for
    /// an absent default.
    async fn get(&self, file_name: &str, key: &str, default: &str) -> Result<String, ServiceError>;

    /// Get a list value in stored order.
    ///
    /// Returns an empty vector when the list is unset.
    async fn get_list(
        &self,
        file_name: &str,
        list_key: &str,
        list_subkey: &str,
    ) -> Result<Vec<String>, ServiceError>;

    /// Set a scalar value.
    ///
    /// A value equal to `default` clears the key.
    async fn set(
        &self,
        file_name: &str,
        key: &str,
        default: &str,
        value: &str,
    ) -> Result<(), ServiceError>;

    /// Replace a list value wholesale.
    ///
    /// An empty list clears it.
    async fn set_list(
        &self,
        file_name: &str,
        list_key: &str,
        list_subkey: &str,
        list: Vec<String>,
    ) -> Result<(), ServiceError>;

    /// Copy one file's record to a file in another (or the same) directory.
    async fn copy(
        &self,
        source_file_name: &str,
        destination_uri: &str,
        destination_file_name: &str,
    ) -> Result<(), ServiceError>;

    /// Delete one file's record.
    async fn remove(&self, file_name: &str) -> Result<(), ServiceError>;

    /// Move one file's record within this directory.
    async fn rename(&self, old_file_name: &str, new_file_name: &str) -> Result<(), ServiceError>;

    /// Move this directory's whole record to a new URI.
    async fn rename_directory(&self, new_directory_uri: &str) -> Result<(), ServiceError>;

    /// Start delivering change events to `monitor`.
    async fn register_monitor(&self, monitor: MonitorEndpoint) -> Result<(), ServiceError>;

    /// Stop delivering change events to the monitor with this identity.
    async fn unregister_monitor(&self, monitor: MonitorId) -> Result<(), ServiceError>;
}

/// Opens per-directory metafiles.
#[async_trait]
pub trait MetafileFactory: Send + Sync {
    /// Open the metafile for a directory URI.
    async fn open(&self, uri: &str) -> Result<Arc<dyn Metafile>, ServiceError>;
}

/// Locates a factory served by another process.
///
/// The activation mechanism itself (service registry, bus lookup, process
/// spawn) lives outside this crate; hosts implement this trait over it.
#[async_trait]
pub trait Activator: Send + Sync {
    /// Activate the factory registered under `server`.
    async fn activate(&self, server: &str) -> Result<Arc<dyn MetafileFactory>, ActivationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_display() {
        assert_eq!(
            ServiceError::UnsupportedUri("".into()).to_string(),
            "unsupported uri: "
        );
        assert_eq!(
            ServiceError::Disconnected("broken pipe".into()).to_string(),
            "service disconnected: broken pipe"
        );
        assert_eq!(
            ServiceError::Remote("IDL:Metafile/Busy:1.0".into()).to_string(),
            "remote exception: IDL:Metafile/Busy:1.0"
        );
    }

    #[test]
    fn activation_error_details() {
        assert_eq!(
            ActivationError::NoHandle.details(),
            "got no handle but no error"
        );
        assert_eq!(
            ActivationError::Failed("server crashed".into()).details(),
            "server crashed"
        );
        assert_eq!(
            ActivationError::from(ServiceError::Disconnected("eof".into())).details(),
            "service disconnected: eof"
        );
    }

    #[test]
    fn endpoint_notify_reports_subscribers() {
        let (sender, mut receiver) = broadcast::channel(4);
        let endpoint = MonitorEndpoint::new(MonitorId::new(), &sender);

        assert!(endpoint.notify(MetadataEvent::Ready));
        assert_eq!(receiver.try_recv().unwrap(), MetadataEvent::Ready);

        drop(receiver);
        assert!(!endpoint.notify(MetadataEvent::Ready));
        assert!(endpoint.is_live());
    }

    #[test]
    fn endpoint_dies_with_channel_owner() {
        let (sender, _receiver) = broadcast::channel(4);
        let endpoint = MonitorEndpoint::new(MonitorId::new(), &sender);

        drop(sender);
        assert!(!endpoint.is_live());
        assert!(!endpoint.notify(MetadataEvent::Ready));
    }
}
