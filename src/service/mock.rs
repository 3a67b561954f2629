//! service::mock
//!
//! Mock metafile factory for deterministic testing.
//!
//! # Design
//!
//! The mock wraps a [`MemoryMetafileFactory`] so reads observe earlier
//! writes, and adds two things on top:
//!
//! - every call is recorded as a [`MockOperation`]
//! - any operation can be made to fail with a chosen [`ServiceError`]
//!
//! [`MockActivator`] plays the same role for the activation strategy.
//!
//! # Example
//!
//! ```
//! use dirmeta::service::mock::{FailOn, MockMetafileFactory, MockOperation};
//! use dirmeta::service::{MetafileFactory, ServiceError};
//!
//! # tokio_test::block_on(async {
//! let factory = MockMetafileFactory::new()
//!     .fail_on(FailOn::Open(ServiceError::UnsupportedUri("ftp://x".into())));
//!
//! assert!(factory.open("ftp://x").await.is_err());
//! assert_eq!(factory.open_count(), 1);
//! # });
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::memory::{MemoryMetafile, MemoryMetafileFactory};
use super::traits::{
    ActivationError, Activator, Metafile, MetafileFactory, MonitorEndpoint, ServiceError,
};
use crate::core::types::MonitorId;

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail `open` with the given error.
    Open(ServiceError),
    /// Fail `is_read` with the given error.
    IsRead(ServiceError),
    /// Fail `get` with the given error.
    Get(ServiceError),
    /// Fail `get_list` with the given error.
    GetList(ServiceError),
    /// Fail `set` with the given error.
    Set(ServiceError),
    /// Fail `set_list` with the given error.
    SetList(ServiceError),
    /// Fail `copy` with the given error.
    Copy(ServiceError),
    /// Fail `remove` with the given error.
    Remove(ServiceError),
    /// Fail `rename` with the given error.
    Rename(ServiceError),
    /// Fail `rename_directory` with the given error.
    RenameDirectory(ServiceError),
    /// Fail `register_monitor` with the given error.
    RegisterMonitor(ServiceError),
    /// Fail `unregister_monitor` with the given error.
    UnregisterMonitor(ServiceError),
}

impl FailOn {
    fn operation(&self) -> &'static str {
        match self {
            FailOn::Open(_) => "open",
            FailOn::IsRead(_) => "is_read",
            FailOn::Get(_) => "get",
            FailOn::GetList(_) => "get_list",
            FailOn::Set(_) => "set",
            FailOn::SetList(_) => "set_list",
            FailOn::Copy(_) => "copy",
            FailOn::Remove(_) => "remove",
            FailOn::Rename(_) => "rename",
            FailOn::RenameDirectory(_) => "rename_directory",
            FailOn::RegisterMonitor(_) => "register_monitor",
            FailOn::UnregisterMonitor(_) => "unregister_monitor",
        }
    }

    fn error(&self) -> &ServiceError {
        match self {
            FailOn::Open(e)
            | FailOn::IsRead(e)
            | FailOn::Get(e)
            | FailOn::GetList(e)
            | FailOn::Set(e)
            | FailOn::SetList(e)
            | FailOn::Copy(e)
            | FailOn::Remove(e)
            | FailOn::Rename(e)
            | FailOn::RenameDirectory(e)
            | FailOn::RegisterMonitor(e)
            | FailOn::UnregisterMonitor(e) => e,
        }
    }
}

/// Recorded operation for test verification.
///
/// `uri` is the directory URI the handle was opened under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Open {
        uri: String,
    },
    IsRead {
        uri: String,
    },
    Get {
        uri: String,
        file_name: String,
        key: String,
        default: String,
    },
    GetList {
        uri: String,
        file_name: String,
        list_key: String,
        list_subkey: String,
    },
    Set {
        uri: String,
        file_name: String,
        key: String,
        default: String,
        value: String,
    },
    SetList {
        uri: String,
        file_name: String,
        list_key: String,
        list_subkey: String,
        list: Vec<String>,
    },
    Copy {
        uri: String,
        source_file_name: String,
        destination_uri: String,
        destination_file_name: String,
    },
    Remove {
        uri: String,
        file_name: String,
    },
    Rename {
        uri: String,
        old_file_name: String,
        new_file_name: String,
    },
    RenameDirectory {
        uri: String,
        new_directory_uri: String,
    },
    RegisterMonitor {
        uri: String,
        monitor: MonitorId,
    },
    UnregisterMonitor {
        uri: String,
        monitor: MonitorId,
    },
}

/// Internal mutable state.
#[derive(Debug)]
struct MockInner {
    /// Operations to fail (for testing error paths).
    fail_on: Vec<FailOn>,
    /// Value reported by `is_read`.
    ready: bool,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Mock metafile factory for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping. Clones share
/// the same store, failure configuration and operation log.
#[derive(Debug, Clone)]
pub struct MockMetafileFactory {
    inner: Arc<Mutex<MockInner>>,
    store: MemoryMetafileFactory,
}

impl MockMetafileFactory {
    /// Create a mock backed by an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockInner {
                fail_on: Vec::new(),
                ready: true,
                operations: Vec::new(),
            })),
            store: MemoryMetafileFactory::new(),
        }
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// May be chained to fail several operations.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.set_fail_on(fail_on);
        self
    }

    /// Add a failure after construction.
    pub fn set_fail_on(&self, fail_on: FailOn) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on.push(fail_on);
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on.clear();
    }

    /// Set the value reported by `is_read`.
    pub fn set_ready(&self, ready: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.ready = ready;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Count recorded `open` calls.
    pub fn open_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::Open { .. }))
            .count()
    }

    /// Get the backing store (for test verification).
    pub fn store(&self) -> &MemoryMetafileFactory {
        &self.store
    }

    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail(&self, expected: &str) -> Option<ServiceError> {
        let inner = self.inner.lock().unwrap();
        inner
            .fail_on
            .iter()
            .find(|f| f.operation() == expected)
            .map(|f| f.error().clone())
    }

    fn is_ready(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.ready
    }
}

impl Default for MockMetafileFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetafileFactory for MockMetafileFactory {
    async fn open(&self, uri: &str) -> Result<Arc<dyn Metafile>, ServiceError> {
        self.record(MockOperation::Open {
            uri: uri.to_string(),
        });

        if let Some(err) = self.check_fail("open") {
            return Err(err);
        }

        let metafile = self.store.open_memory(uri).await?;
        Ok(Arc::new(MockMetafile {
            uri: uri.to_string(),
            mock: self.clone(),
            metafile,
        }))
    }
}

/// Metafile handle handed out by [`MockMetafileFactory`].
struct MockMetafile {
    uri: String,
    mock: MockMetafileFactory,
    metafile: Arc<MemoryMetafile>,
}

impl MockMetafile {
    fn guard(&self, op: MockOperation, name: &str) -> Result<(), ServiceError> {
        self.mock.record(op);
        match self.mock.check_fail(name) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Metafile for MockMetafile {
    async fn is_read(&self) -> Result<bool, ServiceError> {
        self.guard(
            MockOperation::IsRead {
                uri: self.uri.clone(),
            },
            "is_read",
        )?;
        Ok(self.mock.is_ready())
    }

    async fn get(&self, file_name: &str, key: &str, default: &str) -> Result<String, ServiceError> {
        self.guard(
            MockOperation::Get {
                uri: self.uri.clone(),
                file_name: file_name.to_string(),
                key: key.to_string(),
                default: default.to_string(),
            },
            "get",
        )?;
        self.metafile.get(file_name, key, default).await
    }

    async fn get_list(
        &self,
        file_name: &str,
        list_key: &str,
        list_subkey: &str,
    ) -> Result<Vec<String>, ServiceError> {
        self.guard(
            MockOperation::GetList {
                uri: self.uri.clone(),
                file_name: file_name.to_string(),
                list_key: list_key.to_string(),
                list_subkey: list_subkey.to_string(),
            },
            "get_list",
        )?;
        self.metafile.get_list(file_name, list_key, list_subkey).await
    }

    async fn set(
        &self,
        file_name: &str,
        key: &str,
        default: &str,
        value: &str,
    ) -> Result<(), ServiceError> {
        self.guard(
            MockOperation::Set {
                uri: self.uri.clone(),
                file_name: file_name.to_string(),
                key: key.to_string(),
                default: default.to_string(),
                value: value.to_string(),
            },
            "set",
        )?;
        self.metafile.set(file_name, key, default, value).await
    }

    async fn set_list(
        &self,
        file_name: &str,
        list_key: &str,
        list_subkey: &str,
        list: Vec<String>,
    ) -> Result<(), ServiceError> {
        self.guard(
            MockOperation::SetList {
                uri: self.uri.clone(),
                file_name: file_name.to_string(),
                list_key: list_key.to_string(),
                list_subkey: list_subkey.to_string(),
                list: list.clone(),
            },
            "set_list",
        )?;
        self.metafile
            .set_list(file_name, list_key, list_subkey, list)
            .await
    }

    async fn copy(
        &self,
        source_file_name: &str,
        destination_uri: &str,
        destination_file_name: &str,
    ) -> Result<(), ServiceError> {
        self.guard(
            MockOperation::Copy {
                uri: self.uri.clone(),
                source_file_name: source_file_name.to_string(),
                destination_uri: destination_uri.to_string(),
                destination_file_name: destination_file_name.to_string(),
            },
            "copy",
        )?;
        self.metafile
            .copy(source_file_name, destination_uri, destination_file_name)
            .await
    }

    async fn remove(&self, file_name: &str) -> Result<(), ServiceError> {
        self.guard(
            MockOperation::Remove {
                uri: self.uri.clone(),
                file_name: file_name.to_string(),
            },
            "remove",
        )?;
        self.metafile.remove(file_name).await
    }

    async fn rename(&self, old_file_name: &str, new_file_name: &str) -> Result<(), ServiceError> {
        self.guard(
            MockOperation::Rename {
                uri: self.uri.clone(),
                old_file_name: old_file_name.to_string(),
                new_file_name: new_file_name.to_string(),
            },
            "rename",
        )?;
        self.metafile.rename(old_file_name, new_file_name).await
    }

    async fn rename_directory(&self, new_directory_uri: &str) -> Result<(), ServiceError> {
        self.guard(
            MockOperation::RenameDirectory {
                uri: self.uri.clone(),
                new_directory_uri: new_directory_uri.to_string(),
            },
            "rename_directory",
        )?;
        self.metafile.rename_directory(new_directory_uri).await
    }

    async fn register_monitor(&self, monitor: MonitorEndpoint) -> Result<(), ServiceError> {
        self.guard(
            MockOperation::RegisterMonitor {
                uri: self.uri.clone(),
                monitor: monitor.id(),
            },
            "register_monitor",
        )?;
        self.metafile.register_monitor(monitor).await
    }

    async fn unregister_monitor(&self, monitor: MonitorId) -> Result<(), ServiceError> {
        self.guard(
            MockOperation::UnregisterMonitor {
                uri: self.uri.clone(),
                monitor,
            },
            "unregister_monitor",
        )?;
        self.metafile.unregister_monitor(monitor).await
    }
}

/// Mock activator for testing the activation strategy.
///
/// Returns the configured factory, or the configured error, and counts
/// how many times activation was attempted.
#[derive(Clone)]
pub struct MockActivator {
    result: Result<Arc<dyn MetafileFactory>, ActivationError>,
    activations: Arc<Mutex<Vec<String>>>,
}

impl MockActivator {
    /// Activator that succeeds with `factory`.
    pub fn succeeding(factory: Arc<dyn MetafileFactory>) -> Self {
        Self {
            result: Ok(factory),
            activations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Activator that always fails with `error`.
    pub fn failing(error: ActivationError) -> Self {
        Self {
            result: Err(error),
            activations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the server names activation was attempted for.
    pub fn activations(&self) -> Vec<String> {
        self.activations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Activator for MockActivator {
    async fn activate(&self, server: &str) -> Result<Arc<dyn MetafileFactory>, ActivationError> {
        self.activations.lock().unwrap().push(server.to_string());
        self.result.clone()
    }
}
