//! service::memory
//!
//! In-process metafile factory for self-contained mode.
//!
//! # Design
//!
//! Every directory URI maps to one shared [`MemoryMetafile`]. Each metafile
//! keeps a record per file holding scalar values and lists. Nothing is
//! persisted; the store lives as long as the factory.
//!
//! Scalar semantics follow the service contract:
//! - `set` with `value == default` clears the key, anything else stores it
//! - `get` returns the stored value, or the caller's default when unset
//! - `set_list` with an empty list clears the list
//!
//! Every mutation that changes a record notifies the metafile's registered
//! monitors with [`MetadataEvent::Changed`]. A monitor registered on a
//! loaded metafile is sent [`MetadataEvent::Ready`] straight away.
//!
//! # Locking
//!
//! The registry lock is always taken before a metafile's state lock, and a
//! state lock is never held while acquiring the registry.
//!
//! # Example
//!
//! ```
//! use dirmeta::service::{MemoryMetafileFactory, Metafile, MetafileFactory};
//!
//! # tokio_test::block_on(async {
//! let factory = MemoryMetafileFactory::new();
//! let docs = factory.open("file:///docs").await.unwrap();
//!
//! docs.set_list("a.txt", "emblems", "name", vec!["urgent".into()]).await.unwrap();
//! docs.copy("a.txt", "file:///backup", "a.txt").await.unwrap();
//!
//! let backup = factory.open("file:///backup").await.unwrap();
//! let emblems = backup.get_list("a.txt", "emblems", "name").await.unwrap();
//! assert_eq!(emblems, vec!["urgent".to_string()]);
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::traits::{Metafile, MetafileFactory, MonitorEndpoint, ServiceError};
use crate::core::types::{ListKey, MetadataEvent, MonitorId};

type Registry = Mutex<HashMap<String, Arc<MemoryMetafile>>>;

/// Factory handing out in-memory metafiles.
///
/// Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetafileFactory {
    registry: Arc<Registry>,
}

impl MemoryMetafileFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (creating on first use) the metafile for `uri`.
    pub async fn open_memory(&self, uri: &str) -> Result<Arc<MemoryMetafile>, ServiceError> {
        if uri.is_empty() {
            return Err(ServiceError::UnsupportedUri(uri.to_string()));
        }

        let mut registry = self.registry.lock().await;
        let metafile = registry
            .entry(uri.to_string())
            .or_insert_with(|| MemoryMetafile::new(uri, Arc::downgrade(&self.registry)))
            .clone();
        Ok(metafile)
    }

    /// Check whether a metafile exists for `uri` (for test verification).
    pub async fn contains(&self, uri: &str) -> bool {
        self.registry.lock().await.contains_key(uri)
    }

    /// Get the URIs of every open metafile, sorted.
    pub async fn uris(&self) -> Vec<String> {
        let registry = self.registry.lock().await;
        let mut uris: Vec<String> = registry.keys().cloned().collect();
        uris.sort();
        uris
    }
}

#[async_trait]
impl MetafileFactory for MemoryMetafileFactory {
    async fn open(&self, uri: &str) -> Result<Arc<dyn Metafile>, ServiceError> {
        let metafile: Arc<dyn Metafile> = self.open_memory(uri).await?;
        Ok(metafile)
    }
}

/// Metadata held for one file.
#[derive(Debug, Clone, Default)]
struct FileRecord {
    values: BTreeMap<String, String>,
    lists: BTreeMap<ListKey, Vec<String>>,
}

impl FileRecord {
    fn is_empty(&self) -> bool {
        self.values.is_empty() && self.lists.is_empty()
    }
}

#[derive(Debug)]
struct MetafileState {
    uri: String,
    files: BTreeMap<String, FileRecord>,
    monitors: Vec<MonitorEndpoint>,
}

impl MetafileState {
    /// Notify live monitors, dropping any whose directory is gone.
    fn notify_changed(&mut self, file_names: Vec<String>) {
        self.monitors.retain(MonitorEndpoint::is_live);
        for monitor in &self.monitors {
            monitor.notify(MetadataEvent::Changed {
                file_names: file_names.clone(),
            });
        }
    }

    /// Store `record` under `file_name`, dropping it when empty.
    fn put_record(&mut self, file_name: &str, record: FileRecord) {
        if record.is_empty() {
            self.files.remove(file_name);
        } else {
            self.files.insert(file_name.to_string(), record);
        }
    }
}

/// One directory's metadata, held in memory.
#[derive(Debug)]
pub struct MemoryMetafile {
    this: Weak<MemoryMetafile>,
    registry: Weak<Registry>,
    state: Mutex<MetafileState>,
}

impl MemoryMetafile {
    fn new(uri: &str, registry: Weak<Registry>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            registry,
            state: Mutex::new(MetafileState {
                uri: uri.to_string(),
                files: BTreeMap::new(),
                monitors: Vec::new(),
            }),
        })
    }

    /// Get the URI this metafile is currently filed under.
    pub async fn uri(&self) -> String {
        self.state.lock().await.uri.clone()
    }

    /// Get the names of files with metadata, sorted.
    pub async fn file_names(&self) -> Vec<String> {
        self.state.lock().await.files.keys().cloned().collect()
    }

    /// Get the number of registered monitors.
    pub async fn monitor_count(&self) -> usize {
        self.state.lock().await.monitors.len()
    }

    fn registry(&self) -> Result<Arc<Registry>, ServiceError> {
        self.registry
            .upgrade()
            .ok_or_else(|| ServiceError::Disconnected("metafile factory released".to_string()))
    }

    /// Find (creating on first use) the metafile for another URI.
    async fn sibling(&self, uri: &str) -> Result<Arc<MemoryMetafile>, ServiceError> {
        if uri.is_empty() {
            return Err(ServiceError::UnsupportedUri(uri.to_string()));
        }

        let registry = self.registry()?;
        let mut map = registry.lock().await;
        let metafile = map
            .entry(uri.to_string())
            .or_insert_with(|| MemoryMetafile::new(uri, Arc::downgrade(&registry)))
            .clone();
        Ok(metafile)
    }
}

#[async_trait]
impl Metafile for MemoryMetafile {
    async fn is_read(&self) -> Result<bool, ServiceError> {
        Ok(true)
    }

    async fn get(&self, file_name: &str, key: &str, default: &str) -> Result<String, ServiceError> {
        let state = self.state.lock().await;
        let value = state
            .files
            .get(file_name)
            .and_then(|record| record.values.get(key))
            .cloned()
            .unwrap_or_else(|| default.to_string());
        Ok(value)
    }

    async fn get_list(
        &self,
        file_name: &str,
        list_key: &str,
        list_subkey: &str,
    ) -> Result<Vec<String>, ServiceError> {
        let state = self.state.lock().await;
        let list = state
            .files
            .get(file_name)
            .and_then(|record| record.lists.get(&ListKey::new(list_key, list_subkey)))
            .cloned()
            .unwrap_or_default();
        Ok(list)
    }

    async fn set(
        &self,
        file_name: &str,
        key: &str,
        default: &str,
        value: &str,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        let mut record = state.files.get(file_name).cloned().unwrap_or_default();

        let changed = if value == default {
            record.values.remove(key).is_some()
        } else {
            record.values.insert(key.to_string(), value.to_string()) != Some(value.to_string())
        };

        if changed {
            state.put_record(file_name, record);
            state.notify_changed(vec![file_name.to_string()]);
        }
        Ok(())
    }

    async fn set_list(
        &self,
        file_name: &str,
        list_key: &str,
        list_subkey: &str,
        list: Vec<String>,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        let mut record = state.files.get(file_name).cloned().unwrap_or_default();
        let key = ListKey::new(list_key, list_subkey);

        let changed = if list.is_empty() {
            record.lists.remove(&key).is_some()
        } else {
            record.lists.insert(key, list.clone()) != Some(list)
        };

        if changed {
            state.put_record(file_name, record);
            state.notify_changed(vec![file_name.to_string()]);
        }
        Ok(())
    }

    async fn copy(
        &self,
        source_file_name: &str,
        destination_uri: &str,
        destination_file_name: &str,
    ) -> Result<(), ServiceError> {
        let (record, own_uri) = {
            let state = self.state.lock().await;
            (state.files.get(source_file_name).cloned(), state.uri.clone())
        };

        // Nothing to copy
        let Some(record) = record else {
            return Ok(());
        };

        let destination = if destination_uri == own_uri {
            self.this
                .upgrade()
                .ok_or_else(|| ServiceError::Disconnected("metafile released".to_string()))?
        } else {
            self.sibling(destination_uri).await?
        };

        let mut state = destination.state.lock().await;
        state.put_record(destination_file_name, record);
        state.notify_changed(vec![destination_file_name.to_string()]);
        Ok(())
    }

    async fn remove(&self, file_name: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        if state.files.remove(file_name).is_some() {
            state.notify_changed(vec![file_name.to_string()]);
        }
        Ok(())
    }

    async fn rename(&self, old_file_name: &str, new_file_name: &str) -> Result<(), ServiceError> {
        if old_file_name == new_file_name {
            return Ok(());
        }

        let mut state = self.state.lock().await;
        if let Some(record) = state.files.remove(old_file_name) {
            state.files.insert(new_file_name.to_string(), record);
            state.notify_changed(vec![old_file_name.to_string(), new_file_name.to_string()]);
        }
        Ok(())
    }

    async fn rename_directory(&self, new_directory_uri: &str) -> Result<(), ServiceError> {
        if new_directory_uri.is_empty() {
            return Err(ServiceError::UnsupportedUri(new_directory_uri.to_string()));
        }

        let this = self
            .this
            .upgrade()
            .ok_or_else(|| ServiceError::Disconnected("metafile released".to_string()))?;
        let registry = self.registry()?;

        let mut map = registry.lock().await;
        let mut state = self.state.lock().await;
        if state.uri == new_directory_uri {
            return Ok(());
        }

        if map
            .get(&state.uri)
            .is_some_and(|filed| Arc::ptr_eq(filed, &this))
        {
            map.remove(&state.uri);
        }
        map.insert(new_directory_uri.to_string(), this);
        state.uri = new_directory_uri.to_string();
        Ok(())
    }

    async fn register_monitor(&self, monitor: MonitorEndpoint) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state
            .monitors
            .retain(|m| m.is_live() && m.id() != monitor.id());
        monitor.notify(MetadataEvent::Ready);
        state.monitors.push(monitor);
        Ok(())
    }

    async fn unregister_monitor(&self, monitor: MonitorId) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        let before = state.monitors.len();
        state.monitors.retain(|m| m.id() != monitor);
        if state.monitors.len() == before {
            return Err(ServiceError::UnknownMonitor(monitor));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;

    type Events = (
        MonitorEndpoint,
        broadcast::Sender<MetadataEvent>,
        broadcast::Receiver<MetadataEvent>,
    );

    fn endpoint() -> Events {
        let (sender, receiver) = broadcast::channel(16);
        (MonitorEndpoint::new(MonitorId::new(), &sender), sender, receiver)
    }

    #[tokio::test]
    async fn open_shares_one_metafile_per_uri() {
        let factory = MemoryMetafileFactory::new();

        let a = factory.open_memory("file:///a").await.unwrap();
        let again = factory.open_memory("file:///a").await.unwrap();
        let b = factory.open_memory("file:///b").await.unwrap();

        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(factory.uris().await, vec!["file:///a", "file:///b"]);
    }

    #[tokio::test]
    async fn open_rejects_empty_uri() {
        let factory = MemoryMetafileFactory::new();
        let result = factory.open("").await;
        assert!(matches!(result, Err(ServiceError::UnsupportedUri(_))));
    }

    #[tokio::test]
    async fn get_returns_default_when_unset() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open("file:///a").await.unwrap();

        assert_eq!(metafile.get("f", "k", "fallback").await.unwrap(), "fallback");
        assert_eq!(metafile.get("f", "k", "").await.unwrap(), "");
    }

    #[tokio::test]
    async fn set_to_default_clears_key() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open_memory("file:///a").await.unwrap();

        metafile.set("f", "k", "d", "v").await.unwrap();
        assert_eq!(metafile.get("f", "k", "d").await.unwrap(), "v");
        assert_eq!(metafile.file_names().await, vec!["f"]);

        metafile.set("f", "k", "d", "d").await.unwrap();
        assert_eq!(metafile.get("f", "k", "").await.unwrap(), "");
        assert!(metafile.file_names().await.is_empty());
    }

    #[tokio::test]
    async fn list_preserves_order_and_empty_clears() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open("file:///a").await.unwrap();
        let list = vec!["c".to_string(), "a".to_string(), "b".to_string()];

        metafile.set_list("f", "tags", "sub", list.clone()).await.unwrap();
        assert_eq!(metafile.get_list("f", "tags", "sub").await.unwrap(), list);
        assert!(metafile.get_list("f", "tags", "other").await.unwrap().is_empty());

        metafile.set_list("f", "tags", "sub", vec![]).await.unwrap();
        assert!(metafile.get_list("f", "tags", "sub").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn copy_within_directory() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open("file:///a").await.unwrap();

        metafile.set("src", "k", "", "v").await.unwrap();
        metafile.copy("src", "file:///a", "dst").await.unwrap();

        assert_eq!(metafile.get("src", "k", "").await.unwrap(), "v");
        assert_eq!(metafile.get("dst", "k", "").await.unwrap(), "v");
    }

    #[tokio::test]
    async fn copy_creates_destination_metafile() {
        let factory = MemoryMetafileFactory::new();
        let source = factory.open("file:///a").await.unwrap();
        source.set("f", "k", "", "v").await.unwrap();

        source.copy("f", "file:///b", "g").await.unwrap();

        assert!(factory.contains("file:///b").await);
        let destination = factory.open("file:///b").await.unwrap();
        assert_eq!(destination.get("g", "k", "").await.unwrap(), "v");
    }

    #[tokio::test]
    async fn copy_missing_source_is_noop() {
        let factory = MemoryMetafileFactory::new();
        let source = factory.open("file:///a").await.unwrap();

        source.copy("absent", "file:///b", "g").await.unwrap();
        assert!(!factory.contains("file:///b").await);
    }

    #[tokio::test]
    async fn rename_moves_record() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open_memory("file:///a").await.unwrap();
        metafile.set("old", "k", "", "v").await.unwrap();

        metafile.rename("old", "new").await.unwrap();

        assert_eq!(metafile.get("old", "k", "").await.unwrap(), "");
        assert_eq!(metafile.get("new", "k", "").await.unwrap(), "v");
        assert_eq!(metafile.file_names().await, vec!["new"]);
    }

    #[tokio::test]
    async fn remove_deletes_record() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open_memory("file:///a").await.unwrap();
        metafile.set("f", "k", "", "v").await.unwrap();
        metafile
            .set_list("f", "l", "s", vec!["x".into()])
            .await
            .unwrap();

        metafile.remove("f").await.unwrap();

        assert!(metafile.file_names().await.is_empty());
    }

    #[tokio::test]
    async fn rename_directory_rekeys_registry() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open_memory("file:///old").await.unwrap();
        metafile.set("f", "k", "", "v").await.unwrap();

        metafile.rename_directory("file:///new").await.unwrap();

        assert!(!factory.contains("file:///old").await);
        assert_eq!(metafile.uri().await, "file:///new");
        let reopened = factory.open_memory("file:///new").await.unwrap();
        assert!(Arc::ptr_eq(&metafile, &reopened));
        assert_eq!(reopened.get("f", "k", "").await.unwrap(), "v");
    }

    #[tokio::test]
    async fn monitors_receive_ready_then_changes() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open("file:///a").await.unwrap();
        let (monitor, _sender, mut events) = endpoint();

        metafile.register_monitor(monitor).await.unwrap();
        assert_eq!(events.try_recv().unwrap(), MetadataEvent::Ready);

        metafile.set("f", "k", "", "v").await.unwrap();
        assert_eq!(events.try_recv().unwrap(), MetadataEvent::changed("f"));

        // Unchanged write is silent
        metafile.set("f", "k", "", "v").await.unwrap();
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn register_same_monitor_twice_keeps_one() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open_memory("file:///a").await.unwrap();
        let (monitor, _sender, _events) = endpoint();

        metafile.register_monitor(monitor.clone()).await.unwrap();
        metafile.register_monitor(monitor).await.unwrap();

        assert_eq!(metafile.monitor_count().await, 1);
    }

    #[tokio::test]
    async fn unregister_unknown_monitor_fails() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open("file:///a").await.unwrap();

        let result = metafile.unregister_monitor(MonitorId::new()).await;
        assert!(matches!(result, Err(ServiceError::UnknownMonitor(_))));
    }

    #[tokio::test]
    async fn unregistered_monitor_stops_receiving() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open("file:///a").await.unwrap();
        let (monitor, _sender, mut events) = endpoint();
        let id = monitor.id();

        metafile.register_monitor(monitor).await.unwrap();
        metafile.unregister_monitor(id).await.unwrap();
        let _ = events.try_recv();

        metafile.set("f", "k", "", "v").await.unwrap();
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn dead_monitors_pruned_on_change() {
        let factory = MemoryMetafileFactory::new();
        let metafile = factory.open_memory("file:///a").await.unwrap();
        let (kept, _kept_sender, mut kept_events) = endpoint();
        let (dropped, dropped_sender, _dropped_events) = endpoint();

        metafile.register_monitor(kept).await.unwrap();
        metafile.register_monitor(dropped).await.unwrap();
        assert_eq!(metafile.monitor_count().await, 2);

        drop(dropped_sender);
        metafile.set("f", "k", "", "v").await.unwrap();

        assert_eq!(metafile.monitor_count().await, 1);
        assert_eq!(kept_events.try_recv().unwrap(), MetadataEvent::Ready);
        assert_eq!(kept_events.try_recv().unwrap(), MetadataEvent::changed("f"));
    }
}
