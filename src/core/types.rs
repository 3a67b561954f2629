//! core::types
//!
//! Shared value types for metadata access and change notification.
//!
//! # Types
//!
//! - [`MonitorId`] - Identity of a registered change monitor
//! - [`MetadataEvent`] - A change notification pushed by the metadata service
//! - [`ListKey`] - The `(list_key, list_subkey)` pair addressing a list value

use std::fmt;

use uuid::Uuid;

/// Identity of a registered change monitor.
///
/// The service uses this to find the endpoint again when the monitor is
/// unregistered. Each [`MonitorId::new`] is unique for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorId(Uuid);

impl MonitorId {
    /// Generate a fresh monitor identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MonitorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A change notification delivered to a directory's monitor.
///
/// The payload only says which files changed. Re-reading and interpreting
/// the metadata is up to the receiving directory model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataEvent {
    /// Metadata for the named files changed.
    Changed {
        /// Files in the directory whose metadata changed
        file_names: Vec<String>,
    },
    /// The store finished loading the directory's metadata.
    Ready,
}

impl MetadataEvent {
    /// Build a `Changed` event for a single file.
    pub fn changed(file_name: impl Into<String>) -> Self {
        MetadataEvent::Changed {
            file_names: vec![file_name.into()],
        }
    }

    /// Check whether this event mentions the given file.
    pub fn mentions(&self, file_name: &str) -> bool {
        match self {
            MetadataEvent::Changed { file_names } => file_names.iter().any(|f| f == file_name),
            MetadataEvent::Ready => false,
        }
    }
}

/// Address of a list value inside one file's metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListKey {
    /// The list key (e.g. `"emblems"`)
    pub key: String,
    /// The attribute under the key holding each element (e.g. `"name"`)
    pub subkey: String,
}

impl ListKey {
    /// Create a list key.
    pub fn new(key: impl Into<String>, subkey: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            subkey: subkey.into(),
        }
    }
}

impl fmt::Display for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.key, self.subkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_ids_are_unique() {
        let a = MonitorId::new();
        let b = MonitorId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn monitor_id_display_is_uuid() {
        let id = MonitorId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }

    #[test]
    fn changed_event_mentions_file() {
        let event = MetadataEvent::changed("a.txt");
        assert!(event.mentions("a.txt"));
        assert!(!event.mentions("b.txt"));
        assert!(!MetadataEvent::Ready.mentions("a.txt"));
    }

    #[test]
    fn list_key_display() {
        let key = ListKey::new("emblems", "name");
        assert_eq!(key.to_string(), "emblems/name");
    }
}
