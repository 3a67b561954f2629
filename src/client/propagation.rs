//! client::propagation
//!
//! Mirrors file system structure changes into the metadata store.
//!
//! These calls are silent no-ops when the directory has no metafile, and
//! remote failures are only logged.

use tracing::debug;

use super::directory::{Directory, MetafileSlot};

impl Directory {
    /// Copy one file's metadata into `destination`.
    ///
    /// The destination is addressed by URI, so it does not need an open
    /// handle of its own.
    pub async fn copy_file_metadata(
        &self,
        source_file_name: &str,
        destination: &Directory,
        destination_file_name: &str,
    ) {
        let Some(metafile) = self.metafile().await else {
            return;
        };

        let destination_uri = destination.uri().await;
        let result = metafile
            .copy(source_file_name, &destination_uri, destination_file_name)
            .await;
        if let Err(err) = result {
            debug!(
                file = source_file_name,
                destination = %destination_uri,
                destination_file = destination_file_name,
                error = %err,
                "failed to copy metadata"
            );
        }
    }

    /// Delete one file's metadata.
    pub async fn remove_file_metadata(&self, file_name: &str) {
        let Some(metafile) = self.metafile().await else {
            return;
        };

        if let Err(err) = metafile.remove(file_name).await {
            debug!(file = file_name, error = %err, "failed to remove metadata");
        }
    }

    /// Move one file's metadata to a new name in this directory.
    pub async fn rename_file_metadata(&self, old_file_name: &str, new_file_name: &str) {
        let Some(metafile) = self.metafile().await else {
            return;
        };

        if let Err(err) = metafile.rename(old_file_name, new_file_name).await {
            debug!(
                file = old_file_name,
                new_file = new_file_name,
                error = %err,
                "failed to rename metadata"
            );
        }
    }

    /// Move this directory's metadata to `new_directory_uri`.
    ///
    /// On success the directory takes the new URI and reopens its handle
    /// on next use. On failure both are kept.
    pub async fn rename_directory_metadata(&self, new_directory_uri: &str) {
        let Some(metafile) = self.metafile().await else {
            return;
        };

        if let Err(err) = metafile.rename_directory(new_directory_uri).await {
            debug!(
                new_uri = new_directory_uri,
                error = %err,
                "failed to rename directory metadata"
            );
            return;
        }

        let mut state = self.state.write().await;
        debug!(old_uri = %state.uri, new_uri = new_directory_uri, "directory metadata renamed");
        state.uri = new_directory_uri.to_string();
        state.metafile = MetafileSlot::Unresolved;
    }
}
