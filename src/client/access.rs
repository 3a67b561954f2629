//! client::access
//!
//! Typed metadata accessors.
//!
//! Every accessor resolves the directory's metafile first. Without one it
//! returns the caller's default. Remote failures are logged at `debug` and
//! also answered with the default.
//!
//! Scalars travel as strings. An absent default is sent as `""`, and an
//! empty remote value means "unset", so the caller gets its own default
//! back exactly.

use tracing::debug;

use super::directory::Directory;
use crate::core::codec;

impl Directory {
    /// Check whether the store has finished loading this directory.
    ///
    /// Reports `true` when there is no handle or the query fails, so
    /// callers never wait on a store they cannot reach.
    pub async fn is_metadata_ready(&self) -> bool {
        let Some(metafile) = self.metafile().await else {
            return true;
        };

        match metafile.is_read().await {
            Ok(ready) => ready,
            Err(err) => {
                debug!(error = %err, "failed to query metadata readiness");
                true
            }
        }
    }

    /// Get a scalar value.
    pub async fn get_file_metadata(
        &self,
        file_name: &str,
        key: &str,
        default: Option<&str>,
    ) -> Option<String> {
        return_if_fail!(!file_name.is_empty(), default.map(str::to_string));
        return_if_fail!(!key.is_empty(), default.map(str::to_string));

        let Some(metafile) = self.metafile().await else {
            return default.map(str::to_string);
        };

        match metafile.get(file_name, key, default.unwrap_or("")).await {
            Ok(value) if value.is_empty() => default.map(str::to_string),
            Ok(value) => Some(value),
            Err(err) => {
                debug!(file = file_name, key, error = %err, "failed to get metadata");
                default.map(str::to_string)
            }
        }
    }

    /// Get a list value in stored order.
    ///
    /// Returns `None` when the list is unset or empty.
    pub async fn get_file_metadata_list(
        &self,
        file_name: &str,
        list_key: &str,
        list_subkey: &str,
    ) -> Option<Vec<String>> {
        return_if_fail!(!file_name.is_empty(), None);
        return_if_fail!(!list_key.is_empty(), None);
        return_if_fail!(!list_subkey.is_empty(), None);

        let metafile = self.metafile().await?;

        match metafile.get_list(file_name, list_key, list_subkey).await {
            Ok(list) if list.is_empty() => None,
            Ok(list) => Some(list),
            Err(err) => {
                debug!(
                    file = file_name,
                    list_key,
                    list_subkey,
                    error = %err,
                    "failed to get metadata list"
                );
                None
            }
        }
    }

    /// Set a scalar value.
    ///
    /// Setting the value equal to `default` clears it.
    pub async fn set_file_metadata(
        &self,
        file_name: &str,
        key: &str,
        default: Option<&str>,
        value: Option<&str>,
    ) {
        return_if_fail!(!file_name.is_empty());
        return_if_fail!(!key.is_empty());

        let Some(metafile) = self.metafile().await else {
            return;
        };

        let result = metafile
            .set(file_name, key, default.unwrap_or(""), value.unwrap_or(""))
            .await;
        if let Err(err) = result {
            debug!(file = file_name, key, error = %err, "failed to set metadata");
        }
    }

    /// Replace a list value.
    ///
    /// An empty list clears it.
    pub async fn set_file_metadata_list(
        &self,
        file_name: &str,
        list_key: &str,
        list_subkey: &str,
        list: &[String],
    ) {
        return_if_fail!(!file_name.is_empty());
        return_if_fail!(!list_key.is_empty());
        return_if_fail!(!list_subkey.is_empty());

        let Some(metafile) = self.metafile().await else {
            return;
        };

        let result = metafile
            .set_list(file_name, list_key, list_subkey, list.to_vec())
            .await;
        if let Err(err) = result {
            debug!(
                file = file_name,
                list_key,
                list_subkey,
                error = %err,
                "failed to set metadata list"
            );
        }
    }

    /// Get a boolean value.
    ///
    /// # Panics
    ///
    /// Panics if the stored value is neither `"true"` nor `"false"`.
    pub async fn get_boolean_file_metadata(
        &self,
        file_name: &str,
        key: &str,
        default: bool,
    ) -> bool {
        let default_text = codec::encode_bool(default);
        let value = self
            .get_file_metadata(file_name, key, Some(default_text))
            .await
            .unwrap_or_else(|| default_text.to_string());
        codec::decode_bool(&value)
    }

    /// Set a boolean value.
    pub async fn set_boolean_file_metadata(
        &self,
        file_name: &str,
        key: &str,
        default: bool,
        value: bool,
    ) {
        self.set_file_metadata(
            file_name,
            key,
            Some(codec::encode_bool(default)),
            Some(codec::encode_bool(value)),
        )
        .await;
    }

    /// Get an integer value.
    ///
    /// Text that is not a clean integer yields `default`.
    pub async fn get_integer_file_metadata(
        &self,
        file_name: &str,
        key: &str,
        default: i32,
    ) -> i32 {
        let default_text = codec::encode_int(default);
        match self
            .get_file_metadata(file_name, key, Some(default_text.as_str()))
            .await
        {
            Some(value) => codec::decode_int(&value, default),
            None => default,
        }
    }

    /// Set an integer value.
    pub async fn set_integer_file_metadata(
        &self,
        file_name: &str,
        key: &str,
        default: i32,
        value: i32,
    ) {
        let default_text = codec::encode_int(default);
        let value_text = codec::encode_int(value);
        self.set_file_metadata(
            file_name,
            key,
            Some(default_text.as_str()),
            Some(value_text.as_str()),
        )
        .await;
    }
}
