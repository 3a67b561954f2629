//! Integration tests for the typed metadata accessors.
//!
//! These tests drive a `Directory` over the in-memory store and verify
//! default handling, typed encodings and behaviour when the store is
//! unreachable.

use std::sync::Arc;

use dirmeta::client::{Connection, Directory, FactoryStrategy};
use dirmeta::service::mock::{FailOn, MockMetafileFactory, MockOperation};
use dirmeta::service::{MemoryMetafileFactory, Metafile, MetafileFactory, ServiceError};

fn directory(uri: &str) -> Directory {
    Directory::new(
        Arc::new(Connection::new(FactoryStrategy::self_contained())),
        uri,
    )
}

fn directory_over(mock: &MockMetafileFactory, uri: &str) -> Directory {
    let connection = Connection::new(FactoryStrategy::SelfContained(Arc::new(mock.clone())));
    Directory::new(Arc::new(connection), uri)
}

mod scalars {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let dir = directory("file:///home/user");

        dir.set_file_metadata("a.txt", "icon_position", Some(""), Some("32,64"))
            .await;
        assert_eq!(
            dir.get_file_metadata("a.txt", "icon_position", Some(""))
                .await,
            Some("32,64".to_string())
        );
    }

    #[tokio::test]
    async fn value_equal_to_default_reads_back_as_default() {
        let dir = directory("file:///home/user");

        dir.set_file_metadata("a.txt", "sort_by", Some("name"), Some("size"))
            .await;
        dir.set_file_metadata("a.txt", "sort_by", Some("name"), Some("name"))
            .await;

        assert_eq!(
            dir.get_file_metadata("a.txt", "sort_by", Some("name")).await,
            Some("name".to_string())
        );
    }

    #[tokio::test]
    async fn empty_value_returns_caller_default_exactly() {
        let dir = directory("file:///home/user");

        dir.set_file_metadata("a.txt", "k", None, Some("")).await;
        assert_eq!(dir.get_file_metadata("a.txt", "k", None).await, None);
        assert_eq!(
            dir.get_file_metadata("a.txt", "k", Some("fallback")).await,
            Some("fallback".to_string())
        );
    }

    #[tokio::test]
    async fn keys_are_independent_per_file() {
        let dir = directory("file:///home/user");

        dir.set_file_metadata("a.txt", "k", None, Some("1")).await;
        dir.set_file_metadata("b.txt", "k", None, Some("2")).await;

        assert_eq!(
            dir.get_file_metadata("a.txt", "k", None).await,
            Some("1".to_string())
        );
        assert_eq!(
            dir.get_file_metadata("b.txt", "k", None).await,
            Some("2".to_string())
        );
    }

    #[tokio::test]
    async fn writes_visible_to_other_clients_of_the_store() {
        let store = MemoryMetafileFactory::new();
        let connection = Arc::new(Connection::new(FactoryStrategy::SelfContained(Arc::new(
            store.clone(),
        ))));
        let dir = Directory::new(connection, "file:///shared");

        let other = store.open("file:///shared").await.unwrap();
        other.set("a.txt", "k", "", "from-elsewhere").await.unwrap();

        assert_eq!(
            dir.get_file_metadata("a.txt", "k", None).await,
            Some("from-elsewhere".to_string())
        );
    }
}

mod lists {
    use super::*;

    #[tokio::test]
    async fn list_round_trip_preserves_order() {
        let dir = directory("file:///home/user");
        let list = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        dir.set_file_metadata_list("f", "tags", "sub", &list).await;
        assert_eq!(
            dir.get_file_metadata_list("f", "tags", "sub").await,
            Some(list)
        );
    }

    #[tokio::test]
    async fn unset_list_is_none() {
        let dir = directory("file:///home/user");
        assert_eq!(dir.get_file_metadata_list("f", "tags", "sub").await, None);
    }

    #[tokio::test]
    async fn subkeys_are_distinct_lists() {
        let dir = directory("file:///home/user");

        dir.set_file_metadata_list("f", "emblems", "name", &["x".to_string()])
            .await;
        dir.set_file_metadata_list("f", "emblems", "icon", &["y".to_string()])
            .await;

        assert_eq!(
            dir.get_file_metadata_list("f", "emblems", "name").await,
            Some(vec!["x".to_string()])
        );
        assert_eq!(
            dir.get_file_metadata_list("f", "emblems", "icon").await,
            Some(vec!["y".to_string()])
        );
    }
}

mod typed {
    use super::*;

    #[tokio::test]
    async fn boolean_literals_on_the_wire() {
        let mock = MockMetafileFactory::new();
        let dir = directory_over(&mock, "file:///home/user");

        dir.set_boolean_file_metadata("f", "locked", false, true)
            .await;

        assert!(mock.operations().contains(&MockOperation::Set {
            uri: "file:///home/user".into(),
            file_name: "f".into(),
            key: "locked".into(),
            default: "false".into(),
            value: "true".into(),
        }));
    }

    #[tokio::test]
    async fn boolean_default_when_unset() {
        let dir = directory("file:///home/user");

        assert!(dir.get_boolean_file_metadata("f", "locked", true).await);
        assert!(!dir.get_boolean_file_metadata("f", "locked", false).await);
    }

    #[tokio::test]
    async fn integer_round_trip_and_extremes() {
        let dir = directory("file:///home/user");

        dir.set_integer_file_metadata("f", "zoom", 100, i32::MIN).await;
        assert_eq!(dir.get_integer_file_metadata("f", "zoom", 100).await, i32::MIN);

        dir.set_integer_file_metadata("f", "zoom", 100, i32::MAX).await;
        assert_eq!(dir.get_integer_file_metadata("f", "zoom", 100).await, i32::MAX);
    }

    #[tokio::test]
    async fn integer_overflow_yields_default() {
        let dir = directory("file:///home/user");

        dir.set_file_metadata("f", "zoom", None, Some("4294967296"))
            .await;
        assert_eq!(dir.get_integer_file_metadata("f", "zoom", 7).await, 7);
    }

    #[tokio::test]
    async fn integer_value_equal_to_default_clears() {
        let mock = MockMetafileFactory::new();
        let dir = directory_over(&mock, "file:///home/user");

        dir.set_integer_file_metadata("f", "zoom", 100, 150).await;
        dir.set_integer_file_metadata("f", "zoom", 100, 100).await;

        let memory = mock.store().open_memory("file:///home/user").await.unwrap();
        assert!(memory.file_names().await.is_empty());
    }
}

mod unavailable {
    use super::*;

    #[tokio::test]
    async fn every_accessor_defaults_without_retry() {
        let mock = MockMetafileFactory::new()
            .fail_on(FailOn::Open(ServiceError::Disconnected("no service".into())));
        let dir = directory_over(&mock, "file:///home/user");

        for _ in 0..2 {
            assert!(dir.is_metadata_ready().await);
            assert_eq!(dir.get_file_metadata("f", "k", None).await, None);
            assert_eq!(
                dir.get_file_metadata("f", "k", Some("d")).await,
                Some("d".to_string())
            );
            assert_eq!(dir.get_file_metadata_list("f", "l", "s").await, None);
            assert!(!dir.get_boolean_file_metadata("f", "b", false).await);
            assert_eq!(dir.get_integer_file_metadata("f", "i", -1).await, -1);
            dir.set_file_metadata("f", "k", None, Some("v")).await;
            dir.set_file_metadata_list("f", "l", "s", &["x".to_string()])
                .await;
        }

        assert_eq!(mock.operations().len(), 1);
    }
}
