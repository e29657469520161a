// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::Fixture;
use crate::backend::{FileBackend, MemoryBackend};
use crate::capability::{DirectoryCapability, NamespaceKey, Role};
use crate::error::Error;
use crate::registry::{HandleRegistry, RetryPolicy, decode_record, encode_record};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn music() -> DirectoryCapability {
    DirectoryCapability::new("mem:7", "music")
}

#[tokio::test]
async fn test_put_get_remove() {
    let fx = Fixture::new();
    let key = NamespaceKey::from("songs");

    assert_eq!(fx.registry.get(&key, Role::Current).await.unwrap(), None);

    fx.registry.put(&key, Role::Current, &music()).await.unwrap();
    assert_eq!(
        fx.registry.get(&key, Role::Current).await.unwrap(),
        Some(music())
    );
    assert_eq!(fx.registry.get(&key, Role::Origin).await.unwrap(), None);

    // Overwrite
    let other = DirectoryCapability::new("mem:8", "other");
    fx.registry.put(&key, Role::Current, &other).await.unwrap();
    assert_eq!(
        fx.registry.get(&key, Role::Current).await.unwrap(),
        Some(other)
    );

    fx.registry.remove(&key, Role::Current).await.unwrap();
    assert_eq!(fx.registry.get(&key, Role::Current).await.unwrap(), None);
    // Removing again is fine
    fx.registry.remove(&key, Role::Current).await.unwrap();
}

#[tokio::test]
async fn test_namespaces_do_not_share_entries() {
    let fx = Fixture::new();
    let a = fx.registry.scope(NamespaceKey::from("a"));
    let b = fx.registry.scope(NamespaceKey::from("b"));
    let empty = fx.registry.scope(NamespaceKey::default());

    a.put(Role::Current, &music()).await.unwrap();

    assert_eq!(a.get(Role::Current).await.unwrap(), Some(music()));
    assert_eq!(b.get(Role::Current).await.unwrap(), None);
    assert_eq!(empty.get(Role::Current).await.unwrap(), None);
}

#[tokio::test]
async fn test_records_are_versioned_json() {
    let fx = Fixture::new();
    fx.registry
        .put(&NamespaceKey::from("songs"), Role::Origin, &music())
        .await
        .unwrap();

    let raw = fx.backend.raw("songs", "origin").await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["version"], 1);
    assert_eq!(json["capability"]["identity"], "mem:7");
    assert_eq!(json["capability"]["name"], "music");

    assert_eq!(decode_record(&encode_record(&music()).unwrap()), Ok(music()));
}

#[tokio::test]
async fn test_corrupt_record_reads_as_absent() {
    let fx = Fixture::new();
    let key = NamespaceKey::from("songs");
    // Open the namespace so raw inserts land in the same keyspace.
    assert_eq!(fx.registry.get(&key, Role::Current).await.unwrap(), None);

    fx.backend
        .insert_raw("songs", "current", b"not json at all".to_vec())
        .await;
    fx.backend
        .insert_raw(
            "songs",
            "origin",
            br#"{"version":9,"capability":{"identity":"x","name":"y"}}"#.to_vec(),
        )
        .await;

    assert_eq!(fx.registry.get(&key, Role::Current).await.unwrap(), None);
    assert_eq!(fx.registry.get(&key, Role::Origin).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_calls_wait_for_backend_to_open() {
    let backend = MemoryBackend::opening();
    let registry = HandleRegistry::new(Arc::new(backend.clone()));

    let opener = backend.clone();
    let ready = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(350)).await;
        opener.set_ready().await;
    });

    let key = NamespaceKey::from("songs");
    registry.put(&key, Role::Current, &music()).await.unwrap();
    assert_eq!(registry.get(&key, Role::Current).await.unwrap(), Some(music()));
    ready.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhausted_is_unavailable() {
    let registry = HandleRegistry::with_retry(
        Arc::new(MemoryBackend::opening()),
        RetryPolicy {
            delay: Duration::from_millis(10),
            max_retries: 3,
        },
    );

    let result = registry.get(&NamespaceKey::from("songs"), Role::Current).await;
    assert!(matches!(result, Err(Error::Unavailable(_))));
}

#[tokio::test]
async fn test_unavailable_backend_is_surfaced() {
    let fx = Fixture::new();
    let key = NamespaceKey::from("songs");
    fx.backend.set_failure(Some("disk gone")).await;

    assert_eq!(
        fx.registry.get(&key, Role::Current).await,
        Err(Error::Unavailable("disk gone".into()))
    );
    assert_eq!(
        fx.registry.put(&key, Role::Current, &music()).await,
        Err(Error::Unavailable("disk gone".into()))
    );

    fx.backend.set_failure(None).await;
    fx.registry.put(&key, Role::Current, &music()).await.unwrap();
}

#[tokio::test]
async fn test_file_backend_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("registry");
    let key = NamespaceKey::from("songs");
    let empty = NamespaceKey::default();

    {
        let backend = FileBackend::open(root.clone());
        backend.ready().await.unwrap();
        let registry = HandleRegistry::new(Arc::new(backend));
        registry.put(&key, Role::Current, &music()).await.unwrap();
        registry.put(&key, Role::Origin, &music()).await.unwrap();
        registry.put(&empty, Role::Current, &music()).await.unwrap();
        registry.remove(&empty, Role::Current).await.unwrap();
    }

    let registry = HandleRegistry::new(Arc::new(FileBackend::open(root)));
    assert_eq!(registry.get(&key, Role::Current).await.unwrap(), Some(music()));
    assert_eq!(registry.get(&key, Role::Origin).await.unwrap(), Some(music()));
    assert_eq!(registry.get(&empty, Role::Current).await.unwrap(), None);
}

#[tokio::test]
async fn test_file_backend_unreadable_document_is_empty() {
    let temp = TempDir::new().unwrap();
    let backend = FileBackend::open(temp.path().to_path_buf());
    backend.ready().await.unwrap();

    let digest = hex::encode(Sha256::digest(b"songs"));
    std::fs::write(temp.path().join(format!("ns-{digest}.json")), b"{ truncated").unwrap();

    let registry = HandleRegistry::new(Arc::new(backend));
    let key = NamespaceKey::from("songs");
    assert_eq!(registry.get(&key, Role::Current).await.unwrap(), None);

    registry.put(&key, Role::Current, &music()).await.unwrap();
    assert_eq!(registry.get(&key, Role::Current).await.unwrap(), Some(music()));
}

#[tokio::test]
async fn test_file_backend_long_namespace_key() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("registry");
    let key = NamespaceKey::from("p".repeat(300));

    {
        let registry = HandleRegistry::new(Arc::new(FileBackend::open(root.clone())));
        registry.put(&key, Role::Current, &music()).await.unwrap();
        assert_eq!(registry.get(&key, Role::Current).await.unwrap(), Some(music()));
    }

    let registry = HandleRegistry::new(Arc::new(FileBackend::open(root)));
    assert_eq!(registry.get(&key, Role::Current).await.unwrap(), Some(music()));
    assert_eq!(registry.namespaces().await.unwrap(), vec![key]);
}

#[tokio::test]
async fn test_file_backend_ignores_document_of_other_namespace() {
    let temp = TempDir::new().unwrap();
    let backend = FileBackend::open(temp.path().to_path_buf());
    backend.ready().await.unwrap();
    let registry = HandleRegistry::new(Arc::new(backend));
    let songs = NamespaceKey::from("songs");
    registry.put(&songs, Role::Current, &music()).await.unwrap();

    // Move the "songs" document to where "talks" would live.
    let from = temp.path().join(format!("ns-{}.json", hex::encode(Sha256::digest(b"songs"))));
    let to = temp.path().join(format!("ns-{}.json", hex::encode(Sha256::digest(b"talks"))));
    std::fs::rename(from, to).unwrap();

    let talks = NamespaceKey::from("talks");
    assert_eq!(registry.get(&talks, Role::Current).await.unwrap(), None);
    assert_eq!(registry.get(&songs, Role::Current).await.unwrap(), None);
}

#[tokio::test]
async fn test_namespaces_lists_only_populated_keys() {
    let fx = Fixture::new();
    let songs = NamespaceKey::from("songs");
    let talks = NamespaceKey::from("talks");
    let unnamed = NamespaceKey::default();

    fx.registry.put(&talks, Role::Current, &music()).await.unwrap();
    fx.registry.put(&songs, Role::Origin, &music()).await.unwrap();
    fx.registry.put(&unnamed, Role::Current, &music()).await.unwrap();
    // Opened but empty
    assert_eq!(fx.registry.get(&NamespaceKey::from("idle"), Role::Current).await.unwrap(), None);
    fx.registry.remove(&unnamed, Role::Current).await.unwrap();

    assert_eq!(fx.registry.namespaces().await.unwrap(), vec![songs.clone(), talks.clone()]);

    fx.registry.clear().await.unwrap();
    assert!(fx.registry.namespaces().await.unwrap().is_empty());
    assert_eq!(fx.registry.get(&songs, Role::Origin).await.unwrap(), None);

    // Handles opened before the clear keep working.
    fx.registry.put(&songs, Role::Current, &music()).await.unwrap();
    assert_eq!(fx.registry.namespaces().await.unwrap(), vec![songs]);
}

#[tokio::test]
async fn test_file_backend_lists_and_clears_across_reopen() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("registry");
    let songs = NamespaceKey::from("songs");
    let unnamed = NamespaceKey::default();

    {
        let registry = HandleRegistry::new(Arc::new(FileBackend::open(root.clone())));
        registry.put(&songs, Role::Current, &music()).await.unwrap();
        registry.put(&unnamed, Role::Current, &music()).await.unwrap();
    }

    let registry = HandleRegistry::new(Arc::new(FileBackend::open(root.clone())));
    assert_eq!(registry.namespaces().await.unwrap(), vec![unnamed.clone(), songs.clone()]);

    registry.clear().await.unwrap();
    assert!(registry.namespaces().await.unwrap().is_empty());
    assert_eq!(registry.get(&songs, Role::Current).await.unwrap(), None);

    let registry = HandleRegistry::new(Arc::new(FileBackend::open(root)));
    assert_eq!(registry.get(&unnamed, Role::Current).await.unwrap(), None);
}

#[tokio::test]
async fn test_clear_on_unavailable_backend_is_surfaced() {
    let fx = Fixture::new();
    fx.backend.set_failure(Some("disk gone")).await;

    assert_eq!(fx.registry.clear().await, Err(Error::Unavailable("disk gone".into())));
    assert_eq!(fx.registry.namespaces().await, Err(Error::Unavailable("disk gone".into())));
}
