// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::Fixture;
use crate::capability::NamespaceKey;
use crate::error::Error;

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let fx = Fixture::new();
    let manager = fx.manager();

    let a = manager.for_namespace("A").await.unwrap();
    let b = manager.for_namespace("B").await.unwrap();
    a.save("x.txt", b"from a").await.unwrap();
    b.save("y.txt", b"from b").await.unwrap();

    // Each namespace chose its own folder.
    assert_eq!(fx.host.picker_calls().await, 2);
    assert_ne!(
        a.current_folder_name().await.unwrap(),
        b.current_folder_name().await.unwrap()
    );
    assert_eq!(a.load("y.txt").await, Err(Error::not_found("y.txt")));
    assert_eq!(b.load("x.txt").await, Err(Error::not_found("x.txt")));

    // Moving one namespace leaves the other alone.
    _ = a.descend_into("deeper").await.unwrap();
    assert_eq!(b.load("y.txt").await.unwrap(), b"from b");
}

#[tokio::test]
async fn test_same_key_same_store() {
    let fx = Fixture::new();
    let manager = fx.manager();

    let first = manager.for_namespace("songs").await.unwrap();
    first.save("a.txt", b"a").await.unwrap();
    let again = manager.for_namespace("songs").await.unwrap();
    assert_eq!(again.load("a.txt").await.unwrap(), b"a");
    assert_eq!(fx.host.picker_calls().await, 1);

    assert_eq!(
        manager.namespaces().await,
        vec![NamespaceKey::from("songs")]
    );
}

#[tokio::test]
async fn test_selection() {
    let fx = Fixture::new();
    let manager = fx.manager();

    assert!(matches!(manager.selected().await, Err(Error::NamespaceNotSet)));
    assert_eq!(manager.selected_key().await, None);

    let store = manager.select("songs").await.unwrap();
    store.save("a.txt", b"a").await.unwrap();
    let selected = manager.selected().await.unwrap();
    assert_eq!(selected.load("a.txt").await.unwrap(), b"a");

    _ = manager.select("podcasts").await.unwrap();
    assert_eq!(manager.selected_key().await, Some(NamespaceKey::from("podcasts")));
    assert!(manager.selected().await.unwrap().list().await.unwrap().is_empty());

    assert_eq!(
        manager.namespaces().await,
        vec![NamespaceKey::from("podcasts"), NamespaceKey::from("songs")]
    );
}

#[tokio::test]
async fn test_empty_key_is_a_namespace() {
    let fx = Fixture::new();
    let manager = fx.manager();

    let unnamed = manager.select("").await.unwrap();
    unnamed.save("a.txt", b"a").await.unwrap();

    let named = manager.for_namespace("default").await.unwrap();
    assert_eq!(named.load("a.txt").await, Err(Error::not_found("a.txt")));
    assert_eq!(manager.selected().await.unwrap().namespace().as_str(), "");
}

#[tokio::test]
async fn test_restart_keeps_folders() {
    let fx = Fixture::new();
    {
        let manager = fx.manager();
        let store = manager.for_namespace("songs").await.unwrap();
        _ = store.descend_into("sub").await.unwrap();
        store.save("c.txt", b"c").await.unwrap();
    }

    let later = fx.restart();
    let manager = later.manager();
    let store = manager.for_namespace("songs").await.unwrap();
    assert!(store.is_folder_set().await.unwrap());
    assert_eq!(store.current_folder_name().await.unwrap(), "sub");
    assert_eq!(store.load("c.txt").await.unwrap(), b"c");
    assert_eq!(later.host.picker_calls().await, 1);
}

#[tokio::test]
async fn test_persisted_namespaces_survive_restart() {
    let fx = Fixture::new();
    {
        let manager = fx.manager();
        manager.for_namespace("songs").await.unwrap().save("a.txt", b"a").await.unwrap();
        manager.for_namespace("talks").await.unwrap().save("b.txt", b"b").await.unwrap();
        // Never acquired a folder
        _ = manager.for_namespace("idle").await.unwrap();
    }

    let later = fx.restart();
    let manager = later.manager();
    assert!(manager.namespaces().await.is_empty());
    assert_eq!(
        manager.persisted_namespaces().await.unwrap(),
        vec![NamespaceKey::from("songs"), NamespaceKey::from("talks")]
    );
}

#[tokio::test]
async fn test_clear_all_forgets_every_namespace() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let songs = manager.for_namespace("songs").await.unwrap();
    songs.save("a.txt", b"a").await.unwrap();
    let talks = manager.for_namespace("talks").await.unwrap();
    talks.save("b.txt", b"b").await.unwrap();

    manager.clear_all().await.unwrap();
    assert!(manager.persisted_namespaces().await.unwrap().is_empty());
    assert!(!songs.is_folder_set().await.unwrap());
    assert!(!talks.is_folder_set().await.unwrap());

    // Stores prompt again, and a restart finds nothing.
    songs.save("c.txt", b"c").await.unwrap();
    assert_eq!(fx.host.picker_calls().await, 3);
    let later = fx.restart();
    assert!(!later.store("talks").is_folder_set().await.unwrap());
}
