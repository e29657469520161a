// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Local filesystem host and file registry, end to end.

use anyhow::Result;
use dirstore::{Config, Error, FixedPicker, LocalHost, NamespaceManager};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn config(state: &Path) -> Result<Config> {
    let yaml = format!(
        "state_dir: {}\nregistry:\n  retry_delay_ms: 10\n  retry_limit: 500\n",
        state.display()
    );
    Ok(Config::from_yaml(&yaml)?)
}

fn manager(state: &Path, pick: Option<&Path>) -> Result<NamespaceManager> {
    let host = LocalHost::new(FixedPicker::new(pick.map(Path::to_path_buf)));
    Ok(NamespaceManager::with_config(&config(state)?, Arc::new(host)))
}

#[tokio::test]
async fn test_files_land_in_the_chosen_directory() -> Result<()> {
    let state = TempDir::new()?;
    let music = TempDir::new()?;
    let manager = manager(state.path(), Some(music.path()))?;

    let store = manager.select("songs").await?;
    store.save("a.txt", b"AB").await?;
    store.save_hex("b.bin", "0001ff").await?;

    assert_eq!(std::fs::read(music.path().join("a.txt"))?, b"AB");
    assert_eq!(std::fs::read(music.path().join("b.bin"))?, vec![0, 1, 0xff]);

    let listed = store.list().await?;
    let expected: HashSet<String> = ["a.txt", "b.bin"].iter().map(|s| s.to_string()).collect();
    assert_eq!(listed, expected);

    store.rename("a.txt", "c.txt").await?;
    assert!(!music.path().join("a.txt").exists());
    assert_eq!(store.load_hex("c.txt").await?, "4142");
    Ok(())
}

#[tokio::test]
async fn test_subfolders_on_disk() -> Result<()> {
    let state = TempDir::new()?;
    let music = TempDir::new()?;
    let manager = manager(state.path(), Some(music.path()))?;
    let store = manager.for_namespace("songs").await?;

    store.save("top.txt", b"top").await?;
    assert_eq!(store.descend_into("live").await?, "live");
    store.save("deep.txt", b"deep").await?;
    assert!(music.path().join("live").join("deep.txt").is_file());

    store.reset_folder().await?;
    let listed = store.list().await?;
    assert!(listed.contains("top.txt"));
    assert!(!listed.contains("live"));
    assert!(!listed.contains("deep.txt"));
    Ok(())
}

#[tokio::test]
async fn test_second_process_reuses_the_folder() -> Result<()> {
    let state = TempDir::new()?;
    let music = TempDir::new()?;
    {
        let manager = manager(state.path(), Some(music.path()))?;
        let store = manager.for_namespace("songs").await?;
        store.save("kept.txt", b"kept").await?;
    }

    // A picker that always cancels proves nothing prompts.
    let manager = manager(state.path(), None)?;
    let store = manager.for_namespace("songs").await?;
    assert_eq!(store.load("kept.txt").await?, b"kept");

    // A namespace never chosen still needs the picker.
    let other = manager.for_namespace("other").await?;
    assert_eq!(other.load("kept.txt").await, Err(Error::SelectionCancelled));
    Ok(())
}

#[tokio::test]
async fn test_deleted_folder_is_denied() -> Result<()> {
    let state = TempDir::new()?;
    let parent = TempDir::new()?;
    let music = parent.path().join("music");
    std::fs::create_dir(&music)?;

    let manager = manager(state.path(), Some(&music))?;
    let store = manager.for_namespace("songs").await?;
    store.save("a.txt", b"a").await?;

    std::fs::remove_dir_all(&music)?;
    assert!(matches!(
        store.load("a.txt").await,
        Err(Error::PermissionDenied(_))
    ));
    assert!(!store.is_folder_set().await?);
    Ok(())
}
