// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::Reply;
use diagnostics::{log_debug, log_info};
use dirstore::{Result, ScopedFileStore};

pub async fn save_command(store: &ScopedFileStore, name: &str, hex: &str) -> Result<Reply> {
    store.save_hex(name, hex).await?;
    log_info!("Saved {name} ({chars} hex chars)", name: name, chars: hex.len());
    Ok(Reply::Flag(true))
}

pub async fn load_command(store: &ScopedFileStore, name: &str) -> Result<Reply> {
    Ok(Reply::Text(store.load_hex(name).await?))
}

/// File names joined by ", ", sorted so output is stable
pub async fn list_command(store: &ScopedFileStore) -> Result<Reply> {
    let mut names: Vec<String> = store.list().await?.into_iter().collect();
    names.sort();
    log_debug!("Listed {count} files", count: names.len());
    Ok(Reply::Text(names.join(", ")))
}

pub async fn rename_command(store: &ScopedFileStore, old: &str, new: &str) -> Result<Reply> {
    store.rename(old, new).await?;
    log_info!("Renamed {old} to {new}", old: old, new: new);
    Ok(Reply::Flag(true))
}

pub async fn remove_command(store: &ScopedFileStore, name: &str) -> Result<Reply> {
    store.remove(name).await?;
    log_info!("Removed {name}", name: name);
    Ok(Reply::Flag(true))
}
