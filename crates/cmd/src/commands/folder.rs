// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::Reply;
use diagnostics::log_info;
use dirstore::{Result, ScopedFileStore};

/// Choose a new folder for the namespace, even if one is set
pub async fn select_command(store: &ScopedFileStore) -> Result<Reply> {
    let name = store.select_folder().await?;
    log_info!("Selected folder {name}", name: name.as_str());
    Ok(Reply::Text(name))
}

pub async fn is_set_command(store: &ScopedFileStore) -> Result<Reply> {
    Ok(Reply::Flag(store.is_folder_set().await?))
}

pub async fn pwd_command(store: &ScopedFileStore) -> Result<Reply> {
    Ok(Reply::Text(store.current_folder_name().await?))
}

pub async fn cd_command(store: &ScopedFileStore, name: &str) -> Result<Reply> {
    Ok(Reply::Text(store.descend_into(name).await?))
}

pub async fn reset_command(store: &ScopedFileStore) -> Result<Reply> {
    store.reset_folder().await?;
    Ok(Reply::Flag(true))
}

pub async fn forget_command(store: &ScopedFileStore) -> Result<Reply> {
    store.forget().await?;
    log_info!("Forgot folders of {namespace}", namespace: store.namespace().as_str());
    Ok(Reply::Flag(true))
}
