// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::Reply;
use diagnostics::log_info;
use dirstore::{NamespaceManager, Result};

/// Namespaces with a persisted folder, comma separated
pub async fn namespaces_command(manager: &NamespaceManager) -> Result<Reply> {
    let keys = manager.persisted_namespaces().await?;
    let names: Vec<&str> = keys.iter().map(|key| key.as_str()).collect();
    Ok(Reply::Text(names.join(", ")))
}

pub async fn clear_all_command(manager: &NamespaceManager) -> Result<Reply> {
    manager.clear_all().await?;
    log_info!("Cleared the folders of every namespace");
    Ok(Reply::Flag(true))
}
