// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::cache::DirectoryHandleCache;
use crate::capability::{NamespaceKey, validate_entry_name};
use crate::error::Result;
use crate::hexcodec::{bytes_to_hex, hex_to_bytes};
use diagnostics::*;
use std::collections::HashSet;

/// File operations relative to a namespace's current folder.
///
/// Every operation first makes sure a folder is bound, which may run the
/// host's directory picker once. Failures are returned as they are; nothing
/// here retries.
#[derive(Clone)]
pub struct ScopedFileStore {
    cache: DirectoryHandleCache,
}

impl ScopedFileStore {
    #[must_use]
    pub fn new(cache: DirectoryHandleCache) -> Self {
        Self { cache }
    }

    #[must_use]
    pub fn namespace(&self) -> &NamespaceKey {
        self.cache.namespace()
    }

    #[must_use]
    pub fn cache(&self) -> &DirectoryHandleCache {
        &self.cache
    }

    /// Create or overwrite `filename` with `bytes`.
    ///
    /// Not atomic: a failed write may leave partial content behind.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        let filename = validate_entry_name(filename)?;
        let dir = self.cache.ensure_current().await?;
        self.cache.host().write_file(&dir, filename, bytes).await?;
        debug!(
            "saved {file} ({size} bytes) in {folder}",
            file: filename,
            size: bytes.len(),
            folder: dir.name()
        );
        Ok(())
    }

    pub async fn load(&self, filename: &str) -> Result<Vec<u8>> {
        let filename = validate_entry_name(filename)?;
        let dir = self.cache.ensure_current().await?;
        self.cache.host().read_file(&dir, filename).await
    }

    /// Names of the files (not folders) directly in the current folder.
    pub async fn list(&self) -> Result<HashSet<String>> {
        let dir = self.cache.ensure_current().await?;
        Ok(self
            .cache
            .host()
            .entries(&dir)
            .await?
            .into_iter()
            .filter(|entry| entry.is_file())
            .map(|entry| entry.name)
            .collect())
    }

    /// Rename by copy: read `old_name`, write `new_name`, delete `old_name`.
    ///
    /// If the delete fails after the copy was written, both names stay
    /// readable with the same content and the delete error is returned.
    pub async fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        let old_name = validate_entry_name(old_name)?;
        let new_name = validate_entry_name(new_name)?;
        let dir = self.cache.ensure_current().await?;
        let host = self.cache.host();

        let data = host.read_file(&dir, old_name).await?;
        if old_name == new_name {
            return Ok(());
        }
        host.write_file(&dir, new_name, &data).await?;

        if let Err(e) = host.remove_file(&dir, old_name).await {
            let error = e.to_string();
            warn!(
                "rename {old} -> {new} in {folder} copied but could not remove the original: {error}",
                old: old_name,
                new: new_name,
                folder: dir.name(),
                error: error.as_str()
            );
            return Err(e);
        }
        Ok(())
    }

    pub async fn remove(&self, filename: &str) -> Result<()> {
        let filename = validate_entry_name(filename)?;
        let dir = self.cache.ensure_current().await?;
        self.cache.host().remove_file(&dir, filename).await
    }

    pub async fn current_folder_name(&self) -> Result<String> {
        Ok(self.cache.ensure_current().await?.name().to_string())
    }

    /// Return to the first folder ever chosen for this namespace.
    ///
    /// Only prompts when no folder was ever chosen; an unusable `current`
    /// does not stand in the way.
    pub async fn reset_folder(&self) -> Result<()> {
        if self.cache.origin().await?.is_none() {
            _ = self.cache.ensure_current().await?;
        }
        self.cache.reset_to_origin().await
    }

    /// Enter (creating if needed) the subfolder `name`; returns its name.
    pub async fn descend_into(&self, name: &str) -> Result<String> {
        Ok(self.cache.descend_into(name).await?.name().to_string())
    }

    /// Run the picker to choose a different folder; returns its name.
    pub async fn select_folder(&self) -> Result<String> {
        Ok(self.cache.select_folder().await?.name().to_string())
    }

    /// Whether a folder is bound. Never prompts.
    pub async fn is_folder_set(&self) -> Result<bool> {
        self.cache.is_bound().await
    }

    pub async fn forget(&self) -> Result<()> {
        self.cache.forget().await
    }

    /// [`save`](Self::save) with the payload given as hex text.
    ///
    /// Malformed hex is rejected before any folder is acquired.
    pub async fn save_hex(&self, filename: &str, hex: &str) -> Result<()> {
        let bytes = hex_to_bytes(hex)?;
        self.save(filename, &bytes).await
    }

    /// [`load`](Self::load) with the contents returned as lowercase hex.
    pub async fn load_hex(&self, filename: &str) -> Result<String> {
        Ok(bytes_to_hex(&self.load(filename).await?))
    }
}
