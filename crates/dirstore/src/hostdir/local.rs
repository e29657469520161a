// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::PathPicker;
use crate::capability::{DirectoryCapability, DirectoryEntry, EntryKind, Permission};
use crate::error::{Error, Result};
use crate::host::DirectoryHost;
use async_trait::async_trait;
use diagnostics::*;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Directory host over `tokio::fs`.
pub struct LocalHost {
    picker: Box<dyn PathPicker>,
}

impl LocalHost {
    #[must_use]
    pub fn new<P: PathPicker + 'static>(picker: P) -> Self {
        Self {
            picker: Box::new(picker),
        }
    }

    /// Capability for an existing host directory.
    pub async fn capability_for(path: &Path) -> Result<DirectoryCapability> {
        let shown = path.display().to_string();
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| Error::from_io(&shown, &e))?;
        let metadata = tokio::fs::metadata(&canonical)
            .await
            .map_err(|e| Error::from_io(&shown, &e))?;
        if !metadata.is_dir() {
            return Err(Error::not_found(format!("{shown} is not a directory")));
        }

        let identity = canonical.to_string_lossy().into_owned();
        let name = canonical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| identity.clone());
        Ok(DirectoryCapability::new(identity, name))
    }

    fn path_of(dir: &DirectoryCapability) -> PathBuf {
        PathBuf::from(dir.identity())
    }

    fn child_of(dir: &DirectoryCapability, name: &str) -> PathBuf {
        Self::path_of(dir).join(name)
    }
}

#[async_trait]
impl DirectoryHost for LocalHost {
    async fn request_directory(&self) -> Result<Option<DirectoryCapability>> {
        match self.picker.pick().await? {
            Some(path) => Ok(Some(Self::capability_for(&path).await?)),
            None => Ok(None),
        }
    }

    async fn query_permission(&self, dir: &DirectoryCapability) -> Result<Permission> {
        match tokio::fs::metadata(Self::path_of(dir)).await {
            Ok(metadata) if metadata.is_dir() && !metadata.permissions().readonly() => {
                Ok(Permission::Granted)
            }
            Ok(_) => Ok(Permission::Denied),
            Err(e) => {
                let error = e.to_string();
                debug!(
                    "{folder} is no longer accessible: {error}",
                    folder: dir.identity(),
                    error: error.as_str()
                );
                Ok(Permission::Denied)
            }
        }
    }

    async fn request_permission(&self, dir: &DirectoryCapability) -> Result<Permission> {
        // Nobody to ask: the filesystem answer is final.
        self.query_permission(dir).await
    }

    async fn open_directory(
        &self,
        dir: &DirectoryCapability,
        name: &str,
        create: bool,
    ) -> Result<DirectoryCapability> {
        let path = Self::child_of(dir, name);
        if create {
            match tokio::fs::create_dir(&path).await {
                Ok(()) => {
                    debug!("created directory {name} in {folder}", name: name, folder: dir.name());
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(Error::from_io(name, &e)),
            }
        }
        Self::capability_for(&path).await
    }

    async fn read_file(&self, dir: &DirectoryCapability, name: &str) -> Result<Vec<u8>> {
        let path = Self::child_of(dir, name);
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::from_io(name, &e))?;
        if metadata.is_dir() {
            return Err(Error::not_found(name));
        }
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::from_io(name, &e))
    }

    async fn write_file(&self, dir: &DirectoryCapability, name: &str, data: &[u8]) -> Result<()> {
        let path = Self::child_of(dir, name);
        let to_error = |e: std::io::Error| match e.kind() {
            ErrorKind::PermissionDenied => Error::from_io(name, &e),
            _ => Error::write_failed(name, e),
        };

        let mut file = tokio::fs::File::create(&path).await.map_err(to_error)?;
        file.write_all(data).await.map_err(to_error)?;
        file.flush().await.map_err(to_error)?;
        file.sync_all().await.map_err(to_error)
    }

    async fn remove_file(&self, dir: &DirectoryCapability, name: &str) -> Result<()> {
        tokio::fs::remove_file(Self::child_of(dir, name))
            .await
            .map_err(|e| Error::from_io(name, &e))
    }

    async fn entries(&self, dir: &DirectoryCapability) -> Result<Vec<DirectoryEntry>> {
        let mut reader = tokio::fs::read_dir(Self::path_of(dir))
            .await
            .map_err(|e| Error::from_io(dir.name(), &e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| Error::from_io(dir.name(), &e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follow symlinks; dangling ones are skipped.
            let Ok(metadata) = tokio::fs::metadata(entry.path()).await else {
                debug!("skipping unreadable entry {name}", name: name.as_str());
                continue;
            };
            let kind = if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(DirectoryEntry::new(name, kind));
        }
        Ok(entries)
    }
}
