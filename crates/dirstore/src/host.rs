// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::capability::{DirectoryCapability, DirectoryEntry, Permission};
use crate::error::Result;
use async_trait::async_trait;

/// The environment that issues directory capabilities and performs file
/// operations under them.
///
/// Names passed to the file methods are already validated as direct
/// children of `dir`.
#[async_trait]
pub trait DirectoryHost: Send + Sync {
    /// Run the interactive directory picker. `Ok(None)` means the user
    /// cancelled.
    async fn request_directory(&self) -> Result<Option<DirectoryCapability>>;

    /// Current permission state, without user interaction
    async fn query_permission(&self, dir: &DirectoryCapability) -> Result<Permission>;

    /// Ask the user to re-grant a capability that needs a prompt
    async fn request_permission(&self, dir: &DirectoryCapability) -> Result<Permission>;

    /// Open the child directory `name`, creating it when `create` is set
    async fn open_directory(
        &self,
        dir: &DirectoryCapability,
        name: &str,
        create: bool,
    ) -> Result<DirectoryCapability>;

    async fn read_file(&self, dir: &DirectoryCapability, name: &str) -> Result<Vec<u8>>;

    /// Create or truncate `name` and write `data`; returns once the write is
    /// durably closed.
    async fn write_file(&self, dir: &DirectoryCapability, name: &str, data: &[u8]) -> Result<()>;

    async fn remove_file(&self, dir: &DirectoryCapability, name: &str) -> Result<()>;

    /// Entries directly inside `dir`, in no particular order
    async fn entries(&self, dir: &DirectoryCapability) -> Result<Vec<DirectoryEntry>>;
}
