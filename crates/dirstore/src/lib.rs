// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Dirstore -- capability-scoped file storage
//!
//! A caller names a namespace and reads or writes files by name. Behind each
//! namespace sits a folder the user chose once through the host's directory
//! picker; the grant is persisted in the [`HandleRegistry`] so later runs
//! reuse it without asking again.
//!
//! Layering, bottom up:
//! - [`RegistryBackend`]: raw key-value persistence ([`MemoryBackend`],
//!   [`FileBackend`])
//! - [`HandleRegistry`]: namespaced capability records with not-ready retry
//! - [`DirectoryHandleCache`]: the current/origin pair of one namespace,
//!   single-flight folder acquisition
//! - [`ScopedFileStore`]: file operations against the current folder
//! - [`NamespaceManager`]: one store per namespace key
//!
//! [`DirectoryHost`] is the seam to whatever issues capabilities:
//! [`LocalHost`] for the local filesystem, [`MemoryHost`] for tests.

mod backend;
mod cache;
mod capability;
pub mod config;
mod error;
pub mod hexcodec;
mod host;
mod hostdir;
mod memory;
mod namespace;
mod registry;
mod store;

#[cfg(test)]
mod tests;

pub use backend::{FileBackend, MemoryBackend};
pub use cache::{CacheState, DirectoryHandleCache};
pub use capability::{
    DirectoryCapability, DirectoryEntry, EntryKind, NamespaceKey, Permission, Role,
    validate_entry_name,
};
pub use config::Config;
pub use error::{Error, Result};
pub use hexcodec::{bytes_to_hex, hex_to_bytes};
pub use host::DirectoryHost;
pub use hostdir::{FixedPicker, LocalHost, PathPicker};
pub use memory::{MemoryHost, PickerGate};
pub use namespace::NamespaceManager;
pub use registry::{
    BackendError, HandleRegistry, NamespaceHandle, RegistryBackend, RegistryScope, RetryPolicy,
    decode_record, encode_record,
};
pub use store::ScopedFileStore;
