// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Value types shared by the registry, the cache and the hosts.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque, revocable grant to one host directory.
///
/// Only the [`DirectoryHost`](crate::DirectoryHost) that issued a capability
/// interprets `identity`; the store compares and persists it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectoryCapability {
    identity: String,
    name: String,
}

impl DirectoryCapability {
    #[must_use]
    pub fn new<I: Into<String>, N: Into<String>>(identity: I, name: N) -> Self {
        Self {
            identity: identity.into(),
            name: name.into(),
        }
    }

    /// Host-defined identity
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Human-readable directory name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DirectoryCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.identity)
    }
}

/// Host-checked permission state of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    /// The host wants the user asked again before granting.
    Prompt,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry directly inside a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    #[must_use]
    pub fn new<S: Into<String>>(name: S, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Which handle of a namespace a persisted entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Current,
    Origin,
}

impl Role {
    /// Registry key for this role
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Role::Current => "current",
            Role::Origin => "origin",
        }
    }
}

/// Caller-chosen name of an isolated persistence scope.
///
/// The empty string is a valid key of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NamespaceKey(String);

impl NamespaceKey {
    #[must_use]
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NamespaceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for NamespaceKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Reject names that would address anything but a direct child.
pub fn validate_entry_name(name: &str) -> Result<&str> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(Error::invalid_name(name));
    }
    Ok(name)
}
