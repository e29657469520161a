// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Memory-based directory host for testing and lightweight use
//!
//! Directories live in a map keyed by identity (`mem:<n>`), each holding its
//! files as byte vectors and its subdirectories by name. Nothing persists
//! beyond the value; clones share the same tree, so a test can keep one
//! clone to script the picker and inspect files while the store uses
//! another.
//!
//! The picker answers from a queue of scripted picks. With nothing queued
//! it creates a fresh root directory, like a user choosing a new folder.

use crate::capability::{DirectoryCapability, DirectoryEntry, EntryKind, Permission};
use crate::error::{Error, Result};
use crate::host::DirectoryHost;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

struct MemoryDirectory {
    name: String,
    permission: Permission,
    /// Answer to a re-grant request
    regrant: Permission,
    files: BTreeMap<String, Vec<u8>>,
    children: BTreeMap<String, String>,
}

impl MemoryDirectory {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            permission: Permission::Granted,
            regrant: Permission::Granted,
            files: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }
}

enum Pick {
    Answer(DirectoryCapability),
    Cancel,
    Fail(String),
}

#[derive(Default)]
struct HostState {
    directories: HashMap<String, MemoryDirectory>,
    next_id: u64,
    picks: VecDeque<Pick>,
    picker_calls: usize,
    gate: Option<watch::Receiver<bool>>,
    fail_removals: bool,
}

impl HostState {
    fn create(&mut self, name: &str) -> DirectoryCapability {
        self.next_id += 1;
        let identity = format!("mem:{}", self.next_id);
        _ = self
            .directories
            .insert(identity.clone(), MemoryDirectory::new(name));
        DirectoryCapability::new(identity, name)
    }

    /// The directory behind `dir`, if the capability is still honoured.
    /// Denials name the directory as the host knows it.
    fn granted(&mut self, dir: &DirectoryCapability) -> Result<&mut MemoryDirectory> {
        match self.directories.get_mut(dir.identity()) {
            Some(entry) if entry.permission == Permission::Granted => Ok(entry),
            Some(entry) => Err(Error::permission_denied(&entry.name)),
            None => Err(Error::permission_denied(dir.name())),
        }
    }
}

/// Holds the picker until [`release`](Self::release) is called or the gate
/// is dropped.
pub struct PickerGate(watch::Sender<bool>);

impl PickerGate {
    pub fn release(&self) {
        _ = self.0.send(true);
    }
}

/// Shareable in-memory [`DirectoryHost`].
#[derive(Clone, Default)]
pub struct MemoryHost {
    state: Arc<Mutex<HostState>>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A new top-level directory, as if the user had created it elsewhere.
    pub async fn create_root(&self, name: &str) -> DirectoryCapability {
        self.state.lock().await.create(name)
    }

    /// Queue `dir` as the answer to the next picker request.
    pub async fn answer_with(&self, dir: DirectoryCapability) {
        self.state.lock().await.picks.push_back(Pick::Answer(dir));
    }

    /// Queue a cancellation for the next picker request.
    pub async fn cancel_next(&self) {
        self.state.lock().await.picks.push_back(Pick::Cancel);
    }

    /// Queue a host failure for the next picker request.
    pub async fn fail_next(&self, reason: &str) {
        self.state
            .lock()
            .await
            .picks
            .push_back(Pick::Fail(reason.to_string()));
    }

    /// How many times the picker was opened
    pub async fn picker_calls(&self) -> usize {
        self.state.lock().await.picker_calls
    }

    /// Make picker requests wait on the returned gate.
    pub async fn hold_picker(&self) -> PickerGate {
        let (tx, rx) = watch::channel(false);
        self.state.lock().await.gate = Some(rx);
        PickerGate(tx)
    }

    pub async fn set_permission(&self, dir: &DirectoryCapability, permission: Permission) {
        if let Some(entry) = self.state.lock().await.directories.get_mut(dir.identity()) {
            entry.permission = permission;
        }
    }

    /// What a later re-grant request for `dir` will answer.
    pub async fn set_regrant(&self, dir: &DirectoryCapability, permission: Permission) {
        if let Some(entry) = self.state.lock().await.directories.get_mut(dir.identity()) {
            entry.regrant = permission;
        }
    }

    /// Make every file removal fail until switched off again.
    pub async fn fail_removals(&self, fail: bool) {
        self.state.lock().await.fail_removals = fail;
    }

    /// Contents of `name` in `dir`, bypassing permissions.
    pub async fn file(&self, dir: &DirectoryCapability, name: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .await
            .directories
            .get(dir.identity())
            .and_then(|entry| entry.files.get(name).cloned())
    }
}

#[async_trait]
impl DirectoryHost for MemoryHost {
    async fn request_directory(&self) -> Result<Option<DirectoryCapability>> {
        let gate = {
            let mut state = self.state.lock().await;
            state.picker_calls += 1;
            state.gate.clone()
        };
        if let Some(mut gate) = gate {
            // A dropped gate counts as released.
            _ = gate.wait_for(|open| *open).await;
        }

        let mut state = self.state.lock().await;
        match state.picks.pop_front() {
            Some(Pick::Answer(dir)) => Ok(Some(dir)),
            Some(Pick::Cancel) => Ok(None),
            Some(Pick::Fail(reason)) => Err(Error::unavailable(reason)),
            None => {
                let name = format!("folder-{}", state.next_id + 1);
                Ok(Some(state.create(&name)))
            }
        }
    }

    async fn query_permission(&self, dir: &DirectoryCapability) -> Result<Permission> {
        Ok(self
            .state
            .lock()
            .await
            .directories
            .get(dir.identity())
            .map_or(Permission::Denied, |entry| entry.permission))
    }

    async fn request_permission(&self, dir: &DirectoryCapability) -> Result<Permission> {
        let mut state = self.state.lock().await;
        let Some(entry) = state.directories.get_mut(dir.identity()) else {
            return Ok(Permission::Denied);
        };
        if entry.permission == Permission::Prompt {
            entry.permission = entry.regrant;
        }
        Ok(entry.permission)
    }

    async fn open_directory(
        &self,
        dir: &DirectoryCapability,
        name: &str,
        create: bool,
    ) -> Result<DirectoryCapability> {
        let mut state = self.state.lock().await;
        let parent = state.granted(dir)?;
        if let Some(identity) = parent.children.get(name) {
            return Ok(DirectoryCapability::new(identity.clone(), name));
        }
        if parent.files.contains_key(name) {
            return Err(Error::write_failed(name, "a file with this name exists"));
        }
        if !create {
            return Err(Error::not_found(name));
        }

        let child = state.create(name);
        _ = state
            .granted(dir)?
            .children
            .insert(name.to_string(), child.identity().to_string());
        Ok(child)
    }

    async fn read_file(&self, dir: &DirectoryCapability, name: &str) -> Result<Vec<u8>> {
        let mut state = self.state.lock().await;
        state
            .granted(dir)?
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(name))
    }

    async fn write_file(&self, dir: &DirectoryCapability, name: &str, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock().await;
        let entry = state.granted(dir)?;
        if entry.children.contains_key(name) {
            return Err(Error::write_failed(name, "is a directory"));
        }
        _ = entry.files.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn remove_file(&self, dir: &DirectoryCapability, name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.fail_removals {
            return Err(Error::write_failed(name, "removal refused"));
        }
        state
            .granted(dir)?
            .files
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(name))
    }

    async fn entries(&self, dir: &DirectoryCapability) -> Result<Vec<DirectoryEntry>> {
        let mut state = self.state.lock().await;
        let entry = state.granted(dir)?;
        let files = entry
            .files
            .keys()
            .map(|name| DirectoryEntry::new(name.clone(), EntryKind::File));
        let dirs = entry
            .children
            .keys()
            .map(|name| DirectoryEntry::new(name.clone(), EntryKind::Directory));
        Ok(files.chain(dirs).collect())
    }
}
