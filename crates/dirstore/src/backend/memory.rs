// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::registry::{BackendError, NamespaceHandle, RegistryBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory registry backend for testing and single-process use.
///
/// Clones share state, so a test can keep one clone to flip readiness or
/// inspect raw records while the registry owns another.
#[derive(Clone)]
pub struct MemoryBackend(Arc<Mutex<State>>);

struct State {
    ready: bool,
    failure: Option<String>,
    failing_key: Option<String>,
    spaces: HashMap<String, HashMap<String, Vec<u8>>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::with_ready(true)
    }
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that answers `NotReady` until [`set_ready`](Self::set_ready)
    #[must_use]
    pub fn opening() -> Self {
        Self::with_ready(false)
    }

    fn with_ready(ready: bool) -> Self {
        Self(Arc::new(Mutex::new(State {
            ready,
            failure: None,
            failing_key: None,
            spaces: HashMap::new(),
        })))
    }

    pub async fn set_ready(&self) {
        self.0.lock().await.ready = true;
    }

    /// Make every call fail with `Unavailable(reason)`, or recover with `None`
    pub async fn set_failure(&self, reason: Option<&str>) {
        self.0.lock().await.failure = reason.map(str::to_string);
    }

    /// Make writes of `key` in any namespace fail with `Unavailable`, or
    /// stop with `None`. Reads and other keys are unaffected.
    pub async fn fail_writes_to(&self, key: Option<&str>) {
        self.0.lock().await.failing_key = key.map(str::to_string);
    }

    /// Store bytes without going through the registry encoding
    pub async fn insert_raw(&self, namespace: &str, key: &str, value: Vec<u8>) {
        _ = self
            .0
            .lock()
            .await
            .spaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub async fn raw(&self, namespace: &str, key: &str) -> Option<Vec<u8>> {
        self.0
            .lock()
            .await
            .spaces
            .get(namespace)
            .and_then(|space| space.get(key))
            .cloned()
    }
}

impl State {
    fn check(&self) -> Result<(), BackendError> {
        if let Some(reason) = &self.failure {
            return Err(BackendError::unavailable(reason));
        }
        if !self.ready {
            return Err(BackendError::NotReady);
        }
        Ok(())
    }

    fn space(&mut self, ns: &NamespaceHandle) -> Result<&mut HashMap<String, Vec<u8>>, BackendError> {
        self.check()?;
        self.spaces
            .get_mut(ns.id())
            .ok_or_else(|| BackendError::unavailable(format!("namespace {} not open", ns.id())))
    }
}

#[async_trait]
impl RegistryBackend for MemoryBackend {
    async fn open_namespace(&self, name: &str) -> Result<NamespaceHandle, BackendError> {
        let mut state = self.0.lock().await;
        state.check()?;
        _ = state.spaces.entry(name.to_string()).or_default();
        Ok(NamespaceHandle::new(name))
    }

    async fn put(&self, ns: &NamespaceHandle, key: &str, value: Vec<u8>) -> Result<(), BackendError> {
        let mut state = self.0.lock().await;
        if state.failing_key.as_deref() == Some(key) {
            return Err(BackendError::unavailable(format!("write to {key} refused")));
        }
        _ = state.space(ns)?.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, ns: &NamespaceHandle, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.0.lock().await.space(ns)?.get(key).cloned())
    }

    async fn delete(&self, ns: &NamespaceHandle, key: &str) -> Result<(), BackendError> {
        _ = self.0.lock().await.space(ns)?.remove(key);
        Ok(())
    }

    async fn namespaces(&self) -> Result<Vec<String>, BackendError> {
        let state = self.0.lock().await;
        state.check()?;
        Ok(state
            .spaces
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn clear(&self) -> Result<(), BackendError> {
        let mut state = self.0.lock().await;
        state.check()?;
        // Keyspaces stay open; only their entries go.
        state.spaces.values_mut().for_each(HashMap::clear);
        Ok(())
    }
}
