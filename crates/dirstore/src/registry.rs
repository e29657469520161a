// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Durable, namespaced storage of directory capabilities.
//!
//! `HandleRegistry` sits on top of any [`RegistryBackend`]: a small async
//! key-value database with one keyspace per namespace. Backends may still be
//! initializing when the first calls arrive; those calls are retried after a
//! fixed delay until the backend is ready or the retry budget runs out.

use crate::capability::{DirectoryCapability, NamespaceKey, Role};
use crate::error::{Error, Result};
use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use diagnostics::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Failures reported by a registry backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend is still opening; the call may be retried.
    #[error("backend not ready")]
    NotReady,

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn unavailable<E: std::fmt::Display>(reason: E) -> Self {
        BackendError::Unavailable(reason.to_string())
    }
}

/// Backend-issued handle to one namespace keyspace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceHandle(String);

impl NamespaceHandle {
    #[must_use]
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Pure persistence backend - no caching, no retries
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    async fn open_namespace(&self, name: &str) -> std::result::Result<NamespaceHandle, BackendError>;

    async fn put(
        &self,
        ns: &NamespaceHandle,
        key: &str,
        value: Vec<u8>,
    ) -> std::result::Result<(), BackendError>;

    async fn get(
        &self,
        ns: &NamespaceHandle,
        key: &str,
    ) -> std::result::Result<Option<Vec<u8>>, BackendError>;

    async fn delete(&self, ns: &NamespaceHandle, key: &str) -> std::result::Result<(), BackendError>;

    /// Names of the namespaces holding at least one entry, in no order
    async fn namespaces(&self) -> std::result::Result<Vec<String>, BackendError>;

    /// Delete every entry of every namespace. Open handles stay usable.
    async fn clear(&self) -> std::result::Result<(), BackendError>;
}

const RECORD_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PersistedRecord {
    version: u32,
    capability: DirectoryCapability,
}

/// Serialize a capability the way the registry stores it
pub fn encode_record(capability: &DirectoryCapability) -> Result<Vec<u8>> {
    serde_json::to_vec(&PersistedRecord {
        version: RECORD_VERSION,
        capability: capability.clone(),
    })
    .map_err(Error::unavailable)
}

/// Decode a stored record; `Err` describes why it is unusable.
pub fn decode_record(bytes: &[u8]) -> std::result::Result<DirectoryCapability, String> {
    let record: PersistedRecord = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    if record.version != RECORD_VERSION {
        return Err(format!("unsupported record version {}", record.version));
    }
    Ok(record.capability)
}

/// Fixed-delay retry budget for calls that find the backend not ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_retries: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            max_retries: 100,
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(self.max_retries)
    }
}

struct RegistryInner {
    backend: Arc<dyn RegistryBackend>,
    retry: RetryPolicy,
    handles: Mutex<HashMap<NamespaceKey, NamespaceHandle>>,
}

/// Namespaced capability store over a [`RegistryBackend`].
#[derive(Clone)]
pub struct HandleRegistry {
    inner: Arc<RegistryInner>,
}

impl HandleRegistry {
    #[must_use]
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        Self::with_retry(backend, RetryPolicy::default())
    }

    #[must_use]
    pub fn with_retry(backend: Arc<dyn RegistryBackend>, retry: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                backend,
                retry,
                handles: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// A view of this registry that can only address `key`
    #[must_use]
    pub fn scope(&self, key: NamespaceKey) -> RegistryScope {
        RegistryScope {
            registry: self.clone(),
            key,
        }
    }

    /// Store `capability` under `(key, role)`, replacing any prior value.
    pub async fn put(
        &self,
        key: &NamespaceKey,
        role: Role,
        capability: &DirectoryCapability,
    ) -> Result<()> {
        let handle = self.handle(key).await?;
        let value = encode_record(capability)?;
        let backend = &self.inner.backend;
        let handle = &handle;
        self.retrying("put", || {
            let value = value.clone();
            async move { backend.put(handle, role.key(), value).await }
        })
        .await?;
        debug!(
            "registry put {namespace}/{role} = {identity}",
            namespace: key.as_str(),
            role: role.key(),
            identity: capability.identity()
        );
        Ok(())
    }

    /// Read `(key, role)`.
    ///
    /// A record that cannot be decoded is logged and reported as absent.
    pub async fn get(&self, key: &NamespaceKey, role: Role) -> Result<Option<DirectoryCapability>> {
        let handle = self.handle(key).await?;
        let backend = &self.inner.backend;
        let handle = &handle;
        let raw = self
            .retrying("get", || async move { backend.get(handle, role.key()).await })
            .await?;

        let Some(bytes) = raw else {
            return Ok(None);
        };
        match decode_record(&bytes) {
            Ok(capability) => Ok(Some(capability)),
            Err(reason) => {
                warn!(
                    "ignoring corrupt registry record {namespace}/{role}: {reason}",
                    namespace: key.as_str(),
                    role: role.key(),
                    reason: reason.as_str()
                );
                Ok(None)
            }
        }
    }

    /// Delete `(key, role)`; deleting an absent entry succeeds.
    pub async fn remove(&self, key: &NamespaceKey, role: Role) -> Result<()> {
        let handle = self.handle(key).await?;
        let backend = &self.inner.backend;
        let handle = &handle;
        self.retrying("delete", || async move { backend.delete(handle, role.key()).await })
            .await
    }

    /// Keys of every namespace with a persisted entry, sorted.
    ///
    /// Unlike [`NamespaceManager::namespaces`](crate::NamespaceManager::namespaces)
    /// this includes namespaces written by earlier runs.
    pub async fn namespaces(&self) -> Result<Vec<NamespaceKey>> {
        let backend = &self.inner.backend;
        let names = self
            .retrying("list", || async move { backend.namespaces().await })
            .await?;
        let mut keys: Vec<NamespaceKey> = names.into_iter().map(NamespaceKey::from).collect();
        keys.sort();
        Ok(keys)
    }

    /// Delete every persisted entry of every namespace.
    pub async fn clear(&self) -> Result<()> {
        let backend = &self.inner.backend;
        self.retrying("clear", || async move { backend.clear().await })
            .await?;
        info!("registry cleared");
        Ok(())
    }

    async fn handle(&self, key: &NamespaceKey) -> Result<NamespaceHandle> {
        if let Some(handle) = self.inner.handles.lock().await.get(key) {
            return Ok(handle.clone());
        }

        let backend = &self.inner.backend;
        let handle = self
            .retrying("open", || async move { backend.open_namespace(key.as_str()).await })
            .await?;
        debug!(
            "registry opened namespace {namespace} as {handle}",
            namespace: key.as_str(),
            handle: handle.id()
        );

        _ = self
            .inner
            .handles
            .lock()
            .await
            .insert(key.clone(), handle.clone());
        Ok(handle)
    }

    /// Run one backend call, retrying while the backend reports `NotReady`.
    async fn retrying<T, F, Fut>(&self, op: &'static str, call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, BackendError>>,
    {
        let retry = self.inner.retry;
        call.retry(retry.backoff())
            .sleep(tokio::time::sleep)
            .when(|e: &BackendError| *e == BackendError::NotReady)
            .notify(|_: &BackendError, delay: Duration| {
                debug!(
                    "registry {op} waiting {delay_ms}ms for backend",
                    op: op,
                    delay_ms: delay.as_millis() as u64
                );
            })
            .await
            .map_err(|e| match e {
                BackendError::NotReady => Error::unavailable(format!(
                    "backend still not ready after {} retries",
                    retry.max_retries
                )),
                BackendError::Unavailable(reason) => Error::Unavailable(reason),
            })
    }
}

/// A [`HandleRegistry`] bound to one namespace.
#[derive(Clone)]
pub struct RegistryScope {
    registry: HandleRegistry,
    key: NamespaceKey,
}

impl RegistryScope {
    #[must_use]
    pub fn key(&self) -> &NamespaceKey {
        &self.key
    }

    pub async fn put(&self, role: Role, capability: &DirectoryCapability) -> Result<()> {
        self.registry.put(&self.key, role, capability).await
    }

    pub async fn get(&self, role: Role) -> Result<Option<DirectoryCapability>> {
        self.registry.get(&self.key, role).await
    }

    pub async fn remove(&self, role: Role) -> Result<()> {
        self.registry.remove(&self.key, role).await
    }
}
