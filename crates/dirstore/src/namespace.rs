// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::backend::FileBackend;
use crate::cache::DirectoryHandleCache;
use crate::capability::NamespaceKey;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::DirectoryHost;
use crate::registry::HandleRegistry;
use crate::store::ScopedFileStore;
use diagnostics::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One isolated [`ScopedFileStore`] per namespace key.
///
/// Stores are created on first use and live as long as the manager. The
/// manager also remembers which namespace its caller selected last, so a
/// text surface can run operations without repeating the key.
pub struct NamespaceManager {
    registry: HandleRegistry,
    host: Arc<dyn DirectoryHost>,
    stores: Mutex<HashMap<NamespaceKey, ScopedFileStore>>,
    selected: Mutex<Option<NamespaceKey>>,
}

impl NamespaceManager {
    #[must_use]
    pub fn new(registry: HandleRegistry, host: Arc<dyn DirectoryHost>) -> Self {
        Self {
            registry,
            host,
            stores: Mutex::new(HashMap::new()),
            selected: Mutex::new(None),
        }
    }

    /// A manager persisting into a [`FileBackend`] under the configured
    /// state directory. Must be called from within a tokio runtime.
    #[must_use]
    pub fn with_config(config: &Config, host: Arc<dyn DirectoryHost>) -> Self {
        let backend = FileBackend::open(config.registry_dir());
        Self::new(
            HandleRegistry::with_retry(Arc::new(backend), config.retry_policy()),
            host,
        )
    }

    /// The store for `key`, creating and initializing it on first use.
    pub async fn for_namespace<K: Into<NamespaceKey>>(&self, key: K) -> Result<ScopedFileStore> {
        let key = key.into();
        let store = {
            let mut stores = self.stores.lock().await;
            stores
                .entry(key.clone())
                .or_insert_with(|| {
                    debug!("creating store for namespace {namespace}", namespace: key.as_str());
                    let cache = DirectoryHandleCache::new(self.registry.scope(key.clone()), self.host.clone());
                    ScopedFileStore::new(cache)
                })
                .clone()
        };
        store.cache().initialize().await?;
        Ok(store)
    }

    /// Make `key` the selected namespace and return its store.
    pub async fn select<K: Into<NamespaceKey>>(&self, key: K) -> Result<ScopedFileStore> {
        let key = key.into();
        let store = self.for_namespace(key.clone()).await?;
        *self.selected.lock().await = Some(key);
        Ok(store)
    }

    /// The store of the selected namespace; `NamespaceNotSet` until
    /// [`select`](Self::select) has been called.
    pub async fn selected(&self) -> Result<ScopedFileStore> {
        let key = self.selected.lock().await.clone();
        match key {
            Some(key) => self.for_namespace(key).await,
            None => Err(Error::NamespaceNotSet),
        }
    }

    pub async fn selected_key(&self) -> Option<NamespaceKey> {
        self.selected.lock().await.clone()
    }

    /// Keys with a store in this manager, sorted
    pub async fn namespaces(&self) -> Vec<NamespaceKey> {
        let mut keys: Vec<_> = self.stores.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Keys with a folder persisted in the registry, including those of
    /// earlier runs, sorted
    pub async fn persisted_namespaces(&self) -> Result<Vec<NamespaceKey>> {
        self.registry.namespaces().await
    }

    /// Forget the folders of every namespace, persisted or in memory.
    ///
    /// Stores handed out earlier stay usable and prompt again on next use.
    pub async fn clear_all(&self) -> Result<()> {
        let stores: Vec<_> = self.stores.lock().await.values().cloned().collect();
        for store in &stores {
            store.forget().await?;
        }
        self.registry.clear().await?;
        info!("cleared all namespaces");
        Ok(())
    }
}
