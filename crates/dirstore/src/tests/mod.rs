// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

mod namespace;
mod registry;

use crate::backend::MemoryBackend;
use crate::cache::DirectoryHandleCache;
use crate::capability::NamespaceKey;
use crate::memory::MemoryHost;
use crate::namespace::NamespaceManager;
use crate::registry::HandleRegistry;
use crate::store::ScopedFileStore;
use std::sync::Arc;

/// A memory backend and a memory host, plus a registry over the backend.
///
/// [`restart`](Fixture::restart) keeps the backend and the host but drops
/// every in-memory handle, like a new process over the same storage.
struct Fixture {
    backend: MemoryBackend,
    host: MemoryHost,
    registry: HandleRegistry,
}

impl Fixture {
    fn new() -> Self {
        Self::over(MemoryBackend::new(), MemoryHost::new())
    }

    fn over(backend: MemoryBackend, host: MemoryHost) -> Self {
        let registry = HandleRegistry::new(Arc::new(backend.clone()));
        Self {
            backend,
            host,
            registry,
        }
    }

    fn restart(&self) -> Self {
        Self::over(self.backend.clone(), self.host.clone())
    }

    fn cache(&self, key: &str) -> DirectoryHandleCache {
        DirectoryHandleCache::new(
            self.registry.scope(NamespaceKey::from(key)),
            Arc::new(self.host.clone()),
        )
    }

    fn store(&self, key: &str) -> ScopedFileStore {
        ScopedFileStore::new(self.cache(key))
    }

    fn manager(&self) -> NamespaceManager {
        NamespaceManager::new(self.registry.clone(), Arc::new(self.host.clone()))
    }
}
