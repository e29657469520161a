// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The current/origin directory pair of one namespace.
//!
//! `current` is where file operations happen; `origin` is the first folder
//! ever chosen and the target of [`reset_to_origin`]. Both are persisted
//! through the namespace's [`RegistryScope`] whenever they change.
//!
//! Acquiring a folder may involve the user, so it is single-flight: the
//! first caller that finds no usable `current` starts one resolution and
//! every caller arriving while it runs awaits that same resolution and gets
//! its outcome, success or failure.
//!
//! [`reset_to_origin`]: DirectoryHandleCache::reset_to_origin

use crate::capability::{DirectoryCapability, NamespaceKey, Permission, Role, validate_entry_name};
use crate::error::{Error, Result};
use crate::host::DirectoryHost;
use crate::registry::RegistryScope;
use diagnostics::*;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

type Resolution = Shared<BoxFuture<'static, Result<DirectoryCapability>>>;

/// Lifecycle of a cache. `Loading` is only observable while the persisted
/// handles are being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Uninitialized,
    Loading,
    Empty,
    Bound,
}

struct Slots {
    state: CacheState,
    current: Option<DirectoryCapability>,
    origin: Option<DirectoryCapability>,
    resolution: Option<Resolution>,
}

impl Slots {
    fn bind(&mut self, current: DirectoryCapability) {
        self.current = Some(current);
        self.state = CacheState::Bound;
    }

    fn unbind(&mut self) {
        self.current = None;
        self.state = CacheState::Empty;
    }
}

enum Resolve {
    /// Run the interactive picker
    Pick,
    /// Ask the host to re-grant a capability that needs a prompt
    Regrant(DirectoryCapability),
}

struct CacheInner {
    registry: RegistryScope,
    host: Arc<dyn DirectoryHost>,
    loaded: OnceCell<()>,
    slots: Mutex<Slots>,
}

/// In-memory handle pair for one namespace, backed by the registry.
///
/// Clones share state.
#[derive(Clone)]
pub struct DirectoryHandleCache {
    inner: Arc<CacheInner>,
}

impl DirectoryHandleCache {
    #[must_use]
    pub fn new(registry: RegistryScope, host: Arc<dyn DirectoryHost>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                registry,
                host,
                loaded: OnceCell::new(),
                slots: Mutex::new(Slots {
                    state: CacheState::Uninitialized,
                    current: None,
                    origin: None,
                    resolution: None,
                }),
            }),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &NamespaceKey {
        self.inner.registry.key()
    }

    pub(crate) fn host(&self) -> &Arc<dyn DirectoryHost> {
        &self.inner.host
    }

    pub async fn state(&self) -> CacheState {
        self.inner.slots.lock().await.state
    }

    /// Load the persisted handles. Never prompts; repeated and concurrent
    /// calls share the first successful load.
    pub async fn initialize(&self) -> Result<()> {
        _ = self
            .inner
            .loaded
            .get_or_try_init(|| self.inner.load())
            .await?;
        Ok(())
    }

    /// The current handle, acquiring one through the host when absent.
    pub async fn ensure_current(&self) -> Result<DirectoryCapability> {
        self.initialize().await?;

        // One lock covers the check and the start, so two callers finding no
        // `current` cannot both open the picker.
        let current = {
            let mut slots = self.inner.slots.lock().await;
            if let Some(pending) = &slots.resolution {
                Err(pending.clone())
            } else if let Some(current) = &slots.current {
                Ok(current.clone())
            } else {
                Err(self.start(&mut slots, Resolve::Pick))
            }
        };
        let current = match current {
            Ok(current) => current,
            Err(resolution) => return resolution.await,
        };

        match self.inner.host.query_permission(&current).await? {
            Permission::Granted => Ok(current),
            Permission::Prompt => self.resolve(Resolve::Regrant(current)).await,
            Permission::Denied => {
                self.inner.unbind_denied(&current).await;
                Err(Error::permission_denied(current.name()))
            }
        }
    }

    /// Let the user choose a new folder even if one is bound.
    ///
    /// `origin` is only set when absent. Joins a resolution already in
    /// flight instead of opening a second picker.
    pub async fn select_folder(&self) -> Result<DirectoryCapability> {
        self.initialize().await?;
        self.resolve(Resolve::Pick).await
    }

    /// Point `current` back at `origin`.
    ///
    /// Without an origin there is nothing to reset to and this succeeds
    /// without changing anything.
    pub async fn reset_to_origin(&self) -> Result<()> {
        self.initialize().await?;
        let origin = self.inner.slots.lock().await.origin.clone();
        let Some(origin) = origin else {
            debug!(
                "reset in {namespace}: no origin, nothing to do",
                namespace: self.namespace().as_str()
            );
            return Ok(());
        };

        self.inner.registry.put(Role::Current, &origin).await?;
        self.inner.slots.lock().await.bind(origin);
        Ok(())
    }

    /// Create or open the subfolder `name` of `current` and make it current.
    pub async fn descend_into(&self, name: &str) -> Result<DirectoryCapability> {
        let name = validate_entry_name(name)?;
        let parent = self.ensure_current().await?;
        let child = self.inner.host.open_directory(&parent, name, true).await?;

        self.inner.registry.put(Role::Current, &child).await?;
        self.inner.slots.lock().await.bind(child.clone());
        debug!(
            "{namespace}: descended from {parent} into {child}",
            namespace: self.namespace().as_str(),
            parent: parent.name(),
            child: child.name()
        );
        Ok(child)
    }

    /// Name of the current folder, if any. Never prompts.
    pub async fn current_name(&self) -> Result<Option<String>> {
        Ok(self.current().await?.map(|dir| dir.name().to_string()))
    }

    pub async fn current(&self) -> Result<Option<DirectoryCapability>> {
        self.initialize().await?;
        Ok(self.inner.slots.lock().await.current.clone())
    }

    pub async fn origin(&self) -> Result<Option<DirectoryCapability>> {
        self.initialize().await?;
        Ok(self.inner.slots.lock().await.origin.clone())
    }

    pub async fn is_bound(&self) -> Result<bool> {
        Ok(self.current().await?.is_some())
    }

    /// Full reset: drop both handles and their persisted entries.
    pub async fn forget(&self) -> Result<()> {
        self.initialize().await?;
        self.inner.registry.remove(Role::Current).await?;
        self.inner.registry.remove(Role::Origin).await?;

        let mut slots = self.inner.slots.lock().await;
        slots.unbind();
        slots.origin = None;
        info!(
            "forgot folders of {namespace}",
            namespace: self.namespace().as_str()
        );
        Ok(())
    }

    /// Join the resolution in flight, or start one of `kind`.
    async fn resolve(&self, kind: Resolve) -> Result<DirectoryCapability> {
        let pending = {
            let mut slots = self.inner.slots.lock().await;
            if let Some(pending) = &slots.resolution {
                pending.clone()
            } else {
                // Another caller replaced or dropped the folder since it was
                // checked.
                if let Resolve::Regrant(dir) = &kind
                    && slots.current.as_ref() != Some(dir)
                {
                    return slots
                        .current
                        .clone()
                        .ok_or_else(|| Error::permission_denied(dir.name()));
                }
                self.start(&mut slots, kind)
            }
        };
        pending.await
    }

    /// Start a resolution of `kind`; the caller holds the slots lock.
    fn start(&self, slots: &mut Slots, kind: Resolve) -> Resolution {
        let started = CacheInner::run(self.inner.clone(), kind).boxed().shared();
        slots.resolution = Some(started.clone());
        started
    }
}

impl CacheInner {
    async fn load(&self) -> Result<()> {
        self.slots.lock().await.state = CacheState::Loading;

        let loaded = async {
            let current = self.registry.get(Role::Current).await?;
            let origin = self.registry.get(Role::Origin).await?;
            Ok::<_, Error>((current, origin))
        }
        .await;

        let mut slots = self.slots.lock().await;
        match loaded {
            Ok((current, origin)) => {
                slots.state = if current.is_some() {
                    CacheState::Bound
                } else {
                    CacheState::Empty
                };
                slots.current = current;
                slots.origin = origin;
                let state = format!("{:?}", slots.state);
                debug!(
                    "loaded {namespace}: {state}",
                    namespace: self.registry.key().as_str(),
                    state: state.as_str()
                );
                Ok(())
            }
            Err(e) => {
                slots.state = CacheState::Uninitialized;
                Err(e)
            }
        }
    }

    /// Body of a shared resolution. Clears itself from the slots when done.
    async fn run(inner: Arc<CacheInner>, kind: Resolve) -> Result<DirectoryCapability> {
        let outcome = match kind {
            Resolve::Pick => inner.pick().await,
            Resolve::Regrant(dir) => inner.regrant(dir).await,
        };
        inner.slots.lock().await.resolution = None;
        outcome
    }

    async fn pick(&self) -> Result<DirectoryCapability> {
        let namespace = self.registry.key().as_str();
        let chosen = match self.host.request_directory().await {
            Ok(Some(dir)) => dir,
            Ok(None) => {
                debug!("{namespace}: folder selection cancelled", namespace: namespace);
                return Err(Error::SelectionCancelled);
            }
            Err(e) => {
                let error = e.to_string();
                warn!(
                    "{namespace}: directory picker failed: {error}",
                    namespace: namespace,
                    error: error.as_str()
                );
                return Err(Error::SelectionCancelled);
            }
        };

        // Memory changes only once both roles are persisted. `current` is
        // written first and restored if the origin write fails, so the
        // registry never holds an origin nobody kept.
        let (first, previous) = {
            let slots = self.slots.lock().await;
            (slots.origin.is_none(), slots.current.clone())
        };
        self.registry.put(Role::Current, &chosen).await?;
        if first && let Err(e) = self.registry.put(Role::Origin, &chosen).await {
            self.restore_current(previous.as_ref()).await;
            return Err(e);
        }

        let mut slots = self.slots.lock().await;
        if first {
            slots.origin = Some(chosen.clone());
        }
        slots.bind(chosen.clone());
        info!(
            "{namespace}: selected folder {folder}",
            namespace: namespace,
            folder: chosen.name()
        );
        Ok(chosen)
    }

    /// Put the persisted `current` back to `previous` after a failed pick.
    async fn restore_current(&self, previous: Option<&DirectoryCapability>) {
        let restored = match previous {
            Some(dir) => self.registry.put(Role::Current, dir).await,
            None => self.registry.remove(Role::Current).await,
        };
        if let Err(e) = restored {
            let error = e.to_string();
            warn!(
                "{namespace}: could not restore current folder: {error}",
                namespace: self.registry.key().as_str(),
                error: error.as_str()
            );
        }
    }

    async fn regrant(&self, dir: DirectoryCapability) -> Result<DirectoryCapability> {
        match self.host.request_permission(&dir).await? {
            Permission::Granted => Ok(dir),
            Permission::Prompt | Permission::Denied => {
                self.unbind_denied(&dir).await;
                Err(Error::permission_denied(dir.name()))
            }
        }
    }

    /// Forget a denied `current` in memory only; the persisted record stays
    /// until something replaces it.
    async fn unbind_denied(&self, dir: &DirectoryCapability) {
        let mut slots = self.slots.lock().await;
        if slots.current.as_ref() == Some(dir) {
            slots.unbind();
        }
        warn!(
            "{namespace}: access to {folder} was denied",
            namespace: self.registry.key().as_str(),
            folder: dir.name()
        );
    }
}
