// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::registry::{BackendError, NamespaceHandle, RegistryBackend};
use async_trait::async_trait;
use diagnostics::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, watch};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Opening {
    Pending,
    Ready,
    Failed(String),
}

/// One JSON document per namespace. Values are hex so the document stays
/// readable text whatever the registry stores. The file name only carries a
/// digest, so `namespace` is the authoritative key.
#[derive(Debug, Default, Serialize, Deserialize)]
struct NamespaceDocument {
    namespace: String,
    entries: BTreeMap<String, String>,
}

/// Registry backend persisting each namespace as a JSON file under a state
/// directory.
///
/// The directory is prepared by a background task started in
/// [`open`](Self::open); until it finishes every call reports `NotReady`.
pub struct FileBackend {
    root: PathBuf,
    opening: watch::Receiver<Opening>,
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Start opening a backend rooted at `root`. Must be called from within
    /// a tokio runtime.
    #[must_use]
    pub fn open(root: PathBuf) -> Self {
        let (tx, rx) = watch::channel(Opening::Pending);
        let dir = root.clone();
        drop(tokio::spawn(async move {
            let state = match tokio::fs::create_dir_all(&dir).await {
                Ok(()) => Opening::Ready,
                Err(e) => Opening::Failed(format!("{}: {}", dir.display(), e)),
            };
            let path = dir.display().to_string();
            let outcome = format!("{state:?}");
            debug!("file registry at {path} opened: {outcome}", path: path.as_str(), outcome: outcome.as_str());
            _ = tx.send(state);
        }));

        Self {
            root,
            opening: rx,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait for the background open to finish.
    pub async fn ready(&self) -> Result<(), BackendError> {
        let mut rx = self.opening.clone();
        loop {
            match self.check() {
                Err(BackendError::NotReady) => {
                    if rx.changed().await.is_err() {
                        // Sender dropped; whatever it last sent is final.
                        return self.check();
                    }
                }
                other => return other,
            }
        }
    }

    fn check(&self) -> Result<(), BackendError> {
        match &*self.opening.borrow() {
            Opening::Pending => Err(BackendError::NotReady),
            Opening::Ready => Ok(()),
            Opening::Failed(reason) => Err(BackendError::unavailable(reason)),
        }
    }

    fn document_path(&self, ns: &NamespaceHandle) -> PathBuf {
        let digest = Sha256::digest(namespace_name(ns).as_bytes());
        self.root.join(format!("ns-{}.json", hex::encode(digest)))
    }

    /// Paths of every namespace document under the root
    async fn documents(&self) -> Result<Vec<PathBuf>, BackendError> {
        let unavailable = |e: std::io::Error| BackendError::unavailable(format!("{}: {}", self.root.display(), e));
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(unavailable)?;
        let mut paths = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(unavailable)? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("ns-") && name.ends_with(".json") {
                paths.push(entry.path());
            }
        }
        Ok(paths)
    }

    async fn read_document(&self, path: &Path) -> Result<NamespaceDocument, BackendError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(NamespaceDocument::default());
            }
            Err(e) => {
                return Err(BackendError::unavailable(format!("{}: {}", path.display(), e)));
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                let shown = path.display().to_string();
                let error = e.to_string();
                warn!(
                    "unreadable registry document {path}: {error}",
                    path: shown.as_str(),
                    error: error.as_str()
                );
                Ok(NamespaceDocument::default())
            }
        }
    }

    async fn load(&self, ns: &NamespaceHandle) -> Result<NamespaceDocument, BackendError> {
        let path = self.document_path(ns);
        let doc = self.read_document(&path).await?;
        let name = namespace_name(ns);
        if !doc.entries.is_empty() && doc.namespace != name {
            let shown = path.display().to_string();
            warn!(
                "registry document {path} belongs to {found}, not {namespace}",
                path: shown.as_str(),
                found: doc.namespace.as_str(),
                namespace: name.as_str()
            );
            return Ok(NamespaceDocument::default());
        }
        Ok(doc)
    }

    async fn store(&self, ns: &NamespaceHandle, doc: &NamespaceDocument) -> Result<(), BackendError> {
        let path = self.document_path(ns);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(doc).map_err(BackendError::unavailable)?;
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| BackendError::unavailable(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| BackendError::unavailable(format!("{}: {}", path.display(), e)))
    }

    async fn update<F>(&self, ns: &NamespaceHandle, change: F) -> Result<(), BackendError>
    where
        F: FnOnce(&mut NamespaceDocument) + Send,
    {
        self.check()?;
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load(ns).await?;
        change(&mut doc);
        self.store(ns, &doc).await
    }
}

#[async_trait]
impl RegistryBackend for FileBackend {
    async fn open_namespace(&self, name: &str) -> Result<NamespaceHandle, BackendError> {
        self.check()?;
        Ok(NamespaceHandle::new(hex::encode(name)))
    }

    async fn put(&self, ns: &NamespaceHandle, key: &str, value: Vec<u8>) -> Result<(), BackendError> {
        let namespace = namespace_name(ns);
        self.update(ns, move |doc| {
            doc.namespace = namespace;
            _ = doc.entries.insert(key.to_string(), hex::encode(value));
        })
        .await
    }

    async fn get(&self, ns: &NamespaceHandle, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        self.check()?;
        let doc = self.load(ns).await?;
        // Undecodable hex is passed through raw; the registry then treats
        // it as a corrupt record.
        Ok(doc
            .entries
            .get(key)
            .map(|value| hex::decode(value).unwrap_or_else(|_| value.clone().into_bytes())))
    }

    async fn delete(&self, ns: &NamespaceHandle, key: &str) -> Result<(), BackendError> {
        self.update(ns, |doc| {
            _ = doc.entries.remove(key);
        })
        .await
    }

    async fn namespaces(&self) -> Result<Vec<String>, BackendError> {
        self.check()?;
        let mut names = Vec::new();
        for path in self.documents().await? {
            let doc = self.read_document(&path).await?;
            if !doc.entries.is_empty() {
                names.push(doc.namespace);
            }
        }
        Ok(names)
    }

    async fn clear(&self) -> Result<(), BackendError> {
        self.check()?;
        let _guard = self.write_lock.lock().await;
        for path in self.documents().await? {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(BackendError::unavailable(format!("{}: {}", path.display(), e)));
                }
            }
        }
        Ok(())
    }
}

/// The namespace a handle was opened for; handle ids are the hex of the name.
fn namespace_name(ns: &NamespaceHandle) -> String {
    hex::decode(ns.id())
        .ok()
        .and_then(|raw| String::from_utf8(raw).ok())
        .unwrap_or_default()
}
