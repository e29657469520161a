// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Interactive choice of a host directory.
#[async_trait]
pub trait PathPicker: Send + Sync {
    /// `Ok(None)` when the user declined to choose.
    async fn pick(&self) -> Result<Option<PathBuf>>;
}

/// Always answers with the same path, or always cancels.
#[derive(Debug, Clone, Default)]
pub struct FixedPicker(Option<PathBuf>);

impl FixedPicker {
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self(path)
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self(None)
    }
}

#[async_trait]
impl PathPicker for FixedPicker {
    async fn pick(&self) -> Result<Option<PathBuf>> {
        Ok(self.0.clone())
    }
}
