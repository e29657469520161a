// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Registry backends: the asynchronous databases a
//! [`HandleRegistry`](crate::HandleRegistry) persists capabilities into.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;
