// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Hostdir -- the local filesystem as a [`DirectoryHost`](crate::DirectoryHost)
//!
//! A capability is a canonical host path; its display name is the last path
//! component. Permission follows what the process can actually do with the
//! directory: a readable, writable directory is granted, anything else is
//! denied. There is no separate prompt state on a local filesystem.
//!
//! Choosing a directory is delegated to a [`PathPicker`], so a command line
//! front end can ask on a terminal while tests supply a fixed answer.

mod local;
mod picker;

pub use local::LocalHost;
pub use picker::{FixedPicker, PathPicker};
