// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod files;
pub mod folder;
pub mod registry;

pub use files::{list_command, load_command, remove_command, rename_command, save_command};
pub use folder::{
    cd_command, forget_command, is_set_command, pwd_command, reset_command, select_command,
};
pub use registry::{clear_all_command, namespaces_command};

use std::fmt;

/// What a command prints on stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Flag(bool),
}

impl Reply {
    /// Printed in place of a failed command's result
    #[must_use]
    pub fn fallback_for(text: bool) -> Self {
        if text {
            Reply::Text(String::new())
        } else {
            Reply::Flag(false)
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Text(text) => f.write_str(text),
            Reply::Flag(flag) => write!(f, "{flag}"),
        }
    }
}
