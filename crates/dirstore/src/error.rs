// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the store and its collaborators.
///
/// `Clone` is required: one in-flight folder resolution hands the same
/// outcome to every caller that joined it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The user dismissed the directory picker, or the host refused it.
    #[error("Folder selection cancelled")]
    SelectionCancelled,

    /// The host no longer grants access to a previously chosen directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Write failed for '{name}': {reason}")]
    WriteFailed { name: String, reason: String },

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("No namespace selected")]
    NamespaceNotSet,

    #[error("Invalid entry name: '{0}'")]
    InvalidName(String),

    /// The handle registry backend could not be reached.
    #[error("Registry unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn permission_denied<S: AsRef<str>>(what: S) -> Self {
        Error::PermissionDenied(what.as_ref().into())
    }

    pub fn not_found<S: AsRef<str>>(name: S) -> Self {
        Error::NotFound(name.as_ref().into())
    }

    pub fn write_failed<S: AsRef<str>, E: std::fmt::Display>(name: S, reason: E) -> Self {
        Error::WriteFailed {
            name: name.as_ref().into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_encoding<S: AsRef<str>>(detail: S) -> Self {
        Error::InvalidEncoding(detail.as_ref().into())
    }

    pub fn invalid_name<S: AsRef<str>>(name: S) -> Self {
        Error::InvalidName(name.as_ref().into())
    }

    pub fn unavailable<E: std::fmt::Display>(reason: E) -> Self {
        Error::Unavailable(reason.to_string())
    }

    /// Map a host I/O error on `name` into the store taxonomy.
    ///
    /// `NotFound` and `PermissionDenied` keep their meaning; anything else
    /// counts as a failed write.
    pub fn from_io<S: AsRef<str>>(name: S, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::not_found(name),
            std::io::ErrorKind::PermissionDenied => {
                Error::permission_denied(format!("{}: {}", name.as_ref(), err))
            }
            _ => Error::write_failed(name, err),
        }
    }

    /// Caller bugs are not worth retrying; everything else may succeed
    /// on a later attempt.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Error::InvalidEncoding(_) | Error::NamespaceNotSet | Error::InvalidName(_) | Error::Config(_)
        )
    }
}
