// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Byte to hex text conversion for the text-only call boundary.

use crate::error::{Error, Result};

/// Lowercase hex, two characters per byte, no separators.
#[must_use]
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode hex text; either case is accepted.
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|e| match e {
        hex::FromHexError::OddLength => {
            Error::invalid_encoding(format!("odd length {}", text.len()))
        }
        hex::FromHexError::InvalidHexCharacter { c, index } => {
            Error::invalid_encoding(format!("invalid character {c:?} at {index}"))
        }
        other => Error::invalid_encoding(other.to_string()),
    })
}
