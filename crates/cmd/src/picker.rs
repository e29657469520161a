// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use dirstore::{Error, PathPicker};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Asks for a directory on the terminal: prompt on stderr, answer on stdin.
/// An empty answer or end of input cancels.
pub struct PromptPicker;

#[async_trait]
impl PathPicker for PromptPicker {
    async fn pick(&self) -> dirstore::Result<Option<PathBuf>> {
        let mut stderr = tokio::io::stderr();
        stderr
            .write_all(b"Choose a folder: ")
            .await
            .map_err(|e| Error::from_io("stderr", &e))?;
        stderr
            .flush()
            .await
            .map_err(|e| Error::from_io("stderr", &e))?;

        let mut line = String::new();
        _ = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| Error::from_io("stdin", &e))?;

        Ok(parse_answer(&line))
    }
}

fn parse_answer(line: &str) -> Option<PathBuf> {
    let answer = line.trim();
    (!answer.is_empty()).then(|| PathBuf::from(answer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("/music\n"), Some(PathBuf::from("/music")));
        assert_eq!(parse_answer("  \n"), None);
        assert_eq!(parse_answer(""), None);
    }
}
