// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable storage
//!
//! One JSON entry per line, fsynced per append. The commit point of every
//! state transition is the fully written line; a torn tail left by a
//! crash is truncated on the next open so the log never accumulates an
//! undecodable middle.

use ck_core::Operation;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write-ahead log for durable operation storage
pub struct Wal {
    file: File,
    sequence: u64,
}

impl Wal {
    /// Open or create a WAL at the given path, truncating any torn tail
    /// left by a crash mid-append
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        let (entries, valid_len) = Self::scan(&mut file)?;
        let total_len = file.seek(SeekFrom::End(0))?;
        if valid_len < total_len {
            file.set_len(valid_len)?;
            file.seek(SeekFrom::End(0))?;
        }

        Ok(Self {
            file,
            sequence: entries as u64,
        })
    }

    /// Append an operation to the log
    pub fn append(&mut self, op: &Operation) -> Result<u64, WalError> {
        self.sequence += 1;
        let entry = WalEntry {
            seq: self.sequence,
            op: op.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;
        Ok(self.sequence)
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replay all committed operations from the log
    ///
    /// Replay stops at the first undecodable or unterminated entry:
    /// everything before it was fsynced whole, anything after it never
    /// committed.
    pub fn replay(path: &Path) -> Result<Vec<Operation>, WalError> {
        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ops = Vec::new();
        for_each_committed(&mut file, |entry| ops.push(entry.op))?;
        Ok(ops)
    }

    /// Count committed entries and the byte length of the valid prefix
    fn scan(file: &mut File) -> Result<(usize, u64), WalError> {
        file.seek(SeekFrom::Start(0))?;
        let mut entries = 0;
        let valid_len = for_each_committed(file, |_| entries += 1)?;
        Ok((entries, valid_len))
    }
}

/// Walk the committed prefix of the log, returning its byte length
fn for_each_committed(
    file: &mut File,
    mut visit: impl FnMut(WalEntry),
) -> Result<u64, WalError> {
    let mut content = String::new();
    file.read_to_string(&mut content)?;

    let mut valid_len = 0u64;
    let mut offset = 0usize;

    while let Some(newline) = content[offset..].find('\n') {
        let line = &content[offset..offset + newline];
        offset += newline + 1;

        if line.is_empty() {
            valid_len = offset as u64;
            continue;
        }
        let Ok(entry) = serde_json::from_str::<WalEntry>(line) else {
            break;
        };
        visit(entry);
        valid_len = offset as u64;
    }

    Ok(valid_len)
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WalEntry {
    seq: u64,
    op: Operation,
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
