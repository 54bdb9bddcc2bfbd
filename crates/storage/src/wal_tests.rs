// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};
use ck_core::{InstanceId, Operation};

fn mark_sent(id: &str) -> Operation {
    Operation::MarkSent {
        instance: InstanceId::from(id),
        at: Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap(),
    }
}

#[test]
fn wal_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ops.wal");

    // Write operations
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&mark_sent("inst-1")).unwrap();
        wal.append(&mark_sent("inst-2")).unwrap();
    }

    // Read back
    let ops = Wal::replay(&path).unwrap();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0], mark_sent("inst-1"));
    assert_eq!(ops[1], mark_sent("inst-2"));
}

#[test]
fn wal_sequence_continues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ops.wal");

    // First session
    {
        let mut wal = Wal::open(&path).unwrap();
        assert_eq!(wal.sequence(), 0);
        wal.append(&mark_sent("inst-1")).unwrap();
        assert_eq!(wal.sequence(), 1);
    }

    // Second session picks up where the first left off
    {
        let mut wal = Wal::open(&path).unwrap();
        assert_eq!(wal.sequence(), 1);
        wal.append(&mark_sent("inst-2")).unwrap();
        assert_eq!(wal.sequence(), 2);
    }
}

#[test]
fn replay_of_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let ops = Wal::replay(&dir.path().join("absent.wal")).unwrap();
    assert!(ops.is_empty());
}

#[test]
fn torn_final_line_is_discarded_on_replay() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ops.wal");

    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&mark_sent("inst-1")).unwrap();
    }

    // Simulate a crash mid-append: a partial JSON line with no newline
    {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap();
        write!(file, "{{\"seq\":2,\"op\":{{\"op\":\"mark_s").unwrap();
    }

    let ops = Wal::replay(&path).unwrap();
    assert_eq!(ops.len(), 1);

    // Reopening truncates the torn tail; new appends then replay cleanly
    {
        let mut wal = Wal::open(&path).unwrap();
        assert_eq!(wal.sequence(), 1);
        wal.append(&mark_sent("inst-2")).unwrap();
    }
    let ops = Wal::replay(&path).unwrap();
    assert_eq!(ops, vec![mark_sent("inst-1"), mark_sent("inst-2")]);
}
