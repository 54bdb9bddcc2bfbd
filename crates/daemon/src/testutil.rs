// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for daemon tests

use crate::lifecycle::Config;
use std::path::Path;
use std::sync::Mutex;

/// Serializes tests that touch the process-wide environment
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Point state and socket dirs at a scratch directory and build a Config
/// for the given instance root. Callers must hold `ENV_LOCK`.
pub fn scratch_config(root: &Path, scratch: &Path) -> Config {
    std::env::set_var("XDG_STATE_HOME", scratch.join("state"));
    std::env::set_var("CK_SOCKET_DIR", scratch.join("sock"));
    Config::for_root(root).unwrap_or_else(|e| panic!("config for root failed: {}", e))
}

pub const TEST_CATALOG: &str = r#"
[[package]]
id = "course-30"
name = "1 month"
duration_days = 30

  [[package.question]]
  id = "q-mood"
  text = "How are you feeling today?"
  kind = "yes_no"
  interval_days = 1
"#;
