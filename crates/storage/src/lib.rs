// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ck-storage: the persistence gateway engine
//!
//! A write-ahead log of durable operations plus the materialized state
//! replayed from it. `Store` wires both behind one mutex and implements
//! the core gateway traits.

mod state;
mod store;
mod wal;

pub use state::State;
pub use store::{Store, StoreCounts};
pub use wal::{Wal, WalError};
