// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mj-storage: Persistence gateway for the MaveJobs worker runtime
//!
//! The [`Session`] is the unit of work the managers mutate through: writes
//! are staged, `flush` publishes them to sibling reads, and `commit` makes
//! flushed changes durable by appending to the commit [`Journal`] and
//! swapping the committed baseline. The session itself never commits; that
//! responsibility belongs to the dispatch decorator.

pub mod journal;
pub mod session;
pub mod state;

pub use journal::{Journal, JournalError, JournalRecord};
pub use session::{Session, StateWrite, StoreError};
pub use state::WorkerState;
