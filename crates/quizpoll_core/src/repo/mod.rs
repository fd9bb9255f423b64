//! Store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the `PollStore` contract used by services and sessions.
//! - Isolate SQLite query details from vote orchestration.
//! - Provide an in-memory store for tests and single-process embedding.
//!
//! # Invariants
//! - Per-option count changes are single atomic operations.
//! - Ballot replacement is atomic per (voter, question).
//! - Counts read from storage are never negative.

pub mod comment_repo;
pub mod memory_store;
pub mod poll_store;
