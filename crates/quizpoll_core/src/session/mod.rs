//! Client reconciliation layer.
//!
//! # Responsibility
//! - Hold the session's cached aggregate and per-question answer state.
//! - Apply optimistic updates, then reconcile against the store's aggregate.
//! - Defer a vote until an identity is declared.
//! - Derive render-ready results (percentages, correctness feedback).

pub mod poll_session;
pub mod results;
