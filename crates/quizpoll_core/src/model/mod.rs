//! Domain model for polls, ballots and comments.
//!
//! # Responsibility
//! - Define the immutable question input consumed by the core.
//! - Define identity, aggregate and ballot value types shared by stores,
//!   services and the session layer.
//!
//! # Invariants
//! - Questions and options are never created or mutated by the core.
//! - Aggregate counts are non-negative.

pub mod comment;
pub mod question;
pub mod vote;
