//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into identity, seeding, voting and comment
//!   use-cases.
//! - Keep sessions and the CLI decoupled from storage details.

pub mod comment_service;
pub mod seeding;
pub mod vote_service;
