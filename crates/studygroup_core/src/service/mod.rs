//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into discovery, join and read-state use-cases.
//! - Keep callers decoupled from storage details; every service is generic
//!   over the repository traits it needs.

pub mod error;
pub mod interest_matcher;
pub mod membership_guard;
pub mod read_state;
pub mod recommender;
