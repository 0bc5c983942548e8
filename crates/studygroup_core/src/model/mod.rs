//! Domain model for study groups, memberships and group content.
//!
//! # Responsibility
//! - Define canonical records shared by repositories and services.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Deletion is represented by `deleted_at` tombstones, never hard delete.
//! - Timestamps are Unix epoch milliseconds.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod group;
pub mod interest;
pub mod membership;
pub mod post;

/// Validation failures for records about to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptySubject,
    EmptyGroupName,
    EmptyPostTitle,
    EmptyPostContent,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySubject => write!(f, "group subject cannot be empty"),
            Self::EmptyGroupName => write!(f, "group name cannot be empty"),
            Self::EmptyPostTitle => write!(f, "post title cannot be empty"),
            Self::EmptyPostContent => write!(f, "post content cannot be empty"),
        }
    }
}

impl Error for ValidationError {}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}
