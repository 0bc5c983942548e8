//! Study group model.
//!
//! # Invariants
//! - `subject` is immutable after creation; membership rules key on it.
//! - `deleted_at` is the source of truth for tombstone state.

use super::{now_epoch_ms, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a study group.
pub type GroupId = Uuid;

/// Stable identifier of a user, issued by the identity service.
pub type UserId = Uuid;

/// Persisted study group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Category key the one-membership-per-subject rule is keyed on.
    pub subject: String,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: UserId,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Soft delete tombstone (epoch milliseconds).
    pub deleted_at: Option<i64>,
}

impl Group {
    /// Returns whether this group should be considered visible/active.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Insert payload for a group; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub subject: String,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: UserId,
}

impl NewGroup {
    pub fn new(
        subject: impl Into<String>,
        name: impl Into<String>,
        creator_id: UserId,
    ) -> Self {
        Self {
            subject: subject.into(),
            name: name.into(),
            description: None,
            creator_id,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validates the payload before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject.trim().is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyGroupName);
        }
        Ok(())
    }

    /// Materializes the persisted record with a fresh id stamped `now`.
    pub fn into_group(self) -> Group {
        Group {
            id: Uuid::new_v4(),
            subject: self.subject,
            name: self.name,
            description: self.description,
            creator_id: self.creator_id,
            created_at: now_epoch_ms(),
            deleted_at: None,
        }
    }
}
