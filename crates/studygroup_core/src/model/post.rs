//! Group content (posts) and per-user view markers.

use super::group::{GroupId, UserId};
use super::{now_epoch_ms, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PostId = Uuid;

/// Content item belonging to exactly one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub group_id: GroupId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub deleted_at: Option<i64>,
}

impl Post {
    /// Creates a post stamped with the current time.
    pub fn new(
        group_id: GroupId,
        author_id: UserId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            author_id,
            title: title.into(),
            content: content.into(),
            created_at: now_epoch_ms(),
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyPostTitle);
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyPostContent);
        }
        Ok(())
    }
}

/// Marker that one user has seen one post. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub user_id: UserId,
    pub post_id: PostId,
    pub viewed_at: i64,
}
