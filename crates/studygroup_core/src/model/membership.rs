//! Group membership model.
//!
//! # Invariants
//! - `(group_id, user_id)` is unique.
//! - A user holds at most one membership per subject among active groups.
//! - Memberships are immutable once created.

use super::group::{GroupId, UserId};
use serde::{Deserialize, Serialize};

/// Role of a member inside a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Assigned by every join through the membership guard.
    #[default]
    Member,
    /// Only written by external administration tooling.
    Admin,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub group_id: GroupId,
    pub user_id: UserId,
    /// Epoch milliseconds; content before this instant never counts as unread.
    pub joined_at: i64,
    pub role: MemberRole,
}

impl Membership {
    pub fn new(group_id: GroupId, user_id: UserId, joined_at: i64) -> Self {
        Self {
            group_id,
            user_id,
            joined_at,
            role: MemberRole::Member,
        }
    }
}
