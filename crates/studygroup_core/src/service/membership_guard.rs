//! Join arbitration and the one-group-per-subject rule.
//!
//! # Responsibility
//! - Validate join requests against current store state.
//! - Translate store uniqueness collisions into join outcomes.
//!
//! # Invariants
//! - A user holds at most one membership among active groups of a subject.
//! - Joining a group twice yields one row; the second call reports
//!   `JoinStatus::AlreadyMember`.
//! - The subject check is read-then-write. The SQLite store closes the race
//!   with a unique `(user_id, subject)` index; stores without an equivalent
//!   constraint can admit two concurrent joins into one subject.

use crate::model::group::{Group, GroupId, UserId};
use crate::model::membership::{MemberRole, Membership};
use crate::model::now_epoch_ms;
use crate::repo::group_repo::GroupRepository;
use crate::repo::membership_repo::MembershipRepository;
use crate::repo::{ConflictKind, RepoError};
use crate::service::error::{CoreError, CoreResult};
use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStatus {
    Joined,
    AlreadyMember,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinOutcome {
    pub membership: Membership,
    pub status: JoinStatus,
}

/// One entry of a user's "my groups" listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MyGroup {
    pub group: Group,
    pub joined_at: i64,
    pub role: MemberRole,
}

pub struct MembershipGuard<S>
where
    S: GroupRepository + MembershipRepository,
{
    store: S,
}

impl<S> MembershipGuard<S>
where
    S: GroupRepository + MembershipRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds `user_id` to `group_id`.
    ///
    /// # Errors
    /// - `NotFound` when the group is missing or soft-deleted.
    /// - `SubjectConflict` when the user belongs to another active group of
    ///   the same subject.
    /// - `Unavailable` when the store fails.
    pub fn join(&self, user_id: UserId, group_id: GroupId) -> CoreResult<JoinOutcome> {
        let result = self.join_inner(user_id, group_id);
        match &result {
            Ok(outcome) => info!(
                "event=group_join module=membership status=ok user_id={user_id} group_id={group_id} outcome={}",
                match outcome.status {
                    JoinStatus::Joined => "joined",
                    JoinStatus::AlreadyMember => "already_member",
                }
            ),
            Err(err) => warn!(
                "event=group_join module=membership status=rejected user_id={user_id} group_id={group_id} error_code={}",
                err.code()
            ),
        }
        result
    }

    /// Lists the user's memberships in active groups, oldest join first.
    pub fn my_groups(&self, user_id: UserId) -> CoreResult<Vec<MyGroup>> {
        let memberships = self.store.list_memberships_for_user(user_id)?;
        let mut groups = Vec::with_capacity(memberships.len());
        for membership in memberships {
            // A group deleted between the two reads is simply skipped.
            if let Some(group) = self.store.get_group(membership.group_id, false)? {
                groups.push(MyGroup {
                    group,
                    joined_at: membership.joined_at,
                    role: membership.role,
                });
            }
        }
        Ok(groups)
    }

    fn join_inner(&self, user_id: UserId, group_id: GroupId) -> CoreResult<JoinOutcome> {
        let group = self
            .store
            .get_group(group_id, false)?
            .ok_or(CoreError::NotFound {
                entity: "group",
                id: group_id,
            })?;

        if self
            .store
            .find_subject_membership(user_id, &group.subject, group.id)?
            .is_some()
        {
            return Err(CoreError::SubjectConflict {
                subject: group.subject,
            });
        }

        if let Some(existing) = self.store.get_membership(group_id, user_id)? {
            return Ok(JoinOutcome {
                membership: existing,
                status: JoinStatus::AlreadyMember,
            });
        }

        let membership = Membership::new(group_id, user_id, now_epoch_ms());
        match self.store.insert_membership(&membership) {
            Ok(()) => Ok(JoinOutcome {
                membership,
                status: JoinStatus::Joined,
            }),
            Err(RepoError::Conflict(ConflictKind::DuplicateMembership)) => {
                // Lost a race against an identical join.
                let existing = self.store.get_membership(group_id, user_id)?.ok_or(
                    CoreError::Conflict(ConflictKind::DuplicateMembership),
                )?;
                Ok(JoinOutcome {
                    membership: existing,
                    status: JoinStatus::AlreadyMember,
                })
            }
            Err(RepoError::Conflict(ConflictKind::SubjectMembership)) => {
                Err(CoreError::SubjectConflict {
                    subject: group.subject,
                })
            }
            Err(other) => Err(other.into()),
        }
    }
}
