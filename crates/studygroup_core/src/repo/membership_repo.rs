//! Membership repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Point lookups and scans over `group_members`.
//! - Atomic membership insert that classifies uniqueness collisions and
//!   refuses soft-deleted groups.
//!
//! # Invariants
//! - `(group_id, user_id)` is the primary key.
//! - `(user_id, subject)` is unique; `subject` is NULL once the group is
//!   soft-deleted, so only active groups occupy a subject slot.

use crate::model::group::{GroupId, UserId};
use crate::model::membership::{MemberRole, Membership};
use crate::repo::sqlite_store::{constraint_failure, parse_uuid, ConstraintFailure, SqliteStore};
use crate::repo::{ConflictKind, RepoError, RepoResult};
use rusqlite::{params, Row};

const MEMBERSHIP_SELECT_SQL: &str = "SELECT
    m.group_id,
    m.user_id,
    m.joined_at,
    m.role
FROM group_members m
INNER JOIN groups g ON g.id = m.group_id";

pub trait MembershipRepository {
    fn get_membership(&self, group_id: GroupId, user_id: UserId)
        -> RepoResult<Option<Membership>>;
    /// Memberships of one user in active groups, oldest join first.
    fn list_memberships_for_user(&self, user_id: UserId) -> RepoResult<Vec<Membership>>;
    /// Current members of one group, oldest join first.
    fn list_memberships_for_group(&self, group_id: GroupId) -> RepoResult<Vec<Membership>>;
    fn count_members(&self, group_id: GroupId) -> RepoResult<u32>;
    /// Finds a membership of `user_id` in an active group with exactly
    /// `subject`, other than `excluding`.
    fn find_subject_membership(
        &self,
        user_id: UserId,
        subject: &str,
        excluding: GroupId,
    ) -> RepoResult<Option<Membership>>;
    /// Inserts one membership, copying the subject from the group row in
    /// the same statement.
    ///
    /// # Errors
    /// - `RepoError::Conflict` when either uniqueness rule rejects the row.
    /// - `RepoError::NotFound` when the group is missing or soft-deleted at
    ///   write time.
    fn insert_membership(&self, membership: &Membership) -> RepoResult<()>;
}

impl<T: MembershipRepository + ?Sized> MembershipRepository for &T {
    fn get_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> RepoResult<Option<Membership>> {
        (**self).get_membership(group_id, user_id)
    }

    fn list_memberships_for_user(&self, user_id: UserId) -> RepoResult<Vec<Membership>> {
        (**self).list_memberships_for_user(user_id)
    }

    fn list_memberships_for_group(&self, group_id: GroupId) -> RepoResult<Vec<Membership>> {
        (**self).list_memberships_for_group(group_id)
    }

    fn count_members(&self, group_id: GroupId) -> RepoResult<u32> {
        (**self).count_members(group_id)
    }

    fn find_subject_membership(
        &self,
        user_id: UserId,
        subject: &str,
        excluding: GroupId,
    ) -> RepoResult<Option<Membership>> {
        (**self).find_subject_membership(user_id, subject, excluding)
    }

    fn insert_membership(&self, membership: &Membership) -> RepoResult<()> {
        (**self).insert_membership(membership)
    }
}

impl MembershipRepository for SqliteStore<'_> {
    fn get_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> RepoResult<Option<Membership>> {
        let mut stmt = self.conn().prepare(&format!(
            "{MEMBERSHIP_SELECT_SQL}
             WHERE m.group_id = ?1
               AND m.user_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![group_id.to_string(), user_id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_membership_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_memberships_for_user(&self, user_id: UserId) -> RepoResult<Vec<Membership>> {
        self.query_memberships(
            &format!(
                "{MEMBERSHIP_SELECT_SQL}
                 WHERE m.user_id = ?1
                   AND g.deleted_at IS NULL
                 ORDER BY m.joined_at ASC, m.rowid ASC;"
            ),
            user_id.to_string(),
        )
    }

    fn list_memberships_for_group(&self, group_id: GroupId) -> RepoResult<Vec<Membership>> {
        self.query_memberships(
            &format!(
                "{MEMBERSHIP_SELECT_SQL}
                 WHERE m.group_id = ?1
                 ORDER BY m.joined_at ASC, m.rowid ASC;"
            ),
            group_id.to_string(),
        )
    }

    fn count_members(&self, group_id: GroupId) -> RepoResult<u32> {
        let count: u32 = self.conn().query_row(
            "SELECT COUNT(*) FROM group_members WHERE group_id = ?1;",
            [group_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn find_subject_membership(
        &self,
        user_id: UserId,
        subject: &str,
        excluding: GroupId,
    ) -> RepoResult<Option<Membership>> {
        let mut stmt = self.conn().prepare(&format!(
            "{MEMBERSHIP_SELECT_SQL}
             WHERE m.user_id = ?1
               AND g.subject = ?2
               AND g.deleted_at IS NULL
               AND m.group_id <> ?3
             ORDER BY m.joined_at ASC
             LIMIT 1;"
        ))?;

        let mut rows = stmt.query(params![
            user_id.to_string(),
            subject,
            excluding.to_string()
        ])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_membership_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert_membership(&self, membership: &Membership) -> RepoResult<()> {
        // A group deleted after the caller's checks yields no row here, so a
        // membership never lands in a tombstoned group holding a subject slot.
        let inserted = self.conn().execute(
            "INSERT INTO group_members (
                group_id,
                user_id,
                joined_at,
                role,
                subject
            )
            SELECT g.id, ?2, ?3, ?4, g.subject
            FROM groups g
            WHERE g.id = ?1
              AND g.deleted_at IS NULL;",
            params![
                membership.group_id.to_string(),
                membership.user_id.to_string(),
                membership.joined_at,
                membership.role.as_str(),
            ],
        );

        let err = match inserted {
            Ok(0) => {
                return Err(RepoError::NotFound {
                    entity: "group",
                    id: membership.group_id,
                })
            }
            Ok(_) => return Ok(()),
            Err(err) => err,
        };

        match constraint_failure(&err) {
            Some(ConstraintFailure::Unique) => {
                // Both unique rules report the same family; the exact row
                // tells them apart.
                let kind = if self
                    .get_membership(membership.group_id, membership.user_id)?
                    .is_some()
                {
                    ConflictKind::DuplicateMembership
                } else {
                    ConflictKind::SubjectMembership
                };
                Err(RepoError::Conflict(kind))
            }
            Some(ConstraintFailure::Other) | None => Err(err.into()),
        }
    }
}

impl SqliteStore<'_> {
    fn query_memberships(&self, sql: &str, key: String) -> RepoResult<Vec<Membership>> {
        let mut stmt = self.conn().prepare(sql)?;
        let mut rows = stmt.query([key])?;
        let mut memberships = Vec::new();
        while let Some(row) = rows.next()? {
            memberships.push(parse_membership_row(row)?);
        }
        Ok(memberships)
    }
}

fn parse_membership_row(row: &Row<'_>) -> RepoResult<Membership> {
    let group_text: String = row.get("group_id")?;
    let user_text: String = row.get("user_id")?;
    let role_text: String = row.get("role")?;
    let role = MemberRole::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in group_members.role"))
    })?;

    Ok(Membership {
        group_id: parse_uuid(&group_text, "group_members.group_id")?,
        user_id: parse_uuid(&user_text, "group_members.user_id")?,
        joined_at: row.get("joined_at")?,
        role,
    })
}
