//! Group repository contract and SQLite implementation.
//!
//! # Invariants
//! - Subject scans only return active groups, in creation order.
//! - Soft delete releases the subject slot held by the group's memberships.

use crate::model::group::{Group, GroupId, NewGroup};
use crate::model::now_epoch_ms;
use crate::repo::sqlite_store::{parse_uuid, SqliteStore};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Row};

const GROUP_SELECT_SQL: &str = "SELECT
    id,
    subject,
    name,
    description,
    creator_id,
    created_at,
    deleted_at
FROM groups";

pub trait GroupRepository {
    /// Persists a new group and returns it with its assigned id.
    fn insert_group(&self, group: &NewGroup) -> RepoResult<Group>;
    fn get_group(&self, id: GroupId, include_deleted: bool) -> RepoResult<Option<Group>>;
    /// Active groups whose subject contains `query`, ignoring case.
    ///
    /// Order is stable: creation time, then insertion order.
    fn scan_groups_by_subject(&self, query: &str) -> RepoResult<Vec<Group>>;
    fn soft_delete_group(&self, id: GroupId) -> RepoResult<()>;
}

impl<T: GroupRepository + ?Sized> GroupRepository for &T {
    fn insert_group(&self, group: &NewGroup) -> RepoResult<Group> {
        (**self).insert_group(group)
    }

    fn get_group(&self, id: GroupId, include_deleted: bool) -> RepoResult<Option<Group>> {
        (**self).get_group(id, include_deleted)
    }

    fn scan_groups_by_subject(&self, query: &str) -> RepoResult<Vec<Group>> {
        (**self).scan_groups_by_subject(query)
    }

    fn soft_delete_group(&self, id: GroupId) -> RepoResult<()> {
        (**self).soft_delete_group(id)
    }
}

impl GroupRepository for SqliteStore<'_> {
    fn insert_group(&self, group: &NewGroup) -> RepoResult<Group> {
        group.validate()?;
        let group = group.clone().into_group();

        self.conn().execute(
            "INSERT INTO groups (
                id,
                subject,
                name,
                description,
                creator_id,
                created_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL);",
            params![
                group.id.to_string(),
                group.subject.as_str(),
                group.name.as_str(),
                group.description.as_deref(),
                group.creator_id.to_string(),
                group.created_at,
            ],
        )?;

        Ok(group)
    }

    fn get_group(&self, id: GroupId, include_deleted: bool) -> RepoResult<Option<Group>> {
        let mut stmt = self.conn().prepare(&format!(
            "{GROUP_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), i64::from(include_deleted)])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_group_row(row)?)),
            None => Ok(None),
        }
    }

    fn scan_groups_by_subject(&self, query: &str) -> RepoResult<Vec<Group>> {
        // SQLite's LIKE/lower() only fold ASCII, so matching happens here.
        let needle = query.to_lowercase();
        let mut stmt = self.conn().prepare(&format!(
            "{GROUP_SELECT_SQL}
             WHERE deleted_at IS NULL
             ORDER BY created_at ASC, rowid ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            let group = parse_group_row(row)?;
            if group.subject.to_lowercase().contains(&needle) {
                groups.push(group);
            }
        }

        Ok(groups)
    }

    fn soft_delete_group(&self, id: GroupId) -> RepoResult<()> {
        let tx = self.conn().unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE groups
             SET deleted_at = ?2
             WHERE id = ?1
               AND deleted_at IS NULL;",
            params![id.to_string(), now_epoch_ms()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: "group", id });
        }

        tx.execute(
            "UPDATE group_members SET subject = NULL WHERE group_id = ?1;",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn parse_group_row(row: &Row<'_>) -> RepoResult<Group> {
    let id_text: String = row.get("id")?;
    let creator_text: String = row.get("creator_id")?;

    Ok(Group {
        id: parse_uuid(&id_text, "groups.id")?,
        subject: row.get("subject")?,
        name: row.get("name")?,
        description: row.get("description")?,
        creator_id: parse_uuid(&creator_text, "groups.creator_id")?,
        created_at: row.get("created_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}
