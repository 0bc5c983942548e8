//! Post and view-record repository contract and SQLite implementation.
//!
//! # Invariants
//! - Scans never return soft-deleted posts.
//! - `(user_id, post_id)` is unique on `post_views`; duplicate inserts are
//!   dropped by the store, not by a read-before-write.

use crate::model::group::{GroupId, UserId};
use crate::model::now_epoch_ms;
use crate::model::post::{Post, PostId, ViewRecord};
use crate::repo::sqlite_store::{parse_uuid, SqliteStore};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};
use std::collections::BTreeSet;

const POST_SELECT_SQL: &str = "SELECT
    id,
    group_id,
    author_id,
    title,
    content,
    created_at,
    deleted_at
FROM posts";

/// Filter for active posts of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostScan {
    pub group_id: GroupId,
    /// Inclusive lower bound on `created_at`.
    pub created_since: Option<i64>,
    pub exclude_author: Option<UserId>,
}

impl PostScan {
    pub fn group(group_id: GroupId) -> Self {
        Self {
            group_id,
            created_since: None,
            exclude_author: None,
        }
    }
}

pub trait PostRepository {
    fn insert_post(&self, post: &Post) -> RepoResult<PostId>;
    fn soft_delete_post(&self, id: PostId) -> RepoResult<()>;
    /// Active posts matching `scan`, oldest first.
    fn scan_posts(&self, scan: &PostScan) -> RepoResult<Vec<Post>>;
    /// Ids of posts in `group_id` the user has a view record for.
    fn viewed_post_ids(&self, user_id: UserId, group_id: GroupId) -> RepoResult<BTreeSet<PostId>>;
    fn list_view_records(&self, user_id: UserId) -> RepoResult<Vec<ViewRecord>>;
    /// Inserts view records, skipping pairs that already exist.
    ///
    /// Returns the number of records actually created.
    fn insert_view_records(
        &self,
        user_id: UserId,
        post_ids: &[PostId],
        viewed_at: i64,
    ) -> RepoResult<u32>;
}

impl<T: PostRepository + ?Sized> PostRepository for &T {
    fn insert_post(&self, post: &Post) -> RepoResult<PostId> {
        (**self).insert_post(post)
    }

    fn soft_delete_post(&self, id: PostId) -> RepoResult<()> {
        (**self).soft_delete_post(id)
    }

    fn scan_posts(&self, scan: &PostScan) -> RepoResult<Vec<Post>> {
        (**self).scan_posts(scan)
    }

    fn viewed_post_ids(&self, user_id: UserId, group_id: GroupId) -> RepoResult<BTreeSet<PostId>> {
        (**self).viewed_post_ids(user_id, group_id)
    }

    fn list_view_records(&self, user_id: UserId) -> RepoResult<Vec<ViewRecord>> {
        (**self).list_view_records(user_id)
    }

    fn insert_view_records(
        &self,
        user_id: UserId,
        post_ids: &[PostId],
        viewed_at: i64,
    ) -> RepoResult<u32> {
        (**self).insert_view_records(user_id, post_ids, viewed_at)
    }
}

impl PostRepository for SqliteStore<'_> {
    fn insert_post(&self, post: &Post) -> RepoResult<PostId> {
        post.validate()?;

        self.conn().execute(
            "INSERT INTO posts (
                id,
                group_id,
                author_id,
                title,
                content,
                created_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                post.id.to_string(),
                post.group_id.to_string(),
                post.author_id.to_string(),
                post.title.as_str(),
                post.content.as_str(),
                post.created_at,
                post.deleted_at,
            ],
        )?;

        Ok(post.id)
    }

    fn soft_delete_post(&self, id: PostId) -> RepoResult<()> {
        let changed = self.conn().execute(
            "UPDATE posts
             SET deleted_at = ?2
             WHERE id = ?1
               AND deleted_at IS NULL;",
            params![id.to_string(), now_epoch_ms()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: "post", id });
        }

        Ok(())
    }

    fn scan_posts(&self, scan: &PostScan) -> RepoResult<Vec<Post>> {
        let mut sql = format!("{POST_SELECT_SQL} WHERE deleted_at IS NULL AND group_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(scan.group_id.to_string())];

        if let Some(since) = scan.created_since {
            sql.push_str(" AND created_at >= ?");
            bind_values.push(Value::Integer(since));
        }

        if let Some(author) = scan.exclude_author {
            sql.push_str(" AND author_id <> ?");
            bind_values.push(Value::Text(author.to_string()));
        }

        sql.push_str(" ORDER BY created_at ASC, rowid ASC");

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }

        Ok(posts)
    }

    fn viewed_post_ids(&self, user_id: UserId, group_id: GroupId) -> RepoResult<BTreeSet<PostId>> {
        let mut stmt = self.conn().prepare(
            "SELECT v.post_id
             FROM post_views v
             INNER JOIN posts p ON p.id = v.post_id
             WHERE v.user_id = ?1
               AND p.group_id = ?2;",
        )?;
        let mut rows = stmt.query(params![user_id.to_string(), group_id.to_string()])?;
        let mut ids = BTreeSet::new();
        while let Some(row) = rows.next()? {
            let post_text: String = row.get(0)?;
            ids.insert(parse_uuid(&post_text, "post_views.post_id")?);
        }
        Ok(ids)
    }

    fn list_view_records(&self, user_id: UserId) -> RepoResult<Vec<ViewRecord>> {
        let mut stmt = self.conn().prepare(
            "SELECT user_id, post_id, viewed_at
             FROM post_views
             WHERE user_id = ?1
             ORDER BY viewed_at ASC, post_id ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let user_text: String = row.get("user_id")?;
            let post_text: String = row.get("post_id")?;
            records.push(ViewRecord {
                user_id: parse_uuid(&user_text, "post_views.user_id")?,
                post_id: parse_uuid(&post_text, "post_views.post_id")?,
                viewed_at: row.get("viewed_at")?,
            });
        }
        Ok(records)
    }

    fn insert_view_records(
        &self,
        user_id: UserId,
        post_ids: &[PostId],
        viewed_at: i64,
    ) -> RepoResult<u32> {
        if post_ids.is_empty() {
            return Ok(0);
        }

        let user_text = user_id.to_string();
        let tx = self.conn().unchecked_transaction()?;
        let mut created = 0u32;
        {
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO post_views (user_id, post_id, viewed_at)
                 VALUES (?1, ?2, ?3);",
            )?;
            for post_id in post_ids {
                let changed = insert.execute(params![
                    user_text.as_str(),
                    post_id.to_string(),
                    viewed_at
                ])?;
                if changed > 0 {
                    created += 1;
                }
            }
        }
        tx.commit()?;
        Ok(created)
    }
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    let id_text: String = row.get("id")?;
    let group_text: String = row.get("group_id")?;
    let author_text: String = row.get("author_id")?;

    Ok(Post {
        id: parse_uuid(&id_text, "posts.id")?,
        group_id: parse_uuid(&group_text, "posts.group_id")?,
        author_id: parse_uuid(&author_text, "posts.author_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}
