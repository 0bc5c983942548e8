//! SQLite-backed store shared by every repository trait.
//!
//! # Responsibility
//! - Hold a borrowed, migrated connection.
//! - Provide row/value conversion helpers used by the per-entity modules.
//!
//! # Invariants
//! - Construction fails unless the connection is at the latest schema version.

use crate::db::migrations::{current_version, latest_version};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{ffi, Connection, ErrorCode};
use uuid::Uuid;

const REQUIRED_TABLES: [&str; 5] = [
    "groups",
    "group_members",
    "user_interests",
    "posts",
    "post_views",
];

/// Store implementation over one SQLite connection.
///
/// Cheap to copy; each request handler builds its own from its connection.
#[derive(Clone, Copy)]
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        for table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }

        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

/// Constraint family reported by SQLite for a rejected write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintFailure {
    Unique,
    Other,
}

pub(crate) fn constraint_failure(err: &rusqlite::Error) -> Option<ConstraintFailure> {
    match err {
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::ConstraintViolation => {
            Some(match inner.extended_code {
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    ConstraintFailure::Unique
                }
                _ => ConstraintFailure::Other,
            })
        }
        _ => None,
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
