//! Error taxonomy shared by the core services.
//!
//! Every variant is a deliberate caller-facing outcome with a stable code;
//! none is used for internal control flow.

use crate::model::group::{GroupId, UserId};
use crate::repo::{ConflictKind, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug)]
pub enum CoreError {
    /// Missing or empty required input.
    InvalidArgument(String),
    /// Referenced record does not exist or is soft-deleted.
    NotFound { entity: &'static str, id: Uuid },
    /// Actor lacks the membership the operation requires.
    Forbidden { user_id: UserId, group_id: GroupId },
    /// User already belongs to another active group of this subject.
    SubjectConflict { subject: String },
    /// Lost a uniqueness race on a non-idempotent write.
    Conflict(ConflictKind),
    /// Store failure; retry policy belongs to the caller.
    Unavailable(RepoError),
}

impl CoreError {
    /// Stable machine-readable code, also used as `error_code` in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound { .. } => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::SubjectConflict { .. } => "subject_conflict",
            Self::Conflict(_) => "conflict",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Forbidden { user_id, group_id } => {
                write!(f, "user {user_id} is not a member of group {group_id}")
            }
            Self::SubjectConflict { subject } => {
                write!(f, "already a member of a study group for subject `{subject}`")
            }
            Self::Conflict(kind) => write!(f, "conflict: {kind}"),
            Self::Unavailable(err) => write!(f, "store unavailable: {err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Conflict(kind) => Self::Conflict(kind),
            RepoError::Validation(err) => Self::InvalidArgument(err.to_string()),
            other => Self::Unavailable(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;
    use crate::model::ValidationError;
    use crate::repo::{ConflictKind, RepoError};
    use uuid::Uuid;

    #[test]
    fn repo_errors_map_onto_core_taxonomy() {
        let id = Uuid::new_v4();
        let not_found = CoreError::from(RepoError::NotFound { entity: "group", id });
        assert!(matches!(not_found, CoreError::NotFound { entity: "group", .. }));

        let conflict = CoreError::from(RepoError::Conflict(ConflictKind::DuplicateMembership));
        assert_eq!(conflict.code(), "conflict");

        let invalid = CoreError::from(RepoError::Validation(ValidationError::EmptySubject));
        assert_eq!(invalid.code(), "invalid_argument");

        let unavailable = CoreError::from(RepoError::InvalidData("bad row".to_string()));
        assert_eq!(unavailable.code(), "unavailable");
    }
}
