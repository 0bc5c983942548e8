//! Core domain logic for study group discovery, membership and read state.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::group::{Group, GroupId, NewGroup, UserId};
pub use model::interest::InterestSet;
pub use model::membership::{MemberRole, Membership};
pub use model::post::{Post, PostId, ViewRecord};
pub use model::ValidationError;
pub use repo::group_repo::GroupRepository;
pub use repo::membership_repo::MembershipRepository;
pub use repo::post_repo::{PostRepository, PostScan};
pub use repo::profile_repo::ProfileRepository;
pub use repo::sqlite_store::SqliteStore;
pub use repo::{ConflictKind, RepoError, RepoResult};
pub use service::error::{CoreError, CoreResult};
pub use service::interest_matcher::InterestMatcher;
pub use service::membership_guard::{JoinOutcome, JoinStatus, MembershipGuard, MyGroup};
pub use service::read_state::ReadStateTracker;
pub use service::recommender::{
    GroupCandidate, GroupRecommender, Provisioned, Recommendation, Requester,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
