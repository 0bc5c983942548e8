//! Group discovery and recommendation.
//!
//! # Responsibility
//! - Find candidate groups for a subject query and annotate them.
//! - Provision a fresh, empty group when the subject has none.
//! - Pick exactly one recommended group under a deterministic policy.
//!
//! # Invariants
//! - Every successful `recommend` leaves at least one zero-member candidate
//!   for the subject, creating one when needed. This write is part of the
//!   contract: search also provisions.
//! - The best candidate is the strictly highest interest score; ties keep
//!   the earliest group in scan order.
//! - When no candidate shares any interest, the zero-member group is
//!   recommended instead of an arbitrary zero-score group.
//! - Concurrent searches may each provision a group; duplicates are accepted
//!   so discovery never waits on a lock.

use crate::model::group::{Group, NewGroup, UserId};
use crate::model::interest::InterestSet;
use crate::repo::group_repo::GroupRepository;
use crate::repo::membership_repo::MembershipRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::service::error::{CoreError, CoreResult};
use crate::service::interest_matcher::InterestMatcher;
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::time::Instant;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Verified caller identity as supplied by the session collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: UserId,
    pub interests: InterestSet,
}

impl Requester {
    pub fn new(user_id: UserId, interests: InterestSet) -> Self {
        Self { user_id, interests }
    }
}

/// One candidate group annotated for the requesting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCandidate {
    #[serde(flatten)]
    pub group: Group,
    pub member_count: u32,
    /// Members sharing at least one interest with the requester.
    pub interest_score: u32,
    pub is_member: bool,
}

impl GroupCandidate {
    fn empty(group: Group) -> Self {
        Self {
            group,
            member_count: 0,
            interest_score: 0,
            is_member: false,
        }
    }
}

/// The zero-member fallback group and whether this call created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provisioned {
    pub created: bool,
    pub group: Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub recommended: GroupCandidate,
    /// Candidates in scan order; a provisioned group is appended last.
    pub candidates: Vec<GroupCandidate>,
    pub fallback: Provisioned,
}

/// Recommends study groups and provisions empty ones on demand.
pub struct GroupRecommender<S>
where
    S: GroupRepository + MembershipRepository + ProfileRepository,
{
    store: S,
}

impl<S> GroupRecommender<S>
where
    S: GroupRepository + MembershipRepository + ProfileRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Finds candidates for `subject_query` and recommends one of them.
    ///
    /// # Side effects
    /// - Persists a new group when no candidate has zero members.
    /// - Emits `group_recommend` logging events.
    ///
    /// # Errors
    /// - `InvalidArgument` when the query is blank.
    /// - `Unavailable` when the store fails.
    pub fn recommend(
        &self,
        requester: &Requester,
        subject_query: &str,
    ) -> CoreResult<Recommendation> {
        let started_at = Instant::now();
        let query = normalize_subject_query(subject_query).ok_or_else(|| {
            CoreError::InvalidArgument("subject query cannot be empty".to_string())
        })?;

        match self.recommend_normalized(requester, &query) {
            Ok(recommendation) => {
                info!(
                    "event=group_recommend module=recommender status=ok user_id={} candidates={} recommended_group_id={} provisioned={} duration_ms={}",
                    requester.user_id,
                    recommendation.candidates.len(),
                    recommendation.recommended.group.id,
                    recommendation.fallback.created,
                    started_at.elapsed().as_millis()
                );
                Ok(recommendation)
            }
            Err(err) => {
                error!(
                    "event=group_recommend module=recommender status=error user_id={} error_code={} error={}",
                    requester.user_id,
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Creates a group explicitly; the creator does not become a member.
    ///
    /// The subject is normalized like a search query so the group is found
    /// by its own subject and shares its subject slot with provisioned twins.
    pub fn create_group(
        &self,
        requester: &Requester,
        subject: &str,
        name: &str,
        description: Option<&str>,
    ) -> CoreResult<Group> {
        let subject = normalize_subject_query(subject).unwrap_or_default();
        let mut new_group = NewGroup::new(subject, name.trim(), requester.user_id);
        if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
            new_group = new_group.with_description(description);
        }

        let group = self.store.insert_group(&new_group)?;
        info!(
            "event=group_create module=recommender status=ok group_id={} creator_id={} mode=explicit",
            group.id, requester.user_id
        );
        Ok(group)
    }

    fn recommend_normalized(
        &self,
        requester: &Requester,
        query: &str,
    ) -> CoreResult<Recommendation> {
        let groups = self.store.scan_groups_by_subject(query)?;

        if groups.is_empty() {
            let group = self.provision_group(requester, query, 1)?;
            let candidate = GroupCandidate::empty(group.clone());
            return Ok(Recommendation {
                recommended: candidate.clone(),
                candidates: vec![candidate],
                fallback: Provisioned {
                    created: true,
                    group,
                },
            });
        }

        let matcher = InterestMatcher::new(&self.store);
        let mut candidates = Vec::with_capacity(groups.len() + 1);
        for group in groups {
            candidates.push(GroupCandidate {
                member_count: self.store.count_members(group.id)?,
                interest_score: matcher.score(&requester.interests, group.id)?,
                is_member: self
                    .store
                    .get_membership(group.id, requester.user_id)?
                    .is_some(),
                group,
            });
        }

        let best = select_best(&candidates);

        let fallback = match candidates.iter().find(|c| c.member_count == 0) {
            Some(candidate) => Provisioned {
                created: false,
                group: candidate.group.clone(),
            },
            None => {
                let group = self.provision_group(requester, query, candidates.len() + 1)?;
                candidates.push(GroupCandidate::empty(group.clone()));
                Provisioned {
                    created: true,
                    group,
                }
            }
        };

        let recommended = match best.map(|index| &candidates[index]) {
            Some(best) if best.interest_score > 0 => self.refresh(best, requester.user_id)?,
            _ => candidates
                .iter()
                .find(|c| c.group.id == fallback.group.id)
                .cloned()
                .unwrap_or_else(|| GroupCandidate::empty(fallback.group.clone())),
        };

        Ok(Recommendation {
            recommended,
            candidates,
            fallback,
        })
    }

    fn provision_group(
        &self,
        requester: &Requester,
        query: &str,
        ordinal: usize,
    ) -> CoreResult<Group> {
        let new_group = NewGroup::new(
            query,
            format!("{query} Study Group #{ordinal}"),
            requester.user_id,
        )
        .with_description(format!("Automatically created study group for {query}."));

        let group = self.store.insert_group(&new_group)?;
        info!(
            "event=group_create module=recommender status=ok group_id={} creator_id={} mode=provisioned ordinal={}",
            group.id, requester.user_id, ordinal
        );
        Ok(group)
    }

    /// Re-reads live member count and membership for the chosen group.
    fn refresh(&self, candidate: &GroupCandidate, user_id: UserId) -> CoreResult<GroupCandidate> {
        let group_id = candidate.group.id;
        Ok(GroupCandidate {
            group: candidate.group.clone(),
            member_count: self.store.count_members(group_id)?,
            interest_score: candidate.interest_score,
            is_member: self.store.get_membership(group_id, user_id)?.is_some(),
        })
    }
}

/// Trims the query and collapses inner whitespace; `None` when blank.
pub fn normalize_subject_query(raw: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(raw.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

/// Index of the strictly highest score, keeping the first on ties.
fn select_best(candidates: &[GroupCandidate]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        if best.map_or(true, |(_, score)| candidate.interest_score > score) {
            best = Some((index, candidate.interest_score));
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::{normalize_subject_query, select_best, GroupCandidate};
    use crate::model::group::NewGroup;
    use uuid::Uuid;

    fn candidate(score: u32) -> GroupCandidate {
        GroupCandidate {
            group: NewGroup::new("Math", "g", Uuid::new_v4()).into_group(),
            member_count: 1,
            interest_score: score,
            is_member: false,
        }
    }

    #[test]
    fn normalize_rejects_blank_and_collapses_whitespace() {
        assert_eq!(normalize_subject_query("   "), None);
        assert_eq!(normalize_subject_query(""), None);
        assert_eq!(
            normalize_subject_query("  Linear \t Algebra "),
            Some("Linear Algebra".to_string())
        );
    }

    #[test]
    fn select_best_prefers_first_on_ties() {
        let candidates = vec![candidate(1), candidate(3), candidate(3), candidate(2)];
        assert_eq!(select_best(&candidates), Some(1));
    }

    #[test]
    fn select_best_of_all_zero_scores_is_first() {
        let candidates = vec![candidate(0), candidate(0)];
        assert_eq!(select_best(&candidates), Some(0));
        assert_eq!(select_best(&[]), None);
    }
}
