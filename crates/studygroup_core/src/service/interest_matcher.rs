//! Interest overlap scoring.
//!
//! # Invariants
//! - A member counts once when at least one tag is shared, regardless of how
//!   many tags overlap.
//! - Empty user interests and empty groups always score 0.
//! - Scoring never writes to the store.

use crate::model::group::GroupId;
use crate::model::interest::InterestSet;
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::RepoResult;

/// Scores groups against a user's declared interests.
pub struct InterestMatcher<S: ProfileRepository> {
    store: S,
}

impl<S: ProfileRepository> InterestMatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Number of current members of `group_id` sharing at least one
    /// interest with `user_interests`.
    pub fn score(&self, user_interests: &InterestSet, group_id: GroupId) -> RepoResult<u32> {
        if user_interests.is_empty() {
            return Ok(0);
        }

        let members = self.store.list_member_interests(group_id)?;
        Ok(count_overlapping(
            user_interests,
            members.iter().map(|(_, interests)| interests),
        ))
    }
}

/// Counts member interest sets intersecting `user_interests`.
pub fn count_overlapping<'a>(
    user_interests: &InterestSet,
    members: impl IntoIterator<Item = &'a InterestSet>,
) -> u32 {
    let count = members
        .into_iter()
        .filter(|member| user_interests.overlaps(member))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::count_overlapping;
    use crate::model::interest::InterestSet;

    #[test]
    fn counts_members_not_shared_tags() {
        let user = InterestSet::from_tags(["chess", "go", "hiking"]);
        let members = [
            InterestSet::from_tags(["chess", "go"]),
            InterestSet::from_tags(["hiking"]),
            InterestSet::from_tags(["painting"]),
            InterestSet::new(),
        ];
        assert_eq!(count_overlapping(&user, members.iter()), 2);
    }

    #[test]
    fn empty_user_interests_score_zero() {
        let members = [InterestSet::from_tags(["chess"])];
        assert_eq!(count_overlapping(&InterestSet::new(), members.iter()), 0);
    }

    #[test]
    fn no_members_score_zero() {
        let user = InterestSet::from_tags(["chess"]);
        assert_eq!(count_overlapping(&user, std::iter::empty::<&InterestSet>()), 0);
    }
}
