//! Per-user read/unread tracking of group posts.
//!
//! # Invariants
//! - Unread excludes soft-deleted posts, posts older than the user's join
//!   time, the user's own posts, and posts with a view record.
//! - Marking read is idempotent through view-record uniqueness.

use crate::model::group::{GroupId, UserId};
use crate::model::now_epoch_ms;
use crate::model::post::PostId;
use crate::repo::group_repo::GroupRepository;
use crate::repo::membership_repo::MembershipRepository;
use crate::repo::post_repo::{PostRepository, PostScan};
use crate::service::error::{CoreError, CoreResult};
use log::{debug, info};
use std::collections::BTreeMap;

pub struct ReadStateTracker<S>
where
    S: GroupRepository + MembershipRepository + PostRepository,
{
    store: S,
}

impl<S> ReadStateTracker<S>
where
    S: GroupRepository + MembershipRepository + PostRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Unread post count for every active group the user belongs to.
    ///
    /// Groups without unread posts are present with `0`.
    pub fn unread_counts(&self, user_id: UserId) -> CoreResult<BTreeMap<GroupId, u32>> {
        let mut counts = BTreeMap::new();
        for membership in self.store.list_memberships_for_user(user_id)? {
            let scan = PostScan {
                group_id: membership.group_id,
                created_since: Some(membership.joined_at),
                exclude_author: Some(user_id),
            };
            let posts = self.store.scan_posts(&scan)?;
            let viewed = self.store.viewed_post_ids(user_id, membership.group_id)?;
            let unread = posts.iter().filter(|post| !viewed.contains(&post.id)).count();
            counts.insert(
                membership.group_id,
                u32::try_from(unread).unwrap_or(u32::MAX),
            );
        }

        debug!(
            "event=unread_counts module=read_state status=ok user_id={user_id} groups={}",
            counts.len()
        );
        Ok(counts)
    }

    /// Marks every active post of the group as seen by `user_id`.
    ///
    /// Returns the number of view records created by this call.
    ///
    /// # Errors
    /// - `NotFound` when the group is missing or soft-deleted.
    /// - `Forbidden` when the user is not a member.
    pub fn mark_group_read(&self, user_id: UserId, group_id: GroupId) -> CoreResult<u32> {
        if self.store.get_group(group_id, false)?.is_none() {
            return Err(CoreError::NotFound {
                entity: "group",
                id: group_id,
            });
        }

        if self.store.get_membership(group_id, user_id)?.is_none() {
            return Err(CoreError::Forbidden { user_id, group_id });
        }

        let post_ids: Vec<PostId> = self
            .store
            .scan_posts(&PostScan::group(group_id))?
            .into_iter()
            .map(|post| post.id)
            .collect();
        let created = self
            .store
            .insert_view_records(user_id, &post_ids, now_epoch_ms())?;

        info!(
            "event=group_mark_read module=read_state status=ok user_id={user_id} group_id={group_id} posts={} created={created}",
            post_ids.len()
        );
        Ok(created)
    }
}
