//! Shared fixtures for integration tests.
//!
//! - `MemoryStore`: in-memory store implementing every repository trait.
//!   Without `with_subject_constraint` it enforces only `(group, user)`
//!   uniqueness, like a store that never denormalized the subject.
//! - `PausingStore`: wrapper that parks the calling thread on a barrier the
//!   first time a chosen read happens, to force check-then-act interleavings.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Barrier, Mutex};
use studygroup_core::{
    ConflictKind, Group, GroupId, GroupRepository, InterestSet, Membership,
    MembershipRepository, NewGroup, Post, PostId, PostRepository, PostScan, ProfileRepository,
    RepoError, RepoResult, UserId, ViewRecord,
};

#[derive(Default)]
struct State {
    groups: Vec<Group>,
    memberships: Vec<(Membership, Option<String>)>,
    interests: HashMap<UserId, InterestSet>,
    posts: Vec<Post>,
    views: Vec<ViewRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    enforce_subject_unique: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject_constraint() -> Self {
        Self {
            state: Mutex::default(),
            enforce_subject_unique: true,
        }
    }

    fn active_group(state: &State, id: GroupId) -> Option<&Group> {
        state.groups.iter().find(|g| g.id == id && g.is_active())
    }
}

impl GroupRepository for MemoryStore {
    fn insert_group(&self, group: &NewGroup) -> RepoResult<Group> {
        group.validate()?;
        let group = group.clone().into_group();
        self.state.lock().unwrap().groups.push(group.clone());
        Ok(group)
    }

    fn get_group(&self, id: GroupId, include_deleted: bool) -> RepoResult<Option<Group>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .groups
            .iter()
            .find(|g| g.id == id && (include_deleted || g.is_active()))
            .cloned())
    }

    fn scan_groups_by_subject(&self, query: &str) -> RepoResult<Vec<Group>> {
        let needle = query.to_lowercase();
        let state = self.state.lock().unwrap();
        Ok(state
            .groups
            .iter()
            .filter(|g| g.is_active() && g.subject.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn soft_delete_group(&self, id: GroupId) -> RepoResult<()> {
        let mut state = self.state.lock().unwrap();
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == id && g.is_active())
            .ok_or(RepoError::NotFound { entity: "group", id })?;
        group.deleted_at = Some(1);
        for (membership, subject) in state.memberships.iter_mut() {
            if membership.group_id == id {
                *subject = None;
            }
        }
        Ok(())
    }
}

impl MembershipRepository for MemoryStore {
    fn get_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> RepoResult<Option<Membership>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .memberships
            .iter()
            .map(|(m, _)| m)
            .find(|m| m.group_id == group_id && m.user_id == user_id)
            .cloned())
    }

    fn list_memberships_for_user(&self, user_id: UserId) -> RepoResult<Vec<Membership>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .memberships
            .iter()
            .map(|(m, _)| m)
            .filter(|m| m.user_id == user_id && Self::active_group(&state, m.group_id).is_some())
            .cloned()
            .collect())
    }

    fn list_memberships_for_group(&self, group_id: GroupId) -> RepoResult<Vec<Membership>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .memberships
            .iter()
            .map(|(m, _)| m)
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }

    fn count_members(&self, group_id: GroupId) -> RepoResult<u32> {
        Ok(self.list_memberships_for_group(group_id)?.len() as u32)
    }

    fn find_subject_membership(
        &self,
        user_id: UserId,
        subject: &str,
        excluding: GroupId,
    ) -> RepoResult<Option<Membership>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .memberships
            .iter()
            .map(|(m, _)| m)
            .find(|m| {
                m.user_id == user_id
                    && m.group_id != excluding
                    && Self::active_group(&state, m.group_id)
                        .is_some_and(|g| g.subject == subject)
            })
            .cloned())
    }

    fn insert_membership(&self, membership: &Membership) -> RepoResult<()> {
        let mut state = self.state.lock().unwrap();
        let subject = Self::active_group(&state, membership.group_id)
            .map(|group| group.subject.clone())
            .ok_or(RepoError::NotFound {
                entity: "group",
                id: membership.group_id,
            })?;
        let duplicate = state.memberships.iter().any(|(m, _)| {
            m.group_id == membership.group_id && m.user_id == membership.user_id
        });
        if duplicate {
            return Err(RepoError::Conflict(ConflictKind::DuplicateMembership));
        }
        if self.enforce_subject_unique {
            let occupied = state.memberships.iter().any(|(m, s)| {
                m.user_id == membership.user_id && s.as_deref() == Some(subject.as_str())
            });
            if occupied {
                return Err(RepoError::Conflict(ConflictKind::SubjectMembership));
            }
        }
        state
            .memberships
            .push((membership.clone(), Some(subject)));
        Ok(())
    }
}

impl ProfileRepository for MemoryStore {
    fn set_interests(&self, user_id: UserId, interests: &InterestSet) -> RepoResult<()> {
        self.state
            .lock()
            .unwrap()
            .interests
            .insert(user_id, interests.clone());
        Ok(())
    }

    fn get_interests(&self, user_id: UserId) -> RepoResult<InterestSet> {
        let state = self.state.lock().unwrap();
        Ok(state.interests.get(&user_id).cloned().unwrap_or_default())
    }

    fn list_member_interests(
        &self,
        group_id: GroupId,
    ) -> RepoResult<Vec<(UserId, InterestSet)>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .memberships
            .iter()
            .map(|(m, _)| m)
            .filter(|m| m.group_id == group_id)
            .map(|m| {
                let interests = state.interests.get(&m.user_id).cloned().unwrap_or_default();
                (m.user_id, interests)
            })
            .collect())
    }
}

impl PostRepository for MemoryStore {
    fn insert_post(&self, post: &Post) -> RepoResult<PostId> {
        post.validate()?;
        self.state.lock().unwrap().posts.push(post.clone());
        Ok(post.id)
    }

    fn soft_delete_post(&self, id: PostId) -> RepoResult<()> {
        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == id && p.is_active())
            .ok_or(RepoError::NotFound { entity: "post", id })?;
        post.deleted_at = Some(1);
        Ok(())
    }

    fn scan_posts(&self, scan: &PostScan) -> RepoResult<Vec<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter()
            .filter(|p| p.is_active() && p.group_id == scan.group_id)
            .filter(|p| scan.created_since.map_or(true, |since| p.created_at >= since))
            .filter(|p| scan.exclude_author != Some(p.author_id))
            .cloned()
            .collect())
    }

    fn viewed_post_ids(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> RepoResult<BTreeSet<PostId>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .views
            .iter()
            .filter(|v| v.user_id == user_id)
            .filter(|v| state.posts.iter().any(|p| p.id == v.post_id && p.group_id == group_id))
            .map(|v| v.post_id)
            .collect())
    }

    fn list_view_records(&self, user_id: UserId) -> RepoResult<Vec<ViewRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .views
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }

    fn insert_view_records(
        &self,
        user_id: UserId,
        post_ids: &[PostId],
        viewed_at: i64,
    ) -> RepoResult<u32> {
        let mut state = self.state.lock().unwrap();
        let mut created = 0;
        for post_id in post_ids {
            let exists = state
                .views
                .iter()
                .any(|v| v.user_id == user_id && v.post_id == *post_id);
            if !exists {
                state.views.push(ViewRecord {
                    user_id,
                    post_id: *post_id,
                    viewed_at,
                });
                created += 1;
            }
        }
        Ok(created)
    }
}

/// Read after which a `PausingStore` waits on its barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PausePoint {
    SubjectCheck,
    MembershipLookup,
}

/// Single-thread wrapper that waits on `barrier` once, right after the
/// chosen read returns.
///
/// With `resume_on`, it then also waits on a second barrier, so another
/// thread can mutate the store while this one is parked.
pub struct PausingStore<'b, S> {
    inner: S,
    barrier: &'b Barrier,
    resume: Option<&'b Barrier>,
    point: PausePoint,
    paused: Cell<bool>,
}

impl<'b, S> PausingStore<'b, S> {
    pub fn new(inner: S, barrier: &'b Barrier, point: PausePoint) -> Self {
        Self {
            inner,
            barrier,
            resume: None,
            point,
            paused: Cell::new(false),
        }
    }

    pub fn resume_on(mut self, resume: &'b Barrier) -> Self {
        self.resume = Some(resume);
        self
    }

    fn pause_at(&self, point: PausePoint) {
        if self.point == point && !self.paused.replace(true) {
            self.barrier.wait();
            if let Some(resume) = self.resume {
                resume.wait();
            }
        }
    }
}

impl<S: GroupRepository> GroupRepository for PausingStore<'_, S> {
    fn insert_group(&self, group: &NewGroup) -> RepoResult<Group> {
        self.inner.insert_group(group)
    }

    fn get_group(&self, id: GroupId, include_deleted: bool) -> RepoResult<Option<Group>> {
        self.inner.get_group(id, include_deleted)
    }

    fn scan_groups_by_subject(&self, query: &str) -> RepoResult<Vec<Group>> {
        self.inner.scan_groups_by_subject(query)
    }

    fn soft_delete_group(&self, id: GroupId) -> RepoResult<()> {
        self.inner.soft_delete_group(id)
    }
}

impl<S: MembershipRepository> MembershipRepository for PausingStore<'_, S> {
    fn get_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> RepoResult<Option<Membership>> {
        let result = self.inner.get_membership(group_id, user_id);
        self.pause_at(PausePoint::MembershipLookup);
        result
    }

    fn list_memberships_for_user(&self, user_id: UserId) -> RepoResult<Vec<Membership>> {
        self.inner.list_memberships_for_user(user_id)
    }

    fn list_memberships_for_group(&self, group_id: GroupId) -> RepoResult<Vec<Membership>> {
        self.inner.list_memberships_for_group(group_id)
    }

    fn count_members(&self, group_id: GroupId) -> RepoResult<u32> {
        self.inner.count_members(group_id)
    }

    fn find_subject_membership(
        &self,
        user_id: UserId,
        subject: &str,
        excluding: GroupId,
    ) -> RepoResult<Option<Membership>> {
        let result = self.inner.find_subject_membership(user_id, subject, excluding);
        self.pause_at(PausePoint::SubjectCheck);
        result
    }

    fn insert_membership(&self, membership: &Membership) -> RepoResult<()> {
        self.inner.insert_membership(membership)
    }
}
