//! Copy of each user's interest tags, kept so member interests can be read
//! while scoring groups.

use crate::model::group::{GroupId, UserId};
use crate::model::interest::InterestSet;
use crate::repo::sqlite_store::{parse_uuid, SqliteStore};
use crate::repo::RepoResult;
use rusqlite::params;
use std::collections::BTreeMap;

pub trait ProfileRepository {
    /// Replaces the full interest set of one user.
    fn set_interests(&self, user_id: UserId, interests: &InterestSet) -> RepoResult<()>;
    /// Unknown users have the empty set.
    fn get_interests(&self, user_id: UserId) -> RepoResult<InterestSet>;
    /// One entry per current member of the group, including members with no
    /// stored interests.
    fn list_member_interests(&self, group_id: GroupId)
        -> RepoResult<Vec<(UserId, InterestSet)>>;
}

impl<T: ProfileRepository + ?Sized> ProfileRepository for &T {
    fn set_interests(&self, user_id: UserId, interests: &InterestSet) -> RepoResult<()> {
        (**self).set_interests(user_id, interests)
    }

    fn get_interests(&self, user_id: UserId) -> RepoResult<InterestSet> {
        (**self).get_interests(user_id)
    }

    fn list_member_interests(
        &self,
        group_id: GroupId,
    ) -> RepoResult<Vec<(UserId, InterestSet)>> {
        (**self).list_member_interests(group_id)
    }
}

impl ProfileRepository for SqliteStore<'_> {
    fn set_interests(&self, user_id: UserId, interests: &InterestSet) -> RepoResult<()> {
        let user_text = user_id.to_string();
        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "DELETE FROM user_interests WHERE user_id = ?1;",
            [user_text.as_str()],
        )?;
        {
            let mut insert =
                tx.prepare("INSERT INTO user_interests (user_id, tag) VALUES (?1, ?2);")?;
            for tag in interests.iter() {
                insert.execute(params![user_text.as_str(), tag])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_interests(&self, user_id: UserId) -> RepoResult<InterestSet> {
        let mut stmt = self
            .conn()
            .prepare("SELECT tag FROM user_interests WHERE user_id = ?1;")?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(row.get::<_, String>(0)?);
        }
        Ok(InterestSet::from_tags(tags))
    }

    fn list_member_interests(
        &self,
        group_id: GroupId,
    ) -> RepoResult<Vec<(UserId, InterestSet)>> {
        let mut stmt = self.conn().prepare(
            "SELECT m.user_id, ui.tag
             FROM group_members m
             LEFT JOIN user_interests ui ON ui.user_id = m.user_id
             WHERE m.group_id = ?1;",
        )?;
        let mut rows = stmt.query([group_id.to_string()])?;
        let mut tags_by_member: BTreeMap<String, Vec<String>> = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let user_text: String = row.get(0)?;
            let tag: Option<String> = row.get(1)?;
            let tags = tags_by_member.entry(user_text).or_default();
            tags.extend(tag);
        }

        tags_by_member
            .into_iter()
            .map(|(user_text, tags)| {
                let user_id = parse_uuid(&user_text, "group_members.user_id")?;
                Ok((user_id, InterestSet::from_tags(tags)))
            })
            .collect()
    }
}
