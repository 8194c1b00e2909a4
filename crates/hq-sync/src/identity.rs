//! Which profile name is posting on the forum.

use hq_core::{dedupe_by_name, AppError, CharacterRecord, ForumUser, Profile, Result};
use tracing::info;

use crate::cache::SnapshotCache;

pub const SELECTION_KEY: &str = "blog-current-user-id";

#[derive(Clone)]
pub struct ForumIdentity {
    cache: SnapshotCache,
}

impl ForumIdentity {
    pub fn new(cache: SnapshotCache) -> Self {
        Self { cache }
    }

    /// One forum user per distinct profile name, Genshin first.
    pub fn users<A: CharacterRecord, B: CharacterRecord>(
        &self,
        genshin: &[Profile<A>],
        star_rail: &[Profile<B>],
    ) -> Vec<ForumUser> {
        dedupe_by_name(genshin, star_rail)
    }

    pub async fn select(&self, users: &[ForumUser], user_id: &str) -> Result<ForumUser> {
        let user = users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("forum user".into(), user_id.to_string()))?;
        self.cache.set_string(SELECTION_KEY, &user.id).await;
        info!(user_id, "forum user selected");
        Ok(user)
    }

    /// The saved selection if it still exists, otherwise the first user.
    pub async fn current(&self, users: &[ForumUser]) -> Option<ForumUser> {
        let saved = self.cache.get_string(SELECTION_KEY).await;
        saved
            .and_then(|id| users.iter().find(|u| u.id == id))
            .or_else(|| users.first())
            .cloned()
    }
}
