//! State shared across all actix-web workers.

use std::sync::Arc;

use hq_core::{
    AppError, CharacterRecord, DocumentStore, ForumUser, GenshinRecord, LocalStore, Result,
    StarRailRecord,
};
use hq_sync::{ForumIdentity, ForumRepository, ProfileRepository, Session, SnapshotCache};

pub struct AppState {
    pub genshin: ProfileRepository<GenshinRecord>,
    pub star_rail: ProfileRepository<StarRailRecord>,
    pub forum: ForumRepository,
    pub identity: ForumIdentity,
}

impl AppState {
    /// All repositories share one session, so the access banner is raised at
    /// most once across games and the forum.
    pub fn new(remote: Arc<dyn DocumentStore>, local: Arc<dyn LocalStore>) -> Self {
        let cache = SnapshotCache::new(local);
        let session = Arc::new(Session::new());
        Self {
            genshin: ProfileRepository::new(remote.clone(), cache.clone(), session.clone()),
            star_rail: ProfileRepository::new(remote.clone(), cache.clone(), session.clone()),
            forum: ForumRepository::new(remote, cache.clone(), session),
            identity: ForumIdentity::new(cache),
        }
    }

    pub fn forum_users(&self) -> Vec<ForumUser> {
        self.identity.users(&self.genshin.snapshot(), &self.star_rail.snapshot())
    }

    /// The forum user mutations are performed as.
    pub async fn acting_user(&self) -> Result<ForumUser> {
        self.identity
            .current(&self.forum_users())
            .await
            .ok_or_else(|| AppError::ValidationError("create a profile before using the forum".into()))
    }
}

/// Picks one game's repository out of [`AppState`], so profile routes can be
/// written once and mounted per game.
pub trait ProfilesFor<R: CharacterRecord> {
    fn profiles(&self) -> &ProfileRepository<R>;
}

impl ProfilesFor<GenshinRecord> for AppState {
    fn profiles(&self) -> &ProfileRepository<GenshinRecord> {
        &self.genshin
    }
}

impl ProfilesFor<StarRailRecord> for AppState {
    fn profiles(&self) -> &ProfileRepository<StarRailRecord> {
        &self.star_rail
    }
}
