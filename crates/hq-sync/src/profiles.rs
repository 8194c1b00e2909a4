//! Reconciling repository for one game's profiles.
//!
//! Every mutation writes remote first, then applies the change to the
//! in-memory working set and rewrites the local snapshot, whatever the remote
//! said. Remote failures come back inside [`Synced`], never as `Err`; an `Err`
//! means the request was rejected before any I/O.

use std::sync::Arc;

use hq_core::{
    merge_character_patch, AppError, CharacterRecord, DocumentStore, Game, Profile, Result,
    WriteBatch,
};
use tokio::sync::watch;
use tracing::{info, instrument};

use crate::cache::SnapshotCache;
use crate::collection::Collection;
use crate::ids;
use crate::reconcile::{reconcile, Loaded};
use crate::session::{Notice, RemoteOutcome, Session, Synced};

pub struct ProfileRepository<R: CharacterRecord> {
    profiles: Collection<Profile<R>>,
    cache: SnapshotCache,
    session: Arc<Session>,
    state: watch::Sender<Vec<Profile<R>>>,
}

impl<R: CharacterRecord> ProfileRepository<R> {
    pub fn new(store: Arc<dyn DocumentStore>, cache: SnapshotCache, session: Arc<Session>) -> Self {
        let (state, _) = watch::channel(Vec::new());
        Self {
            profiles: Collection::new(store, R::GAME.profiles_collection()),
            cache,
            session,
            state,
        }
    }

    pub fn game(&self) -> Game {
        R::GAME
    }

    /// Current working set, in insertion order.
    pub fn snapshot(&self) -> Vec<Profile<R>> {
        self.state.borrow().clone()
    }

    /// Receiver notified after every local change to the working set.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Profile<R>>> {
        self.state.subscribe()
    }

    pub fn find(&self, profile_id: &str) -> Option<Profile<R>> {
        self.state.borrow().iter().find(|p| p.id == profile_id).cloned()
    }

    /// Replaces the working set with the reconciled list.
    #[instrument(skip(self), fields(game = %R::GAME))]
    pub async fn load_all(&self) -> Loaded<Profile<R>> {
        let loaded = reconcile(&self.profiles, &self.cache, R::GAME.cache_key()).await;
        if matches!(loaded.notice(), Some(Notice::Banner(_))) {
            self.session.claim_banner();
        }
        self.state.send_replace(loaded.items.clone());
        loaded
    }

    #[instrument(skip(self), fields(game = %R::GAME))]
    pub async fn create_profile(&self, name: &str) -> Result<Synced<Profile<R>>> {
        let name = validate_name(name)?;
        let profile = Profile::new(ids::profile_id(R::GAME), name);

        let outcome = self.session.absorb("create_profile", self.profiles.put(&profile).await);
        self.state.send_modify(|profiles| profiles.push(profile.clone()));
        self.persist().await;

        info!(profile_id = %profile.id, synced = outcome.error.is_none(), "profile created");
        Ok(outcome.with(profile))
    }

    /// Merges `patch` onto the stored record (or the default one) and writes
    /// only that nested record remotely.
    #[instrument(skip(self, patch), fields(game = %R::GAME))]
    pub async fn update_character(
        &self,
        profile_id: &str,
        character_id: &str,
        patch: &R::Patch,
    ) -> Result<Synced<R>> {
        validate_character_id(character_id)?;
        R::validate_patch(patch)?;
        let profile = self.find(profile_id).ok_or_else(|| self.not_found(profile_id))?;
        let record = merge_character_patch(profile.characters.get(character_id), character_id, patch);

        let path = format!("characters.{character_id}");
        let result = self.profiles.set_field(profile_id, &path, &record).await;
        let outcome = self.session.absorb("update_character", result);

        self.state.send_modify(|profiles| {
            if let Some(p) = profiles.iter_mut().find(|p| p.id == profile_id) {
                p.characters.insert(character_id.to_string(), record.clone());
            }
        });
        self.persist().await;
        Ok(outcome.with(record))
    }

    /// Writes the whole document remotely so a profile created while offline
    /// is recreated rather than rejected.
    #[instrument(skip(self), fields(game = %R::GAME))]
    pub async fn rename_profile(&self, profile_id: &str, name: &str) -> Result<Synced<Profile<R>>> {
        let name = validate_name(name)?;
        let mut profile = self.find(profile_id).ok_or_else(|| self.not_found(profile_id))?;
        if profile.name == name {
            return Ok(RemoteOutcome::default().with(profile));
        }
        profile.name = name;

        let outcome = self.session.absorb("rename_profile", self.profiles.put(&profile).await);
        self.state.send_modify(|profiles| {
            if let Some(p) = profiles.iter_mut().find(|p| p.id == profile_id) {
                p.name = profile.name.clone();
            }
        });
        self.persist().await;
        Ok(outcome.with(profile))
    }

    /// Removes the profile and returns the selection the caller should adopt:
    /// `current` unchanged, or the first remaining profile when `current` was
    /// the one deleted.
    #[instrument(skip(self), fields(game = %R::GAME))]
    pub async fn delete_profile(
        &self,
        profile_id: &str,
        current: Option<&str>,
    ) -> Result<Synced<Option<String>>> {
        if self.find(profile_id).is_none() {
            return Err(self.not_found(profile_id));
        }

        let outcome = self.session.absorb("delete_profile", self.profiles.remove(profile_id).await);
        let mut selection = current.map(str::to_string);
        self.state.send_modify(|profiles| {
            profiles.retain(|p| p.id != profile_id);
            if current == Some(profile_id) {
                selection = profiles.first().map(|p| p.id.clone());
            }
        });
        self.persist().await;

        info!(profile_id, next = ?selection, "profile deleted");
        Ok(outcome.with(selection))
    }

    /// Deletes every profile of this game in one remote batch and drops the
    /// local snapshot. Returns how many profiles were removed.
    #[instrument(skip(self), fields(game = %R::GAME))]
    pub async fn reset_all(&self) -> Synced<usize> {
        let ids: Vec<String> = self.state.borrow().iter().map(|p| p.id.clone()).collect();

        let outcome = if ids.is_empty() {
            RemoteOutcome::default()
        } else {
            let mut batch = WriteBatch::new();
            for id in &ids {
                batch.delete(self.profiles.name(), id);
            }
            self.session.absorb("reset_all", self.profiles.store().commit(batch).await)
        };

        self.state.send_replace(Vec::new());
        self.cache.clear(R::GAME.cache_key()).await;
        info!(removed = ids.len(), "all profiles reset");
        outcome.with(ids.len())
    }

    async fn persist(&self) {
        let snapshot = self.snapshot();
        self.cache.write(R::GAME.cache_key(), &snapshot).await;
    }

    fn not_found(&self, profile_id: &str) -> AppError {
        AppError::NotFound(format!("{} profile", R::GAME), profile_id.to_string())
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::ValidationError("profile name cannot be empty".into()));
    }
    Ok(name.to_string())
}

fn validate_character_id(character_id: &str) -> Result<()> {
    if character_id.trim().is_empty() {
        return Err(AppError::ValidationError("character id cannot be empty".into()));
    }
    // Dots would be read as a nested field path by the document store.
    if character_id.contains('.') {
        return Err(AppError::ValidationError(format!(
            "character id '{character_id}' may not contain '.'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::Source;
    use hq_core::{
        ErrorClass, GenshinPatch, GenshinRecord, LocalStore, MockDocumentStore, StarRailPatch,
        StarRailRecord, Status, StoreError,
    };
    use hq_store_memory::{MemoryDocumentStore, MemoryLocalStore};
    use serde_json::json;

    struct Fixture {
        remote: Arc<MemoryDocumentStore>,
        local: Arc<MemoryLocalStore>,
        session: Arc<Session>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                remote: Arc::new(MemoryDocumentStore::new()),
                local: Arc::new(MemoryLocalStore::new()),
                session: Arc::new(Session::new()),
            }
        }

        fn repo<R: CharacterRecord>(&self) -> ProfileRepository<R> {
            ProfileRepository::new(
                self.remote.clone(),
                SnapshotCache::new(self.local.clone()),
                self.session.clone(),
            )
        }

        async fn cached<R: CharacterRecord>(&self) -> Vec<Profile<R>> {
            SnapshotCache::new(self.local.clone()).read(R::GAME.cache_key()).await
        }
    }

    #[tokio::test]
    async fn aria_gets_a_built_record_over_the_default() {
        let fx = Fixture::new();
        let repo = fx.repo::<GenshinRecord>();
        let aria = repo.create_profile("Aria").await.unwrap().into_inner();

        let patch = GenshinPatch {
            status: Some(Status::Built),
            constellation: Some(3),
            ..Default::default()
        };
        let record = repo.update_character(&aria.id, "char-1", &patch).await.unwrap();

        assert!(record.is_synced());
        assert_eq!(
            record.value,
            GenshinRecord {
                character_id: "char-1".into(),
                status: Status::Built,
                constellation: 3,
                refinement: 0,
                weapon_name: "N/A".into(),
            }
        );
        let cached = fx.cached::<GenshinRecord>().await;
        assert_eq!(cached[0].characters["char-1"], record.value);

        let remote = fx.remote.get("users", &aria.id).await.unwrap().unwrap();
        assert_eq!(remote.body["characters"]["char-1"]["constellation"], 3);
    }

    #[tokio::test]
    async fn blank_name_is_rejected_before_io() {
        let repo = ProfileRepository::<GenshinRecord>::new(
            Arc::new(MockDocumentStore::new()),
            SnapshotCache::new(Arc::new(MemoryLocalStore::new())),
            Arc::new(Session::new()),
        );
        let err = repo.create_profile("   ").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(repo.snapshot().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_patch_is_rejected_before_io() {
        let fx = Fixture::new();
        let repo = fx.repo::<StarRailRecord>();
        let kai = repo.create_profile("Kai").await.unwrap().into_inner();

        let patch = StarRailPatch { eidolon: Some(9), ..Default::default() };
        let err = repo.update_character(&kai.id, "kafka", &patch).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(repo.find(&kai.id).unwrap().characters.is_empty());
    }

    #[tokio::test]
    async fn updating_an_unknown_profile_is_not_found() {
        let fx = Fixture::new();
        let repo = fx.repo::<GenshinRecord>();
        let err = repo
            .update_character("ghost", "xiao", &GenshinPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, id) if id == "ghost"));
    }

    #[tokio::test]
    async fn remote_failure_still_lands_locally_and_banners_once() {
        let fx = Fixture::new();
        fx.remote.fail_all(StoreError::PermissionDenied("rules".into())).await;
        let repo = fx.repo::<GenshinRecord>();

        let first = repo.create_profile("Aria").await.unwrap();
        assert!(!first.is_synced());
        assert_eq!(first.notice, Some(Notice::permission_banner()));

        let second = repo.create_profile("Sam").await.unwrap();
        assert_eq!(second.notice, None);
        assert_eq!(second.remote_error.as_ref().map(AppError::class), Some(ErrorClass::Permission));

        assert_eq!(repo.snapshot().len(), 2);
        assert_eq!(fx.cached::<GenshinRecord>().await.len(), 2);
    }

    #[tokio::test]
    async fn remote_read_with_profiles_overwrites_the_cache() {
        let fx = Fixture::new();
        fx.remote
            .seed("users", "1", json!({ "id": "1", "name": "Aria", "characters": {} }))
            .await;
        let stale = vec![Profile::<GenshinRecord>::new("old".into(), "Old".into())];
        SnapshotCache::new(fx.local.clone()).write("genshin-users", &stale).await;

        let loaded = fx.repo::<GenshinRecord>().load_all().await;
        assert_eq!(loaded.source, Source::Remote);
        assert_eq!(loaded.items.len(), 1);
        let cached = fx.cached::<GenshinRecord>().await;
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].name, "Aria");
    }

    #[tokio::test]
    async fn empty_remote_falls_back_to_cache() {
        let fx = Fixture::new();
        let cached: Vec<Profile<StarRailRecord>> = (0..3)
            .map(|i| Profile::new(format!("hsr-{i}"), format!("P{i}")))
            .collect();
        SnapshotCache::new(fx.local.clone()).write("hsr-users", &cached).await;

        let repo = fx.repo::<StarRailRecord>();
        let loaded = repo.load_all().await;
        assert_eq!(loaded.source, Source::Cache);
        assert_eq!(loaded.items, cached);
        assert_eq!(repo.snapshot(), cached);
    }

    #[tokio::test]
    async fn permission_failure_with_empty_cache_is_degraded() {
        let fx = Fixture::new();
        fx.remote
            .fail_all(StoreError::Unavailable("Missing or insufficient permissions".into()))
            .await;
        let loaded = fx.repo::<GenshinRecord>().load_all().await;

        assert_eq!(loaded.source, Source::Degraded);
        assert!(loaded.items.is_empty());
        assert_eq!(loaded.failure.as_ref().map(|f| f.class), Some(ErrorClass::Permission));
        assert_eq!(loaded.notice(), Some(Notice::permission_banner()));
        assert!(fx.session.banner_shown());
    }

    #[tokio::test]
    async fn transient_failure_with_cache_is_cache_fallback() {
        let fx = Fixture::new();
        let cached = vec![Profile::<GenshinRecord>::new("1".into(), "Aria".into())];
        SnapshotCache::new(fx.local.clone()).write("genshin-users", &cached).await;
        fx.remote.fail_all(StoreError::Unavailable("offline".into())).await;

        let loaded = fx.repo::<GenshinRecord>().load_all().await;
        assert_eq!(loaded.source, Source::CacheFallback);
        assert_eq!(loaded.items, cached);
        assert_eq!(loaded.failure.map(|f| f.class), Some(ErrorClass::Other));
    }

    #[tokio::test]
    async fn deleting_the_current_profile_selects_the_first_remaining() {
        let fx = Fixture::new();
        let repo = fx.repo::<GenshinRecord>();
        let a = repo.create_profile("A").await.unwrap().into_inner();
        let b = repo.create_profile("B").await.unwrap().into_inner();
        let c = repo.create_profile("C").await.unwrap().into_inner();

        let next = repo.delete_profile(&b.id, Some(&b.id)).await.unwrap().into_inner();
        assert_eq!(next.as_deref(), Some(a.id.as_str()));

        let next = repo.delete_profile(&a.id, Some(&c.id)).await.unwrap().into_inner();
        assert_eq!(next.as_deref(), Some(c.id.as_str()));

        let next = repo.delete_profile(&c.id, Some(&c.id)).await.unwrap().into_inner();
        assert_eq!(next, None);
        assert!(fx.cached::<GenshinRecord>().await.is_empty());
        assert!(fx.remote.documents("users").await.is_empty());
    }

    #[tokio::test]
    async fn rename_trims_and_mirrors() {
        let fx = Fixture::new();
        let repo = fx.repo::<StarRailRecord>();
        let p = repo.create_profile("Kai").await.unwrap().into_inner();

        let renamed = repo.rename_profile(&p.id, "  Kaiser ").await.unwrap();
        assert_eq!(renamed.value.name, "Kaiser");
        assert_eq!(fx.cached::<StarRailRecord>().await[0].name, "Kaiser");
        let doc = fx.remote.get("hsr-users", &p.id).await.unwrap().unwrap();
        assert_eq!(doc.body["name"], "Kaiser");
    }

    #[tokio::test]
    async fn reset_all_clears_everything() {
        let fx = Fixture::new();
        let repo = fx.repo::<GenshinRecord>();
        repo.create_profile("A").await.unwrap();
        repo.create_profile("B").await.unwrap();

        let removed = repo.reset_all().await;
        assert_eq!(removed.value, 2);
        assert!(removed.is_synced());
        assert!(repo.snapshot().is_empty());
        assert!(fx.remote.documents("users").await.is_empty());
        assert_eq!(fx.local.get("genshin-users").await.unwrap(), None);
    }

    #[tokio::test]
    async fn only_the_nested_record_is_sent() {
        let mut store = MockDocumentStore::new();
        store.expect_set().returning(|_, _, _| Ok(()));
        store
            .expect_update()
            .withf(|collection, _, fields| {
                collection == "users" && fields.len() == 1 && fields.contains_key("characters.xiao")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let repo = ProfileRepository::<GenshinRecord>::new(
            Arc::new(store),
            SnapshotCache::new(Arc::new(MemoryLocalStore::new())),
            Arc::new(Session::new()),
        );
        let p = repo.create_profile("Aria").await.unwrap().into_inner();
        let patch = GenshinPatch { refinement: Some(1), ..Default::default() };
        repo.update_character(&p.id, "xiao", &patch).await.unwrap();
    }

    #[tokio::test]
    async fn subscribers_see_local_changes() {
        let fx = Fixture::new();
        let repo = fx.repo::<GenshinRecord>();
        let mut rx = repo.subscribe();
        repo.create_profile("Aria").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}
