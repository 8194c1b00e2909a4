//! Shared fixtures for the scenario tests.

use std::sync::Arc;

use hq_core::{CharacterRecord, DocumentStore, ForumUser, GameTag, LocalStore};
use hq_store_memory::{MemoryDocumentStore, MemoryLocalStore};
use hq_sync::{ForumIdentity, ForumRepository, ProfileRepository, Session, SnapshotCache};

/// One "device": a remote store, a local cache and a session over them.
pub struct Device {
    pub remote: Arc<dyn DocumentStore>,
    pub local: Arc<dyn LocalStore>,
    pub session: Arc<Session>,
}

impl Device {
    pub fn new(remote: Arc<dyn DocumentStore>, local: Arc<dyn LocalStore>) -> Self {
        Self { remote, local, session: Arc::new(Session::new()) }
    }

    /// Memory-backed remote and cache.
    pub fn in_memory() -> (Self, Arc<MemoryDocumentStore>) {
        let remote = Arc::new(MemoryDocumentStore::new());
        (Self::new(remote.clone(), Arc::new(MemoryLocalStore::new())), remote)
    }

    pub fn cache(&self) -> SnapshotCache {
        SnapshotCache::new(self.local.clone())
    }

    pub fn profiles<R: CharacterRecord>(&self) -> ProfileRepository<R> {
        ProfileRepository::new(self.remote.clone(), self.cache(), self.session.clone())
    }

    pub fn forum(&self) -> ForumRepository {
        ForumRepository::new(self.remote.clone(), self.cache(), self.session.clone())
    }

    pub fn identity(&self) -> ForumIdentity {
        ForumIdentity::new(self.cache())
    }

    /// Same remote, fresh cache and session.
    pub fn other_device(&self) -> Self {
        Self::new(self.remote.clone(), Arc::new(MemoryLocalStore::new()))
    }
}

pub fn forum_user(name: &str, game: GameTag) -> ForumUser {
    ForumUser { id: name.to_string(), name: name.to_string(), game }
}
