//! hoyo-hq/crates/hq-sync/src/lib.rs
//!
//! Reconciling repositories over a remote `DocumentStore` and a local
//! snapshot cache.

pub mod cache;
pub mod collection;
pub mod forum;
pub mod identity;
pub mod ids;
pub mod profiles;
pub mod reconcile;
pub mod session;

pub use cache::SnapshotCache;
pub use collection::Collection;
pub use forum::{ForumLoad, ForumRepository, ForumState};
pub use identity::ForumIdentity;
pub use profiles::ProfileRepository;
pub use reconcile::{LoadFailure, Loaded, Source};
pub use session::{Notice, Session, Synced};
