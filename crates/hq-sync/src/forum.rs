//! Forum posts and replies.
//!
//! Same dual-write rules as the profile repository. Reply counts and cascaded
//! deletes go through one atomic batch so the remote never holds orphans.

use std::collections::BTreeSet;
use std::sync::Arc;

use hq_core::document::field;
use hq_core::{
    filter_posts, toggle_membership, Actor, AppError, DocumentStore, ForumPost, ForumReply,
    ForumUser, GameTag, Keyed, PostFilter, Result, WriteBatch,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::cache::SnapshotCache;
use crate::collection::{encode, Collection};
use crate::ids;
use crate::reconcile::{reconcile, Loaded};
use crate::session::{Notice, Session, Synced};

pub const POSTS_COLLECTION: &str = "blog-posts";
pub const REPLIES_COLLECTION: &str = "blog-replies";
pub const POSTS_CACHE_KEY: &str = "forum-posts";
pub const REPLIES_CACHE_KEY: &str = "forum-replies";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForumState {
    pub posts: Vec<ForumPost>,
    pub replies: Vec<ForumReply>,
}

/// Result of loading both forum collections.
#[derive(Debug, Clone)]
pub struct ForumLoad {
    pub posts: Loaded<ForumPost>,
    pub replies: Loaded<ForumReply>,
}

impl ForumLoad {
    /// The posts' notice wins; replies only speak up when posts are quiet.
    pub fn notice(&self) -> Option<Notice> {
        self.posts.notice().or_else(|| self.replies.notice())
    }
}

/// Entities carrying a like list.
trait Likeable: Keyed + Clone + Serialize + DeserializeOwned {
    const KIND: &'static str;
    fn likes(&self) -> &[String];
    fn likes_mut(&mut self) -> &mut Vec<String>;
    fn in_state(state: &mut ForumState) -> &mut Vec<Self>;
}

impl Likeable for ForumPost {
    const KIND: &'static str = "post";

    fn likes(&self) -> &[String] {
        &self.likes
    }

    fn likes_mut(&mut self) -> &mut Vec<String> {
        &mut self.likes
    }

    fn in_state(state: &mut ForumState) -> &mut Vec<Self> {
        &mut state.posts
    }
}

impl Likeable for ForumReply {
    const KIND: &'static str = "reply";

    fn likes(&self) -> &[String] {
        &self.likes
    }

    fn likes_mut(&mut self) -> &mut Vec<String> {
        &mut self.likes
    }

    fn in_state(state: &mut ForumState) -> &mut Vec<Self> {
        &mut state.replies
    }
}

pub struct ForumRepository {
    posts: Collection<ForumPost>,
    replies: Collection<ForumReply>,
    cache: SnapshotCache,
    session: Arc<Session>,
    state: watch::Sender<ForumState>,
}

impl ForumRepository {
    pub fn new(store: Arc<dyn DocumentStore>, cache: SnapshotCache, session: Arc<Session>) -> Self {
        let (state, _) = watch::channel(ForumState::default());
        Self {
            posts: Collection::new(store.clone(), POSTS_COLLECTION),
            replies: Collection::new(store, REPLIES_COLLECTION),
            cache,
            session,
            state,
        }
    }

    pub fn snapshot(&self) -> ForumState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ForumState> {
        self.state.subscribe()
    }

    pub fn find_post(&self, post_id: &str) -> Option<ForumPost> {
        self.state.borrow().posts.iter().find(|p| p.id == post_id).cloned()
    }

    pub fn find_reply(&self, reply_id: &str) -> Option<ForumReply> {
        self.state.borrow().replies.iter().find(|r| r.id == reply_id).cloned()
    }

    #[instrument(skip(self))]
    pub async fn load_all(&self) -> ForumLoad {
        let posts = reconcile(&self.posts, &self.cache, POSTS_CACHE_KEY).await;
        let replies = reconcile(&self.replies, &self.cache, REPLIES_CACHE_KEY).await;
        let load = ForumLoad { posts, replies };
        if matches!(load.notice(), Some(Notice::Banner(_))) {
            self.session.claim_banner();
        }
        self.state.send_replace(ForumState {
            posts: load.posts.items.clone(),
            replies: load.replies.items.clone(),
        });
        load
    }

    /// Newest first.
    pub fn list_posts(&self, filter: &PostFilter) -> Vec<ForumPost> {
        filter_posts(&self.state.borrow().posts, filter)
    }

    /// Oldest first.
    pub fn replies_for(&self, post_id: &str) -> Vec<ForumReply> {
        let mut replies: Vec<ForumReply> = self
            .state
            .borrow()
            .replies
            .iter()
            .filter(|r| r.post_id == post_id)
            .cloned()
            .collect();
        replies.sort_by_key(|r| r.created_at);
        replies
    }

    #[instrument(skip(self, author, body), fields(author = %author.id))]
    pub async fn create_post(
        &self,
        author: &ForumUser,
        game: GameTag,
        title: &str,
        body: &str,
    ) -> Result<Synced<ForumPost>> {
        let post = ForumPost {
            id: ids::post_id(),
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            game,
            title: non_blank("title", title)?,
            body: non_blank("content", body)?,
            created_at: ids::now_millis(),
            likes: Vec::new(),
            reply_count: 0,
        };

        let outcome = self.session.absorb("create_post", self.posts.put(&post).await);
        self.state.send_modify(|s| s.posts.push(post.clone()));
        self.persist().await;
        info!(post_id = %post.id, "post created");
        Ok(outcome.with(post))
    }

    #[instrument(skip(self, actor, body), fields(actor = %actor.id))]
    pub async fn edit_post(
        &self,
        actor: &ForumUser,
        post_id: &str,
        title: &str,
        body: &str,
        game: GameTag,
    ) -> Result<Synced<ForumPost>> {
        let title = non_blank("title", title)?;
        let body = non_blank("content", body)?;
        let mut post = self.find_post(post_id).ok_or_else(|| not_found("post", post_id))?;
        ensure_author(&post.author_id, actor, "post", post_id)?;

        post.title = title;
        post.body = body;
        post.game = game;
        let mut fields = Map::new();
        fields.insert("title".into(), json!(post.title));
        fields.insert("content".into(), json!(post.body));
        fields.insert("game".into(), json!(post.game));

        let outcome = self.session.absorb("edit_post", self.posts.patch(post_id, fields).await);
        self.state.send_modify(|s| {
            if let Some(p) = s.posts.iter_mut().find(|p| p.id == post_id) {
                *p = post.clone();
            }
        });
        self.persist().await;
        Ok(outcome.with(post))
    }

    /// Deletes the post and every reply pointing at it, remote and local, in
    /// one batch. Returns how many replies went with it.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_post(&self, actor: &ForumUser, post_id: &str) -> Result<Synced<usize>> {
        let post = self.find_post(post_id).ok_or_else(|| not_found("post", post_id))?;
        ensure_author(&post.author_id, actor, "post", post_id)?;

        let mut reply_ids: BTreeSet<String> = self
            .state
            .borrow()
            .replies
            .iter()
            .filter(|r| r.post_id == post_id)
            .map(|r| r.id.clone())
            .collect();
        // Raw documents, so replies that no longer decode are still swept.
        match self.replies.store().get_all(REPLIES_COLLECTION).await {
            Ok(docs) => reply_ids.extend(
                docs.into_iter()
                    .filter(|doc| doc.body.get("postId").and_then(|v| v.as_str()) == Some(post_id))
                    .map(|doc| doc.id),
            ),
            Err(err) => warn!(post_id, error = %err, "could not list remote replies, using local ones"),
        }

        let mut batch = WriteBatch::new();
        batch.delete(POSTS_COLLECTION, post_id);
        for id in &reply_ids {
            batch.delete(REPLIES_COLLECTION, id);
        }
        let outcome = self.session.absorb("delete_post", self.posts.store().commit(batch).await);

        self.state.send_modify(|s| {
            s.posts.retain(|p| p.id != post_id);
            s.replies.retain(|r| r.post_id != post_id);
        });
        self.persist().await;
        info!(post_id, replies = reply_ids.len(), "post deleted");
        Ok(outcome.with(reply_ids.len()))
    }

    #[instrument(skip(self, author, body), fields(author = %author.id))]
    pub async fn create_reply(
        &self,
        author: &ForumUser,
        post_id: &str,
        body: &str,
    ) -> Result<Synced<ForumReply>> {
        let body = non_blank("content", body)?;
        let post = self.find_post(post_id).ok_or_else(|| not_found("post", post_id))?;
        let reply = ForumReply {
            id: ids::reply_id(),
            post_id: post_id.to_string(),
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            body,
            created_at: ids::now_millis(),
            likes: Vec::new(),
        };

        let count = self.remote_reply_count(&post).await;
        let result = match encode(&reply) {
            Ok(doc) => {
                let mut batch = WriteBatch::new();
                batch.set(REPLIES_COLLECTION, &reply.id, doc);
                if let Some(count) = count {
                    batch.update(POSTS_COLLECTION, post_id, field("replyCount", json!(count.saturating_add(1))));
                }
                self.replies.store().commit(batch).await
            }
            Err(err) => Err(err),
        };
        let outcome = self.session.absorb("create_reply", result);

        self.state.send_modify(|s| {
            s.replies.push(reply.clone());
            if let Some(p) = s.posts.iter_mut().find(|p| p.id == post_id) {
                p.reply_count = p.reply_count.saturating_add(1);
            }
        });
        self.persist().await;
        Ok(outcome.with(reply))
    }

    #[instrument(skip(self, actor, body), fields(actor = %actor.id))]
    pub async fn edit_reply(
        &self,
        actor: &ForumUser,
        reply_id: &str,
        body: &str,
    ) -> Result<Synced<ForumReply>> {
        let body = non_blank("content", body)?;
        let mut reply = self.find_reply(reply_id).ok_or_else(|| not_found("reply", reply_id))?;
        ensure_author(&reply.author_id, actor, "reply", reply_id)?;
        reply.body = body;

        let result = self.replies.set_field(reply_id, "content", &reply.body).await;
        let outcome = self.session.absorb("edit_reply", result);
        self.state.send_modify(|s| {
            if let Some(r) = s.replies.iter_mut().find(|r| r.id == reply_id) {
                r.body = reply.body.clone();
            }
        });
        self.persist().await;
        Ok(outcome.with(reply))
    }

    /// Removes the reply and decrements its post's count, never below zero.
    /// Returns the parent's local reply count afterwards.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_reply(&self, actor: &ForumUser, reply_id: &str) -> Result<Synced<u32>> {
        let reply = self.find_reply(reply_id).ok_or_else(|| not_found("reply", reply_id))?;
        ensure_author(&reply.author_id, actor, "reply", reply_id)?;

        let mut batch = WriteBatch::new();
        batch.delete(REPLIES_COLLECTION, reply_id);
        if let Some(post) = self.find_post(&reply.post_id) {
            if let Some(count) = self.remote_reply_count(&post).await {
                batch.update(POSTS_COLLECTION, &post.id, field("replyCount", json!(count.saturating_sub(1))));
            }
        }
        let outcome = self.session.absorb("delete_reply", self.replies.store().commit(batch).await);

        let mut remaining = 0;
        self.state.send_modify(|s| {
            s.replies.retain(|r| r.id != reply_id);
            if let Some(p) = s.posts.iter_mut().find(|p| p.id == reply.post_id) {
                p.reply_count = p.reply_count.saturating_sub(1);
                remaining = p.reply_count;
            }
        });
        self.persist().await;
        Ok(outcome.with(remaining))
    }

    pub async fn toggle_post_like(&self, actor: &ForumUser, post_id: &str) -> Result<Synced<Vec<String>>> {
        let local = self.find_post(post_id);
        self.toggle_like(&self.posts, local, post_id, actor).await
    }

    pub async fn toggle_reply_like(&self, actor: &ForumUser, reply_id: &str) -> Result<Synced<Vec<String>>> {
        let local = self.find_reply(reply_id);
        self.toggle_like(&self.replies, local, reply_id, actor).await
    }

    #[instrument(skip(self, collection, local, actor), fields(kind = T::KIND, actor = %actor.id))]
    async fn toggle_like<T: Likeable>(
        &self,
        collection: &Collection<T>,
        local: Option<T>,
        id: &str,
        actor: &ForumUser,
    ) -> Result<Synced<Vec<String>>> {
        let current = match collection.fetch(id).await {
            Ok(Some(remote)) => remote.likes().to_vec(),
            Ok(None) => match &local {
                Some(item) => item.likes().to_vec(),
                None => return Err(not_found(T::KIND, id)),
            },
            Err(err) => {
                warn!(id, error = %err, "like read failed, toggling the local copy");
                match &local {
                    Some(item) => item.likes().to_vec(),
                    None => return Err(not_found(T::KIND, id)),
                }
            }
        };
        let next = toggle_membership(&current, Actor::from(actor));

        let result = collection.set_field(id, "likes", &next).await;
        let outcome = self.session.absorb("toggle_like", result);
        self.state.send_modify(|s| {
            if let Some(item) = T::in_state(s).iter_mut().find(|item| item.key() == id) {
                *item.likes_mut() = next.clone();
            }
        });
        self.persist().await;
        Ok(outcome.with(next))
    }

    /// Reply count as the remote sees it, falling back to the local copy when
    /// the read fails. `None` when the remote has no such post, in which case
    /// there is no count to update.
    async fn remote_reply_count(&self, post: &ForumPost) -> Option<u32> {
        match self.posts.fetch(&post.id).await {
            Ok(Some(remote)) => Some(remote.reply_count),
            Ok(None) => {
                debug!(post_id = %post.id, "post missing remotely, skipping reply count");
                None
            }
            Err(err) => {
                warn!(post_id = %post.id, error = %err, "reply count read failed, using local count");
                Some(post.reply_count)
            }
        }
    }

    async fn persist(&self) {
        let state = self.snapshot();
        self.cache.write(POSTS_CACHE_KEY, &state.posts).await;
        self.cache.write(REPLIES_CACHE_KEY, &state.replies).await;
    }
}

fn non_blank(what: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{what} cannot be empty")));
    }
    Ok(value.to_string())
}

fn ensure_author(author_id: &str, actor: &ForumUser, kind: &str, id: &str) -> Result<()> {
    if author_id == actor.id {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!(
            "{} is not the author of {kind} {id}",
            actor.id
        )))
    }
}

fn not_found(kind: &str, id: &str) -> AppError {
    AppError::NotFound(kind.to_string(), id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hq_core::{StoreError, StoreResult};
    use hq_store_memory::{MemoryDocumentStore, MemoryLocalStore};

    struct Fixture {
        remote: Arc<MemoryDocumentStore>,
        local: Arc<MemoryLocalStore>,
        repo: ForumRepository,
    }

    fn fixture() -> Fixture {
        let remote = Arc::new(MemoryDocumentStore::new());
        let local = Arc::new(MemoryLocalStore::new());
        let repo = ForumRepository::new(
            remote.clone(),
            SnapshotCache::new(local.clone()),
            Arc::new(Session::new()),
        );
        Fixture { remote, local, repo }
    }

    fn user(name: &str) -> ForumUser {
        ForumUser { id: name.into(), name: name.into(), game: GameTag::Genshin }
    }

    async fn remote_reply_count(remote: &MemoryDocumentStore, post_id: &str) -> StoreResult<u64> {
        let doc = remote.get(POSTS_COLLECTION, post_id).await?;
        Ok(doc.and_then(|d| d.body["replyCount"].as_u64()).unwrap_or_default())
    }

    #[tokio::test]
    async fn delete_post_takes_exactly_its_replies() {
        let fx = fixture();
        let sam = user("Sam");
        let keep = fx.repo.create_post(&sam, GameTag::Genshin, "keep", "x").await.unwrap().value;
        let gone = fx.repo.create_post(&sam, GameTag::StarRail, "gone", "y").await.unwrap().value;
        fx.repo.create_reply(&sam, &keep.id, "stays").await.unwrap();
        fx.repo.create_reply(&sam, &gone.id, "a").await.unwrap();
        fx.repo.create_reply(&sam, &gone.id, "b").await.unwrap();
        // Reply only the remote knows about.
        fx.remote
            .seed(
                REPLIES_COLLECTION,
                "reply-remote",
                json!({ "id": "reply-remote", "postId": gone.id, "userId": "Kai", "content": "c" }),
            )
            .await;

        let removed = fx.repo.delete_post(&sam, &gone.id).await.unwrap();
        assert!(removed.is_synced());
        assert_eq!(removed.value, 3);

        let remote_replies = fx.remote.documents(REPLIES_COLLECTION).await;
        assert_eq!(remote_replies.len(), 1);
        assert_eq!(remote_replies[0].body["postId"], json!(keep.id));
        assert_eq!(fx.remote.documents(POSTS_COLLECTION).await.len(), 1);

        let state = fx.repo.snapshot();
        assert_eq!(state.posts.len(), 1);
        assert!(state.replies.iter().all(|r| r.post_id == keep.id));
        let cached: Vec<ForumReply> = SnapshotCache::new(fx.local.clone()).read(REPLIES_CACHE_KEY).await;
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn reply_round_trip_leaves_count_unchanged() {
        let fx = fixture();
        let sam = user("Sam");
        let post = fx.repo.create_post(&sam, GameTag::Genshin, "t", "b").await.unwrap().value;

        let reply = fx.repo.create_reply(&sam, &post.id, "hi").await.unwrap();
        assert!(reply.is_synced());
        assert_eq!(fx.repo.find_post(&post.id).unwrap().reply_count, 1);
        assert_eq!(remote_reply_count(&fx.remote, &post.id).await.unwrap(), 1);

        let remaining = fx.repo.delete_reply(&sam, &reply.value.id).await.unwrap();
        assert_eq!(remaining.value, 0);
        assert_eq!(remote_reply_count(&fx.remote, &post.id).await.unwrap(), 0);
        assert!(fx.remote.documents(REPLIES_COLLECTION).await.is_empty());
    }

    #[tokio::test]
    async fn replies_reach_remote_for_a_post_created_offline() {
        let fx = fixture();
        let sam = user("Sam");
        fx.remote.fail_all(StoreError::Unavailable("offline".into())).await;
        let post = fx.repo.create_post(&sam, GameTag::Genshin, "t", "b").await.unwrap().value;
        fx.remote.heal().await;

        let reply = fx.repo.create_reply(&sam, &post.id, "hi").await.unwrap();
        assert!(reply.is_synced());
        let remote_replies = fx.remote.documents(REPLIES_COLLECTION).await;
        assert_eq!(remote_replies.len(), 1);
        assert_eq!(remote_replies[0].id, reply.value.id);
        assert!(fx.remote.documents(POSTS_COLLECTION).await.is_empty());
        assert_eq!(fx.repo.find_post(&post.id).unwrap().reply_count, 1);

        let remaining = fx.repo.delete_reply(&sam, &reply.value.id).await.unwrap();
        assert!(remaining.is_synced());
        assert_eq!(remaining.value, 0);
        assert!(fx.remote.documents(REPLIES_COLLECTION).await.is_empty());
    }

    #[tokio::test]
    async fn reply_count_never_goes_negative() {
        let fx = fixture();
        let sam = user("Sam");
        let post = fx.repo.create_post(&sam, GameTag::Genshin, "t", "b").await.unwrap().value;
        let reply = fx.repo.create_reply(&sam, &post.id, "hi").await.unwrap().value;
        // Remote count already drifted to zero.
        fx.remote
            .update(POSTS_COLLECTION, &post.id, field("replyCount", json!(0)))
            .await
            .unwrap();

        fx.repo.delete_reply(&sam, &reply.id).await.unwrap();
        assert_eq!(remote_reply_count(&fx.remote, &post.id).await.unwrap(), 0);
        assert_eq!(fx.repo.find_post(&post.id).unwrap().reply_count, 0);
    }

    #[tokio::test]
    async fn double_toggle_restores_likes() {
        let fx = fixture();
        let sam = user("Sam");
        let kai = user("Kai");
        let post = fx.repo.create_post(&sam, GameTag::Genshin, "t", "b").await.unwrap().value;
        fx.repo.toggle_post_like(&kai, &post.id).await.unwrap();

        let before = fx.repo.find_post(&post.id).unwrap().likes;
        let once = fx.repo.toggle_post_like(&sam, &post.id).await.unwrap().value;
        assert_eq!(once, vec!["Kai".to_string(), "Sam".to_string()]);
        let twice = fx.repo.toggle_post_like(&sam, &post.id).await.unwrap().value;
        assert_eq!(twice, before);
        assert_eq!(fx.repo.find_post(&post.id).unwrap().likes, before);
    }

    #[tokio::test]
    async fn toggle_clears_legacy_reply_like() {
        let fx = fixture();
        let sam = user("Sam");
        let post = fx.repo.create_post(&sam, GameTag::Genshin, "t", "b").await.unwrap().value;
        let reply = fx.repo.create_reply(&sam, &post.id, "hi").await.unwrap().value;
        fx.remote
            .update(REPLIES_COLLECTION, &reply.id, field("likes", json!(["user-Sam-1700000000"])))
            .await
            .unwrap();

        let likes = fx.repo.toggle_reply_like(&sam, &reply.id).await.unwrap().value;
        assert!(likes.is_empty());
    }

    #[tokio::test]
    async fn toggle_falls_back_to_local_copy_when_remote_is_down() {
        let fx = fixture();
        let sam = user("Sam");
        let post = fx.repo.create_post(&sam, GameTag::Genshin, "t", "b").await.unwrap().value;
        fx.remote.fail_all(StoreError::Unavailable("offline".into())).await;

        let likes = fx.repo.toggle_post_like(&sam, &post.id).await.unwrap();
        assert!(!likes.is_synced());
        assert_eq!(likes.value, vec!["Sam".to_string()]);
        assert_eq!(fx.repo.find_post(&post.id).unwrap().likes, likes.value);
    }

    #[tokio::test]
    async fn toggle_on_unknown_entity_is_not_found() {
        let fx = fixture();
        let err = fx.repo.toggle_post_like(&user("Sam"), "post-nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(kind, _) if kind == "post"));
    }

    #[tokio::test]
    async fn only_the_author_may_edit_or_delete() {
        let fx = fixture();
        let sam = user("Sam");
        let kai = user("Kai");
        let post = fx.repo.create_post(&sam, GameTag::Genshin, "t", "b").await.unwrap().value;

        let err = fx
            .repo
            .edit_post(&kai, &post.id, "new", "new", GameTag::Ticket)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(matches!(
            fx.repo.delete_post(&kai, &post.id).await.unwrap_err(),
            AppError::Unauthorized(_)
        ));

        let edited = fx
            .repo
            .edit_post(&sam, &post.id, " Patch notes ", "body", GameTag::Ticket)
            .await
            .unwrap()
            .value;
        assert_eq!(edited.title, "Patch notes");
        let doc = fx.remote.get(POSTS_COLLECTION, &post.id).await.unwrap().unwrap();
        assert_eq!(doc.body["game"], "Ticket");
    }

    #[tokio::test]
    async fn blank_post_is_rejected() {
        let fx = fixture();
        let err = fx.repo.create_post(&user("Sam"), GameTag::Genshin, " ", "b").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(fx.repo.snapshot().posts.is_empty());
    }

    #[tokio::test]
    async fn listing_orders_posts_and_replies() {
        let fx = fixture();
        let remote = &fx.remote;
        for (id, ts) in [("post-a", 1), ("post-b", 3), ("post-c", 2)] {
            remote
                .seed(
                    POSTS_COLLECTION,
                    id,
                    json!({ "id": id, "userId": "Sam", "userName": "Sam", "game": "Genshin Impact",
                            "title": id, "content": "", "timestamp": ts }),
                )
                .await;
        }
        for (id, ts) in [("reply-2", 20), ("reply-1", 10)] {
            remote
                .seed(
                    REPLIES_COLLECTION,
                    id,
                    json!({ "id": id, "postId": "post-a", "userId": "Sam", "userName": "Sam",
                            "content": "", "timestamp": ts }),
                )
                .await;
        }
        fx.repo.load_all().await;

        let titles: Vec<String> = fx.repo.list_posts(&PostFilter::default()).into_iter().map(|p| p.title).collect();
        assert_eq!(titles, ["post-b", "post-c", "post-a"]);
        let replies: Vec<String> = fx.repo.replies_for("post-a").into_iter().map(|r| r.id).collect();
        assert_eq!(replies, ["reply-1", "reply-2"]);
        assert!(fx.repo.replies_for("post-b").is_empty());
    }

    #[tokio::test]
    async fn remote_outage_keeps_local_forum_working() {
        let fx = fixture();
        fx.remote.fail_all(StoreError::PermissionDenied("rules".into())).await;
        let sam = user("Sam");

        let post = fx.repo.create_post(&sam, GameTag::Genshin, "t", "b").await.unwrap();
        assert_eq!(post.notice, Some(Notice::permission_banner()));
        let reply = fx.repo.create_reply(&sam, &post.value.id, "r").await.unwrap();
        assert!(reply.notice.is_none());
        assert_eq!(fx.repo.find_post(&post.value.id).unwrap().reply_count, 1);

        let cached: Vec<ForumPost> = SnapshotCache::new(fx.local.clone()).read(POSTS_CACHE_KEY).await;
        assert_eq!(cached[0].reply_count, 1);
    }
}
