//! # Domain Merge Logic
//!
//! Pure functions over the models: no I/O, no shared state.

use std::collections::HashSet;

use crate::models::{CharacterRecord, ForumPost, ForumUser, GameTag, Profile};

/// Shallow merge of `patch` onto `existing`, or onto the game's default
/// record for `character_id` when there is none. Patch fields win.
pub fn merge_character_patch<R: CharacterRecord>(
    existing: Option<&R>,
    character_id: &str,
    patch: &R::Patch,
) -> R {
    let mut record = existing.cloned().unwrap_or_else(|| R::default_for(character_id));
    record.apply(patch);
    record
}

/// How a stored like entry relates to an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// The entry is exactly the actor's current id.
    Current(String),
    /// An older id format that embeds the display name.
    LegacyEmbeddedName(String),
}

/// Who is toggling a like.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

impl<'a> Actor<'a> {
    pub fn new(id: &'a str, name: &'a str) -> Self {
        Self { id, name }
    }

    /// Classifies `entry` against this actor, `None` when it belongs to
    /// someone else.
    ///
    /// Substring matching can claim another user's legacy entry when this
    /// actor's name is contained in it. Kept as-is for older data.
    pub fn identify(&self, entry: &str) -> Option<Identifier> {
        if entry == self.id {
            Some(Identifier::Current(entry.to_string()))
        } else if !self.name.is_empty() && entry.contains(self.name) {
            Some(Identifier::LegacyEmbeddedName(entry.to_string()))
        } else {
            None
        }
    }

    pub fn has_liked(&self, likes: &[String]) -> bool {
        likes.iter().any(|entry| self.identify(entry).is_some())
    }
}

impl<'a> From<&'a ForumUser> for Actor<'a> {
    fn from(user: &'a ForumUser) -> Self {
        Actor::new(&user.id, &user.name)
    }
}

/// Flips the actor's like.
///
/// Liked (by either form) removes every matching entry; otherwise the
/// actor's current id is appended.
pub fn toggle_membership(likes: &[String], actor: Actor<'_>) -> Vec<String> {
    if actor.has_liked(likes) {
        likes
            .iter()
            .filter(|entry| actor.identify(entry).is_none())
            .cloned()
            .collect()
    } else {
        let mut next = likes.to_vec();
        next.push(actor.id.to_string());
        next
    }
}

/// Builds the forum identity list from both games' profiles.
///
/// Genshin profiles are enumerated first; on a name collision the first
/// one seen wins.
pub fn dedupe_by_name<A, B>(genshin: &[Profile<A>], star_rail: &[Profile<B>]) -> Vec<ForumUser> {
    let mut seen = HashSet::new();
    let named = genshin
        .iter()
        .map(|p| (p.name.as_str(), GameTag::Genshin))
        .chain(star_rail.iter().map(|p| (p.name.as_str(), GameTag::StarRail)));

    let mut users = Vec::new();
    for (name, game) in named {
        if seen.insert(name) {
            users.push(ForumUser {
                id: name.to_string(),
                name: name.to_string(),
                game,
            });
        }
    }
    users
}

/// Forum list filter: optional game tag plus a case-insensitive search over
/// title, body and author name.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub game: Option<GameTag>,
    pub query: Option<String>,
}

impl PostFilter {
    pub fn matches(&self, post: &ForumPost) -> bool {
        if self.game.is_some_and(|game| game != post.game) {
            return false;
        }
        match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let q = q.to_lowercase();
                post.title.to_lowercase().contains(&q)
                    || post.body.to_lowercase().contains(&q)
                    || post.author_name.to_lowercase().contains(&q)
            }
        }
    }
}

/// Newest first, then filtered.
pub fn filter_posts(posts: &[ForumPost], filter: &PostFilter) -> Vec<ForumPost> {
    let mut out: Vec<ForumPost> = posts.iter().filter(|p| filter.matches(p)).cloned().collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}
