//! # Domain Models
//!
//! These structs represent the core entities of HOYO HQ.
//! Field names on the wire follow the documents already stored remotely,
//! so existing collections deserialize without a migration.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// One of the two tracked games. Each game owns its own profile collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Game {
    Genshin,
    StarRail,
}

impl Game {
    /// Remote collection holding this game's profiles.
    pub fn profiles_collection(self) -> &'static str {
        match self {
            Game::Genshin => "users",
            Game::StarRail => "hsr-users",
        }
    }

    /// Local snapshot key for this game's profile list.
    pub fn cache_key(self) -> &'static str {
        match self {
            Game::Genshin => "genshin-users",
            Game::StarRail => "hsr-users",
        }
    }

    /// Prefix used when minting profile ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Game::Genshin => "gi",
            Game::StarRail => "hsr",
        }
    }

    pub fn tag(self) -> GameTag {
        match self {
            Game::Genshin => GameTag::Genshin,
            Game::StarRail => GameTag::StarRail,
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Game::Genshin => f.write_str("genshin"),
            Game::StarRail => f.write_str("star-rail"),
        }
    }
}

impl FromStr for Game {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "genshin" | "gi" => Ok(Game::Genshin),
            "star-rail" | "hsr" => Ok(Game::StarRail),
            other => Err(AppError::ValidationError(format!("unknown game '{other}'"))),
        }
    }
}

/// Tag attached to forum posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameTag {
    #[serde(rename = "Genshin Impact")]
    Genshin,
    #[serde(rename = "Honkai: Star Rail")]
    StarRail,
    #[serde(rename = "Ticket")]
    Ticket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Unowned,
    #[serde(rename = "WIP")]
    Wip,
    Built,
}

/// Per-character state attached to a profile.
///
/// Each game has its own record shape; the repository is generic over this
/// trait so both games share one reconciliation path.
pub trait CharacterRecord:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Partial update applied on top of an existing or default record.
    type Patch: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    const GAME: Game;

    /// The record used when a profile has none for `character_id`.
    fn default_for(character_id: &str) -> Self;

    fn status(&self) -> Status;

    /// Rejects out-of-range numeric fields before any I/O happens.
    fn validate_patch(patch: &Self::Patch) -> Result<()>;

    /// Shallow merge: every field present in `patch` wins.
    fn apply(&mut self, patch: &Self::Patch);
}

/// Genshin Impact character record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenshinRecord {
    pub character_id: String,
    pub status: Status,
    /// 0..=6
    pub constellation: u8,
    /// 0..=5, 0 meaning no refinement tracked
    pub refinement: u8,
    #[serde(default = "not_applicable")]
    pub weapon_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenshinPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constellation: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinement: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weapon_name: Option<String>,
}

impl CharacterRecord for GenshinRecord {
    type Patch = GenshinPatch;

    const GAME: Game = Game::Genshin;

    fn default_for(character_id: &str) -> Self {
        Self {
            character_id: character_id.to_string(),
            status: Status::Unowned,
            constellation: 0,
            refinement: 0,
            weapon_name: not_applicable(),
        }
    }

    fn status(&self) -> Status {
        self.status
    }

    fn validate_patch(patch: &GenshinPatch) -> Result<()> {
        check_range("constellation", patch.constellation, 0, 6)?;
        check_range("refinement", patch.refinement, 0, 5)
    }

    fn apply(&mut self, patch: &GenshinPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(c) = patch.constellation {
            self.constellation = c;
        }
        if let Some(r) = patch.refinement {
            self.refinement = r;
        }
        if let Some(name) = &patch.weapon_name {
            self.weapon_name = name.clone();
        }
    }
}

/// Honkai: Star Rail character record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarRailRecord {
    pub character_id: String,
    pub status: Status,
    /// 0..=6 (E0 to E6)
    pub eidolon: u8,
    /// 1..=5 (S1 to S5)
    pub superposition: u8,
    #[serde(default = "not_applicable")]
    pub light_cone_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StarRailPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eidolon: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superposition: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_cone_name: Option<String>,
}

impl CharacterRecord for StarRailRecord {
    type Patch = StarRailPatch;

    const GAME: Game = Game::StarRail;

    fn default_for(character_id: &str) -> Self {
        Self {
            character_id: character_id.to_string(),
            status: Status::Unowned,
            eidolon: 0,
            superposition: 1,
            light_cone_name: not_applicable(),
        }
    }

    fn status(&self) -> Status {
        self.status
    }

    fn validate_patch(patch: &StarRailPatch) -> Result<()> {
        check_range("eidolon", patch.eidolon, 0, 6)?;
        check_range("superposition", patch.superposition, 1, 5)
    }

    fn apply(&mut self, patch: &StarRailPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(e) = patch.eidolon {
            self.eidolon = e;
        }
        if let Some(s) = patch.superposition {
            self.superposition = s;
        }
        if let Some(name) = &patch.light_cone_name {
            self.light_cone_name = name.clone();
        }
    }
}

fn not_applicable() -> String {
    "N/A".to_string()
}

fn check_range(field: &str, value: Option<u8>, min: u8, max: u8) -> Result<()> {
    match value {
        Some(v) if v < min || v > max => Err(AppError::ValidationError(format!(
            "{field} must be between {min} and {max}, got {v}"
        ))),
        _ => Ok(()),
    }
}

/// A named tracking identity within one game. Not an authenticated account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "R: CharacterRecord"))]
pub struct Profile<R> {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub characters: BTreeMap<String, R>,
}

impl<R: CharacterRecord> Profile<R> {
    pub fn new(id: String, name: String) -> Self {
        Self { id, name, characters: BTreeMap::new() }
    }

    /// The stored record for `character_id`, or the game's default.
    pub fn record_or_default(&self, character_id: &str) -> R {
        self.characters
            .get(character_id)
            .cloned()
            .unwrap_or_else(|| R::default_for(character_id))
    }

    /// Progress summary against a roster of `roster_size` characters.
    pub fn stats(&self, roster_size: usize) -> ProfileStats {
        let built = self.characters.values().filter(|r| r.status() == Status::Built).count();
        let wip = self.characters.values().filter(|r| r.status() == Status::Wip).count();
        let tracked = built + wip;
        ProfileStats {
            tracked,
            built,
            wip,
            unowned: roster_size.saturating_sub(tracked),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub tracked: usize,
    pub built: usize,
    pub wip: usize,
    pub unowned: usize,
}

/// A forum thread opener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumPost {
    pub id: String,
    #[serde(rename = "userId")]
    pub author_id: String,
    #[serde(rename = "userName")]
    pub author_name: String,
    pub game: GameTag,
    pub title: String,
    #[serde(rename = "content")]
    pub body: String,
    /// Epoch milliseconds
    #[serde(rename = "timestamp")]
    pub created_at: i64,
    /// Liker identifiers, in the order they were added
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(rename = "replyCount", default)]
    pub reply_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumReply {
    pub id: String,
    #[serde(rename = "postId")]
    pub post_id: String,
    #[serde(rename = "userId")]
    pub author_id: String,
    #[serde(rename = "userName")]
    pub author_name: String,
    #[serde(rename = "content")]
    pub body: String,
    #[serde(rename = "timestamp")]
    pub created_at: i64,
    #[serde(default)]
    pub likes: Vec<String>,
}

/// Forum identity shared across both games. `id` is the profile name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumUser {
    pub id: String,
    pub name: String,
    /// Game the identity was first seen in, used as the default post tag
    pub game: GameTag,
}

/// Anything that owns a stable document id.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl<R> Keyed for Profile<R> {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for ForumPost {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for ForumReply {
    fn key(&self) -> &str {
        &self.id
    }
}
