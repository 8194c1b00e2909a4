//! Id and timestamp minting.
//!
//! UUID v7 embeds a millisecond timestamp plus random bits.

use chrono::Utc;
use hq_core::Game;
use uuid::Uuid;

pub fn profile_id(game: Game) -> String {
    format!("{}-{}", game.id_prefix(), Uuid::now_v7().simple())
}

pub fn post_id() -> String {
    format!("post-{}", Uuid::now_v7().simple())
}

pub fn reply_id() -> String {
    format!("reply-{}", Uuid::now_v7().simple())
}

/// Epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
