//! # hq-api Handlers
//!
//! Each handler maps onto exactly one repository operation.

pub mod forum;
pub mod profiles;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::responses::LoadBody;
use crate::state::AppState;

#[derive(Serialize)]
struct StartupLoad {
    genshin: LoadBody<hq_core::Profile<hq_core::GenshinRecord>>,
    star_rail: LoadBody<hq_core::Profile<hq_core::StarRailRecord>>,
    posts: LoadBody<hq_core::ForumPost>,
    replies: LoadBody<hq_core::ForumReply>,
}

/// Reconciles every collection, as the front end does on start.
pub async fn load_everything(data: web::Data<AppState>) -> HttpResponse {
    let genshin = data.genshin.load_all().await;
    let star_rail = data.star_rail.load_all().await;
    let forum = data.forum.load_all().await;
    HttpResponse::Ok().json(StartupLoad {
        genshin: genshin.into(),
        star_rail: star_rail.into(),
        posts: forum.posts.into(),
        replies: forum.replies.into(),
    })
}
