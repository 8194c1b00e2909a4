//! Forum routes. Mutations act as the currently selected forum user.

use actix_web::{web, HttpResponse};
use hq_core::{GameTag, PostFilter};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::responses::{LoadBody, SyncedBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PostQuery {
    pub game: Option<GameTag>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewPost {
    /// Defaults to the game the acting user was first seen in
    pub game: Option<GameTag>,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct EditPost {
    pub game: GameTag,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyBody {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectUser {
    pub id: String,
}

pub async fn load(data: web::Data<AppState>) -> HttpResponse {
    let loaded = data.forum.load_all().await;
    let notice = loaded.notice();
    HttpResponse::Ok().json(json!({
        "posts": LoadBody::from(loaded.posts),
        "replies": LoadBody::from(loaded.replies),
        "notice": notice,
    }))
}

pub async fn users(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.forum_users())
}

pub async fn current_user(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.acting_user().await?))
}

pub async fn select_user(
    data: web::Data<AppState>,
    body: web::Json<SelectUser>,
) -> ApiResult<HttpResponse> {
    let user = data.identity.select(&data.forum_users(), &body.id).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn list_posts(data: web::Data<AppState>, query: web::Query<PostQuery>) -> HttpResponse {
    let query = query.into_inner();
    let filter = PostFilter { game: query.game, query: query.q };
    HttpResponse::Ok().json(data.forum.list_posts(&filter))
}

pub async fn create_post(
    data: web::Data<AppState>,
    body: web::Json<NewPost>,
) -> ApiResult<HttpResponse> {
    let author = data.acting_user().await?;
    let game = body.game.unwrap_or(author.game);
    let post = data.forum.create_post(&author, game, &body.title, &body.content).await?;
    Ok(HttpResponse::Created().json(SyncedBody::from(post)))
}

pub async fn edit_post(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<EditPost>,
) -> ApiResult<HttpResponse> {
    let actor = data.acting_user().await?;
    let post = data
        .forum
        .edit_post(&actor, &path, &body.title, &body.content, body.game)
        .await?;
    Ok(HttpResponse::Ok().json(SyncedBody::from(post)))
}

pub async fn delete_post(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let actor = data.acting_user().await?;
    let removed = data.forum.delete_post(&actor, &path).await?;
    Ok(HttpResponse::Ok().json(SyncedBody::from(removed)))
}

pub async fn toggle_post_like(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = data.acting_user().await?;
    let likes = data.forum.toggle_post_like(&actor, &path).await?;
    Ok(HttpResponse::Ok().json(SyncedBody::from(likes)))
}

pub async fn replies(data: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    HttpResponse::Ok().json(data.forum.replies_for(&path))
}

pub async fn create_reply(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ReplyBody>,
) -> ApiResult<HttpResponse> {
    let author = data.acting_user().await?;
    let reply = data.forum.create_reply(&author, &path, &body.content).await?;
    Ok(HttpResponse::Created().json(SyncedBody::from(reply)))
}

pub async fn edit_reply(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ReplyBody>,
) -> ApiResult<HttpResponse> {
    let actor = data.acting_user().await?;
    let reply = data.forum.edit_reply(&actor, &path, &body.content).await?;
    Ok(HttpResponse::Ok().json(SyncedBody::from(reply)))
}

pub async fn delete_reply(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let actor = data.acting_user().await?;
    let remaining = data.forum.delete_reply(&actor, &path).await?;
    Ok(HttpResponse::Ok().json(SyncedBody::from(remaining)))
}

pub async fn toggle_reply_like(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = data.acting_user().await?;
    let likes = data.forum.toggle_reply_like(&actor, &path).await?;
    Ok(HttpResponse::Ok().json(SyncedBody::from(likes)))
}
