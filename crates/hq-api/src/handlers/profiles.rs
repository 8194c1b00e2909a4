//! Profile routes, generic over the game's character record.

use actix_web::{web, HttpResponse};
use hq_core::{AppError, CharacterRecord};
use hq_sync::ProfileRepository;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::responses::{LoadBody, SyncedBody};
use crate::state::{AppState, ProfilesFor};

#[derive(Debug, Deserialize)]
pub struct ProfileName {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Profile currently selected in the view
    pub current: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// Number of characters in the game's roster
    pub roster: usize,
}

fn repo<R: CharacterRecord>(state: &AppState) -> &ProfileRepository<R>
where
    AppState: ProfilesFor<R>,
{
    <AppState as ProfilesFor<R>>::profiles(state)
}

pub async fn list<R: CharacterRecord>(data: web::Data<AppState>) -> HttpResponse
where
    AppState: ProfilesFor<R>,
{
    HttpResponse::Ok().json(repo::<R>(&data).snapshot())
}

pub async fn load<R: CharacterRecord>(data: web::Data<AppState>) -> HttpResponse
where
    AppState: ProfilesFor<R>,
{
    let loaded = repo::<R>(&data).load_all().await;
    HttpResponse::Ok().json(LoadBody::from(loaded))
}

pub async fn create<R: CharacterRecord>(
    data: web::Data<AppState>,
    body: web::Json<ProfileName>,
) -> ApiResult<HttpResponse>
where
    AppState: ProfilesFor<R>,
{
    let created = repo::<R>(&data).create_profile(&body.name).await?;
    Ok(HttpResponse::Created().json(SyncedBody::from(created)))
}

pub async fn get<R: CharacterRecord>(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse>
where
    AppState: ProfilesFor<R>,
{
    let id = path.into_inner();
    let profile = repo::<R>(&data)
        .find(&id)
        .ok_or_else(|| AppError::NotFound(format!("{} profile", R::GAME), id))?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn stats<R: CharacterRecord>(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<StatsQuery>,
) -> ApiResult<HttpResponse>
where
    AppState: ProfilesFor<R>,
{
    let id = path.into_inner();
    let profile = repo::<R>(&data)
        .find(&id)
        .ok_or_else(|| AppError::NotFound(format!("{} profile", R::GAME), id))?;
    Ok(HttpResponse::Ok().json(profile.stats(query.roster)))
}

pub async fn rename<R: CharacterRecord>(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ProfileName>,
) -> ApiResult<HttpResponse>
where
    AppState: ProfilesFor<R>,
{
    let renamed = repo::<R>(&data).rename_profile(&path, &body.name).await?;
    Ok(HttpResponse::Ok().json(SyncedBody::from(renamed)))
}

pub async fn delete<R: CharacterRecord>(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DeleteQuery>,
) -> ApiResult<HttpResponse>
where
    AppState: ProfilesFor<R>,
{
    let next = repo::<R>(&data)
        .delete_profile(&path, query.current.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(SyncedBody::from(next)))
}

pub async fn reset<R: CharacterRecord>(data: web::Data<AppState>) -> HttpResponse
where
    AppState: ProfilesFor<R>,
{
    let removed = repo::<R>(&data).reset_all().await;
    HttpResponse::Ok().json(SyncedBody::from(removed))
}

pub async fn update_character<R: CharacterRecord>(
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
    patch: web::Json<R::Patch>,
) -> ApiResult<HttpResponse>
where
    AppState: ProfilesFor<R>,
{
    let (profile_id, character_id) = path.into_inner();
    let record = repo::<R>(&data)
        .update_character(&profile_id, &character_id, &patch)
        .await?;
    Ok(HttpResponse::Ok().json(SyncedBody::from(record)))
}
