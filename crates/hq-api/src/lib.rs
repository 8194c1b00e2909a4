//! # hq-api
//!
//! JSON routes over the HOYO HQ repositories.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod state;

use actix_web::{error::JsonPayloadError, error::QueryPayloadError, web, HttpRequest, Scope};
use hq_core::{AppError, CharacterRecord, GenshinRecord, StarRailRecord};

use crate::error::ApiError;
use crate::handlers::{forum, profiles};
pub use crate::state::{AppState, ProfilesFor};

/// Mounts every route under `/api`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::scope("/api")
                .route("/load", web::post().to(handlers::load_everything))
                .service(profile_scope::<GenshinRecord>())
                .service(profile_scope::<StarRailRecord>())
                .service(forum_scope()),
        );
}

fn profile_scope<R: CharacterRecord>() -> Scope
where
    AppState: ProfilesFor<R>,
{
    web::scope(&format!("/{}/profiles", R::GAME))
        .route("", web::get().to(profiles::list::<R>))
        .route("", web::post().to(profiles::create::<R>))
        .route("", web::delete().to(profiles::reset::<R>))
        .route("/load", web::post().to(profiles::load::<R>))
        .route("/{id}", web::get().to(profiles::get::<R>))
        .route("/{id}", web::put().to(profiles::rename::<R>))
        .route("/{id}", web::delete().to(profiles::delete::<R>))
        .route("/{id}/stats", web::get().to(profiles::stats::<R>))
        .route(
            "/{id}/characters/{character_id}",
            web::patch().to(profiles::update_character::<R>),
        )
}

fn forum_scope() -> Scope {
    web::scope("/forum")
        .route("/load", web::post().to(forum::load))
        .route("/users", web::get().to(forum::users))
        .route("/users/current", web::get().to(forum::current_user))
        .route("/users/current", web::put().to(forum::select_user))
        .route("/posts", web::get().to(forum::list_posts))
        .route("/posts", web::post().to(forum::create_post))
        .route("/posts/{id}", web::put().to(forum::edit_post))
        .route("/posts/{id}", web::delete().to(forum::delete_post))
        .route("/posts/{id}/like", web::post().to(forum::toggle_post_like))
        .route("/posts/{id}/replies", web::get().to(forum::replies))
        .route("/posts/{id}/replies", web::post().to(forum::create_reply))
        .route("/replies/{id}", web::put().to(forum::edit_reply))
        .route("/replies/{id}", web::delete().to(forum::delete_reply))
        .route("/replies/{id}/like", web::post().to(forum::toggle_reply_like))
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError(AppError::ValidationError(err.to_string())).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError(AppError::ValidationError(err.to_string())).into()
}
