//! # HOYO HQ Binary
//!
//! Assembles the stores chosen at compile time (cargo features) and at run
//! time (settings), then serves the JSON API.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use hq_api::middleware::{cors_policy, standard_middleware};
use hq_api::{configure_routes, AppState};
use hq_configs::{CacheSettings, LogSettings, RemoteBackend, RemoteSettings, Settings};
use hq_core::{DocumentStore, LocalStore};
use hq_store_memory::MemoryDocumentStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log);
    settings.log_summary();

    // Local first: opening the cache file creates the data directory.
    let local = local_store(&settings.cache).await?;
    let remote = remote_store(&settings.remote).await?;
    let state = web::Data::new(AppState::new(remote, local));

    // Warm the working sets so reads are answered before the first load call.
    let genshin = state.genshin.load_all().await;
    let star_rail = state.star_rail.load_all().await;
    let forum = state.forum.load_all().await;
    info!(
        genshin = ?genshin.source,
        star_rail = ?star_rail.source,
        posts = ?forum.posts.source,
        replies = ?forum.replies.source,
        "initial load finished"
    );

    let (host, port) = settings.bind_address();
    info!("HOYO HQ starting on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(cors_policy())
            .wrap(standard_middleware())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind((host, port))?
    .run()
    .await?;
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn remote_store(settings: &RemoteSettings) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match settings.backend {
        RemoteBackend::Memory => {
            warn!("using the in-memory remote store; data is lost on exit");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        #[cfg(feature = "store-sqlite")]
        RemoteBackend::Sqlite => {
            let store = hq_store_sqlite::SqliteDocumentStore::new(&settings.url)
                .await
                .with_context(|| format!("opening {}", settings.url))?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "store-sqlite"))]
        RemoteBackend::Sqlite => anyhow::bail!("built without the `store-sqlite` feature"),
    }
}

#[cfg(feature = "cache-file")]
async fn local_store(settings: &CacheSettings) -> anyhow::Result<Arc<dyn LocalStore>> {
    let store = hq_cache_file::FileLocalStore::open(&settings.path)
        .await
        .with_context(|| format!("opening local cache {}", settings.path.display()))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "cache-file"))]
async fn local_store(_settings: &CacheSettings) -> anyhow::Result<Arc<dyn LocalStore>> {
    warn!("built without `cache-file`; the local snapshot lives in memory");
    Ok(Arc::new(hq_store_memory::MemoryLocalStore::new()))
}
