use std::sync::Arc;

use movie_picker_api::{
    config::Config,
    db::{self, Journal, RoomRepository},
    routes::{cors_layer, create_router, AppState},
    services::{Catalog, MovieSelector, RoomRegistry, RoomService, SelectorSettings, TmdbCatalog},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_picker_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (cache, cache_handle) = match &config.redis_url {
        Some(url) => {
            let (cache, handle) = db::Cache::new(db::create_redis_client(url)?);
            tracing::info!("Catalog cache enabled");
            (Some(cache), Some(handle))
        }
        None => {
            tracing::info!("REDIS_URL not set, catalog cache disabled");
            (None, None)
        }
    };

    let catalog: Arc<dyn Catalog> = Arc::new(TmdbCatalog::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    ));

    let (registry, journal, journal_handle) = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;

            let repository = RoomRepository::new(pool);
            let (sessions, players) = repository.load_all().await?;
            let registry = RoomRegistry::restore(sessions, players)?;

            let (journal, handle) = Journal::spawn(Arc::new(repository));
            (registry, Some(journal), Some(handle))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, rooms are kept in memory only");
            (RoomRegistry::new(), None, None)
        }
    };

    let settings = SelectorSettings {
        max_page: config.max_discover_page,
        batch_size: config.movies_per_batch,
        ..Default::default()
    };
    let rooms = RoomService::new(MovieSelector::new(catalog, settings), registry, journal);
    let state = Arc::new(AppState::new(rooms));

    let app = create_router(state).layer(cors_layer(config.frontend_origin.as_deref())?);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = journal_handle {
        handle.shutdown().await;
    }
    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
