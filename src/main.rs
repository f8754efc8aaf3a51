use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use capsule_api::{
    config::{Config, SearchBackend},
    create_router,
    db::{
        create_pool, create_redis_client, Cache, CacheWriterHandle, PgAccountStore,
        PgCatalogRepository, PgProfileStore,
    },
    services::{
        catalog::SharedCatalog,
        gateway::{
            CachedGateway, CatalogGateway, ElasticsearchGateway, SubstringGateway,
            TagIndexGateway,
        },
        import::{import_catalog, load_catalog, read_feed_csv},
    },
    AppState,
};

#[derive(Parser)]
#[command(name = "capsule-api", about = "Capsule wardrobe recommendation service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Replace the catalog with a product feed CSV export
    Import {
        /// Path to the CSV file; the header row names the feed columns
        csv_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Import { csv_file } => import(config, csv_file).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        search_backend = ?config.search_backend,
        cache = config.redis_url.is_some(),
        http_import = config.admin_token.is_some(),
        "Configuration loaded"
    );

    let pool = create_pool(&config.database_url).await?;
    let (gateway, cache_writer) = build_gateway(&config).await?;

    let state = Arc::new(AppState {
        profiles: Arc::new(PgProfileStore::new(pool.clone())),
        accounts: Arc::new(PgAccountStore::new(pool.clone())),
        catalog_repository: Arc::new(PgCatalogRepository::new(pool)),
        catalog: SharedCatalog::default(),
        gateway,
        settings: config.pipeline_settings(),
        admin_token: config.admin_token.clone(),
    });

    load_catalog(
        state.catalog_repository.as_ref(),
        state.gateway.as_ref(),
        &state.catalog,
    )
    .await
    .context("Failed to load catalog")?;

    let snapshot = state.catalog.current();
    tracing::info!(
        version = snapshot.version(),
        items = snapshot.len(),
        "Catalog loaded"
    );

    tokio::spawn(refresh_catalog_periodically(
        state.clone(),
        Duration::from_secs(config.catalog_refresh_secs),
    ));

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Pending cache writes are flushed before exit
    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Imports a CSV feed; running servers pick the new version up on their next refresh
async fn import(config: Config, csv_file: PathBuf) -> anyhow::Result<()> {
    let data = tokio::fs::read(&csv_file)
        .await
        .with_context(|| format!("Failed to read {}", csv_file.display()))?;
    let rows = read_feed_csv(&data)?;

    let pool = create_pool(&config.database_url).await?;
    let repository = PgCatalogRepository::new(pool);
    // Search results are cached under versioned keys, so the import skips Redis
    let gateway = build_backend(&config)?;
    let catalog = SharedCatalog::default();

    // The live version must be known so its index survives the cleanup
    load_catalog(&repository, gateway.as_ref(), &catalog)
        .await
        .context("Failed to load catalog")?;

    let summary = import_catalog(&repository, gateway.as_ref(), &catalog, rows)
        .await
        .context("Catalog import failed")?;

    tracing::info!(
        file = %csv_file.display(),
        version = summary.version,
        imported = summary.imported,
        skipped = summary.skipped,
        "Catalog import complete"
    );
    Ok(())
}

async fn refresh_catalog_periodically(state: Arc<AppState>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately, and startup already loaded
    interval.tick().await;

    loop {
        interval.tick().await;
        if let Err(e) = load_catalog(
            state.catalog_repository.as_ref(),
            state.gateway.as_ref(),
            &state.catalog,
        )
        .await
        {
            tracing::warn!(error = %e, "Catalog refresh failed");
        }
    }
}

/// Selects the configured search backend
fn build_backend(config: &Config) -> anyhow::Result<Arc<dyn CatalogGateway>> {
    let backend: Arc<dyn CatalogGateway> = match config.search_backend {
        SearchBackend::TagIndex => Arc::new(TagIndexGateway::new()),
        SearchBackend::Substring => Arc::new(SubstringGateway::new()),
        SearchBackend::Elasticsearch => {
            let url = config
                .elasticsearch_url
                .clone()
                .context("ELASTICSEARCH_URL is not set")?;
            Arc::new(ElasticsearchGateway::new(
                url,
                config.elasticsearch_index_prefix.clone(),
            ))
        }
    };
    Ok(backend)
}

/// The configured backend, wrapped in the Redis cache when configured
async fn build_gateway(
    config: &Config,
) -> anyhow::Result<(Arc<dyn CatalogGateway>, Option<CacheWriterHandle>)> {
    let backend = build_backend(config)?;

    let Some(redis_url) = &config.redis_url else {
        return Ok((backend, None));
    };

    let client = create_redis_client(redis_url)?;
    let (cache, writer) = Cache::new(client)
        .await
        .context("Failed to connect to Redis")?;

    Ok((
        Arc::new(CachedGateway::new(backend, cache, config.search_cache_ttl)),
        Some(writer),
    ))
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "capsule_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
