use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use db_pool::{create_pool, DbConfig};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wom_service::db::{
    InMemoryStore, PostStore, SqlxPostRepository, SqlxTokenRepository, TokenStore,
};
use wom_service::jobs::{
    run_jobs, BatchJob, PostCollectorJob, RetentionSweepJob, SentimentBatchJob,
    TokenDiscoveryJob, WomRecomputeJob,
};
use wom_service::services::discovery::{DexScreenerFeed, SyntheticPostSource};
use wom_service::{Clock, Config, StoreBackend, SystemClock};

/// Posts generated per token by the synthetic source
const SYNTHETIC_POSTS_PER_FETCH: usize = 3;

struct Stores {
    posts: Arc<dyn PostStore>,
    tokens: Arc<dyn TokenStore>,
    pool: Option<PgPool>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,wom_service=debug".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn init_stores(config: &Config) -> Result<Stores> {
    match config.store {
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            let store = InMemoryStore::new();
            Ok(Stores {
                posts: Arc::new(store.clone()),
                tokens: Arc::new(store),
                pool: None,
            })
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .clone()
                .context("DATABASE_URL is required for the postgres store")?;

            let db_cfg = DbConfig::with_url("wom-service", database_url);
            db_cfg.log_config();

            let pool = create_pool(db_cfg)
                .await
                .context("Failed to create PostgreSQL pool")?;
            info!("PostgreSQL connection pool created");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run wom-service migrations")?;
            info!("Database migrations applied");

            Ok(Stores {
                posts: Arc::new(SqlxPostRepository::new(pool.clone())),
                tokens: Arc::new(SqlxTokenRepository::new(pool.clone())),
                pool: Some(pool),
            })
        }
    }
}

fn build_jobs(config: &Config, stores: &Stores, clock: Arc<dyn Clock>) -> Result<Vec<Arc<dyn BatchJob>>> {
    let mut jobs: Vec<Arc<dyn BatchJob>> = vec![
        Arc::new(SentimentBatchJob::new(
            stores.posts.clone(),
            config.sentiment_job(),
        )),
        Arc::new(WomRecomputeJob::new(
            stores.tokens.clone(),
            stores.posts.clone(),
            clock.clone(),
            config.recompute_job(),
        )),
        Arc::new(RetentionSweepJob::new(
            stores.tokens.clone(),
            stores.posts.clone(),
            clock.clone(),
            config.retention_job(),
        )),
    ];

    if config.discovery_enabled {
        let feed = DexScreenerFeed::new(config.dexscreener_url.clone())
            .context("Failed to build DEX Screener client")?;
        jobs.push(Arc::new(TokenDiscoveryJob::new(
            Arc::new(feed),
            stores.tokens.clone(),
            clock.clone(),
            config.discovery_interval(),
        )));
    }

    if config.collector_enabled {
        let source = SyntheticPostSource::new(clock.clone(), SYNTHETIC_POSTS_PER_FETCH);
        jobs.push(Arc::new(PostCollectorJob::new(
            Arc::new(source),
            stores.posts.clone(),
            stores.tokens.clone(),
            clock,
            config.collector_job(),
        )));
    }

    Ok(jobs)
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn ready(pool: web::Data<Option<PgPool>>) -> HttpResponse {
    if let Some(pool) = pool.get_ref() {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            warn!(error = %e, "Readiness check failed");
            return HttpResponse::ServiceUnavailable()
                .json(serde_json::json!({ "status": "unavailable" }));
        }
    }

    HttpResponse::Ok().json(serde_json::json!({ "status": "ready" }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting wom-service");

    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;
    info!(store = ?config.store, "Configuration loaded and validated");

    let stores = init_stores(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let jobs = build_jobs(&config, &stores, clock)?;
    info!(count = jobs.len(), "Background jobs configured");

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let jobs_handle = tokio::spawn(run_jobs(jobs, shutdown_tx.clone()));

    let pool_data = web::Data::new(stores.pool.clone());
    let bind_addr = (config.http_host.clone(), config.http_port);
    info!("HTTP server listening on {}:{}", bind_addr.0, bind_addr.1);

    // actix handles SIGINT/SIGTERM and returns once the server has stopped
    let server_result = HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .route("/health", web::get().to(health))
            .route("/ready", web::get().to(ready))
            .route(
                "/metrics",
                web::get().to(wom_service::metrics::serve_metrics),
            )
    })
    .bind(bind_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await;

    info!("HTTP server stopped, shutting down background jobs");
    let _ = shutdown_tx.send(());
    if let Err(e) = jobs_handle.await {
        error!(error = %e, "Job supervisor panicked");
    }

    if let Some(pool) = stores.pool {
        pool.close().await;
    }

    server_result.context("HTTP server error")?;
    info!("wom-service stopped");
    Ok(())
}
