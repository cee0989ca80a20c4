//! Catalog API - product search with combo pricing recommendations

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_helpers::errors::handlers::not_found;
use axum_helpers::shutdown_signal;
use core_config::tracing::init_tracing;
use domain_catalog::handlers::{self, ApiDoc};
use domain_catalog::{PgCatalogRepository, PricingEngine, RedisCache, SearchService};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;

mod config;
mod health;

use config::Config;
use health::HealthState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let _ = color_eyre::install();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    // Both backing stores must be reachable before the server starts.
    let (pool, redis) = tokio::try_join!(
        async {
            database::postgres::connect_with_retry(&config.postgres.url, None)
                .await
                .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {e}"))
        },
        async {
            database::redis::connect_with_retry(&config.redis.url, None)
                .await
                .map_err(|e| eyre::eyre!("Redis connection failed: {e}"))
        },
    )?;

    let repository = PgCatalogRepository::new(pool.clone());
    let service = SearchService::new(
        repository.clone(),
        repository.clone(),
        PricingEngine::new(repository),
        RedisCache::new(redis.clone()),
    );

    // Token bucket sized for the per-minute budget, replenishing evenly.
    let replenish_ms = 60_000 / u64::from(config.rate_limit_per_minute.max(1));
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_ms.max(1))
            .burst_size(config.rate_limit_per_minute)
            .finish()
            .ok_or_else(|| eyre::eyre!("invalid rate limit configuration"))?,
    );

    let api_routes = handlers::router(service).layer(GovernorLayer::new(governor_config));

    let app = Router::new()
        .merge(health::router(HealthState { pool, redis }))
        .nest("/api/products", api_routes)
        .route(
            "/api/openapi.json",
            axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    let listener = tokio::net::TcpListener::bind(config.server.address()).await?;
    info!("Catalog API listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Catalog API shutdown complete");
    Ok(())
}
