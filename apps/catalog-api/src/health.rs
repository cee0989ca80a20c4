//! Liveness and readiness endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use redis::aio::ConnectionManager;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Clone)]
pub struct HealthState {
    pub pool: PgPool,
    pub redis: ConnectionManager,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    name: String,
    version: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
    services: ServiceStatus,
}

#[derive(Serialize)]
struct ServiceStatus {
    database: bool,
    cache: bool,
}

pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}

/// Always 200 while the process is up.
async fn health_handler() -> Response {
    let response = HealthResponse {
        status: "healthy".to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 200 when both backing services answer, 503 otherwise.
async fn ready_handler(State(state): State<HealthState>) -> Response {
    let (database, cache) = tokio::join!(check_database(&state.pool), check_redis(&state.redis));

    let ready = database && cache;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = ReadyResponse {
        ready,
        services: ServiceStatus { database, cache },
    };
    (status, Json(response)).into_response()
}

async fn check_database(pool: &PgPool) -> bool {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => true,
        Err(e) => {
            tracing::error!("Readiness check failed for PostgreSQL: {e}");
            false
        }
    }
}

async fn check_redis(manager: &ConnectionManager) -> bool {
    let mut conn = manager.clone();
    match redis::cmd("PING").query_async::<String>(&mut conn).await {
        Ok(_) => true,
        Err(e) => {
            tracing::error!("Readiness check failed for Redis: {e}");
            false
        }
    }
}
