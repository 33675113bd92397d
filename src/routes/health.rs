use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use diesel::{RunQueryDsl, sql_query};
use serde::Serialize;

use crate::{AppState, cache::redis_health_check};

#[derive(Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: bool,
    pub redis: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match state.db.get() {
        Ok(mut conn) => sql_query("SELECT 1").execute(&mut conn).is_ok(),
        Err(_) => false,
    };
    let redis = redis_health_check(&state.redis).await.unwrap_or(false);

    let healthy = database && redis;
    if !healthy {
        tracing::warn!(database, redis, "Health check degraded");
    }
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status,
        Json(HealthReport {
            status: if healthy { "ok" } else { "degraded" },
            database,
            redis,
        }),
    )
}
