//! HTTP probes for the running bot.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::bot::context::AppContext;
use crate::database::models::Place;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub database: DatabaseHealth,
    /// Users currently inside a dialogue.
    pub active_sessions: usize,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub status: String,
    pub places: i64,
    pub response_time_ms: u64,
}

#[derive(Clone)]
struct Probe {
    ctx: Arc<AppContext>,
    started: Instant,
}

pub struct HealthService {
    pub router: Router,
}

impl HealthService {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let probe = Probe {
            ctx,
            started: Instant::now(),
        };

        let router = Router::new()
            .route("/health", get(report))
            .route("/health/ready", get(ready))
            .route("/health/live", get(|| async { Json("alive") }))
            .layer(TraceLayer::new_for_http())
            .with_state(probe);

        Self { router }
    }
}

/// Full status: counts the stored places as a database round trip.
async fn report(State(probe): State<Probe>) -> Result<Json<HealthResponse>, StatusCode> {
    let query_started = Instant::now();
    let places = Place::count(&probe.ctx.db.pool).await.map_err(|e| {
        tracing::warn!("Health check could not reach the database: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    let response_time_ms = u64::try_from(query_started.elapsed().as_millis()).unwrap_or(u64::MAX);

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            status: "healthy".to_string(),
            places,
            response_time_ms,
        },
        active_sessions: probe.ctx.controller.sessions().active_sessions(),
        uptime_seconds: probe.started.elapsed().as_secs(),
    }))
}

async fn ready(State(probe): State<Probe>) -> Result<Json<&'static str>, StatusCode> {
    probe
        .ctx
        .db
        .ping()
        .await
        .map(|()| Json("ready"))
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)
}
