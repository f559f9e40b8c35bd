//! `GET /health` (§6 expansion): current server time plus a best-effort
//! database round-trip latency. Always 200 — a failed ping is reported in
//! the body, not the status. Grounded verbatim on the teacher's
//! `control::controllers::health_check`.

use crate::context::AppContext;
use axum::extract::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_with::serde_as;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::Instant;

#[serde_as]
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    current_time: DateTime<Utc>,
    #[serde_as(as = "Option<serde_with::DurationSecondsWithFrac<String>>")]
    db_ping_seconds: Option<Duration>,
}

pub async fn show(Extension(ctx): Extension<AppContext>) -> Json<HealthCheck> {
    Json(HealthCheck {
        current_time: Utc::now(),
        db_ping_seconds: ping(ctx.db()).await,
    })
}

async fn ping(db: &PgPool) -> Option<Duration> {
    let start = Instant::now();
    let result = sqlx::query("SELECT 1").execute(db).await;
    match result {
        Ok(_) => Some(Instant::now() - start),
        Err(_) => None,
    }
}
