// Liveness and readiness probes
//
// Endpoints:
// - GET /health
// - GET /ready

use std::time::Duration;

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

const DATABASE_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

/// Outcome of the ledger database probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseCheck {
    Ok,
    Failed,
    TimedOut,
    /// In-memory backend; nothing to probe
    NotConfigured,
}

impl DatabaseCheck {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ok | Self::NotConfigured)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: DatabaseCheck,
}

/// GET /health - the process answers; dependencies are not checked
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn probe(pool: &MySqlPool) -> DatabaseCheck {
    let query = sqlx::query("SELECT 1").fetch_one(pool);
    match tokio::time::timeout(DATABASE_PROBE_TIMEOUT, query).await {
        Ok(Ok(_)) => DatabaseCheck::Ok,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Ledger database probe failed");
            DatabaseCheck::Failed
        }
        Err(_) => {
            tracing::error!("Ledger database probe timed out");
            DatabaseCheck::TimedOut
        }
    }
}

/// GET /ready - 503 while the MySQL ledger is unreachable
pub async fn readiness_check(pool: Option<web::Data<MySqlPool>>) -> impl Responder {
    let database = match pool {
        Some(pool) => probe(pool.get_ref()).await,
        None => DatabaseCheck::NotConfigured,
    };

    let body = ReadinessResponse {
        ready: database.is_ready(),
        database,
    };

    if body.ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/ready", web::get().to(readiness_check));
}
