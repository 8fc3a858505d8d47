use actix_web::{web, HttpResponse, Responder};
use mongodb::bson::doc;
use mongodb::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// GET /health body
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

/// GET /ready body
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: DatabaseStatus,
}

/// Outcome of the `ping` command against the deployment
#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseStatus {
    pub reachable: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

impl ReadinessResponse {
    fn from_ping(ping: Result<Duration, String>) -> Self {
        let database = match ping {
            Ok(elapsed) => DatabaseStatus {
                reachable: true,
                latency_ms: Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)),
                error: None,
            },
            Err(error) => DatabaseStatus {
                reachable: false,
                latency_ms: None,
                error: Some(error),
            },
        };

        Self {
            ready: database.reachable,
            database,
        }
    }
}

/// GET /health - Liveness probe, no dependency checks
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /ready - Readiness probe, pings the database through the shared client
pub async fn readiness_check(client: web::Data<Client>) -> impl Responder {
    let started = Instant::now();
    let ping = client
        .database("admin")
        .run_command(doc! { "ping": 1 }, None)
        .await
        .map(|_| started.elapsed())
        .map_err(|e| {
            tracing::error!("Database readiness check failed: {}", e);
            e.to_string()
        });

    let response = ReadinessResponse::from_ping(ping);
    if response.ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// Configure health check routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/ready", web::get().to(readiness_check));
}
