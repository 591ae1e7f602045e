//! # loopbot-observability
//!
//! Observability-Crate fuer loopbot:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Check-Endpunkt (`/health`)
//! - Structured Logging via tracing-subscriber

pub mod health;
pub mod logging;
pub mod metrics;

pub use health::{health_router, HealthResponse, HealthState, HealthStatus};
pub use logging::logging_initialisieren;
pub use metrics::{metrics_router, LoopbotMetrics};

use axum::Router;

/// `/metrics` und `/health` zusammen, zum Mounten neben der REST-API
pub fn observability_router(health: HealthState, metriken: LoopbotMetrics) -> Router {
    Router::new()
        .merge(metrics_router(metriken))
        .merge(health_router(health))
}
