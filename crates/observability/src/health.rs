//! Health-Check-Endpunkt fuer loopbot
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime und erreichbaren Bots.
//! Die Bot-Zahlen setzt der Status-Poller nach jeder Runde.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub bots_total: usize,
    pub bots_responding: usize,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    start_time: Arc<Instant>,
    bots_gesamt: Arc<AtomicUsize>,
    bots_erreichbar: Arc<AtomicUsize>,
}

impl HealthState {
    pub fn neu(bots_gesamt: usize) -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            bots_gesamt: Arc::new(AtomicUsize::new(bots_gesamt)),
            // Bis zur ersten Abfrage gilt jeder Bot als erreichbar
            bots_erreichbar: Arc::new(AtomicUsize::new(bots_gesamt)),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn erreichbar_setzen(&self, anzahl: usize) {
        self.bots_erreichbar.store(anzahl, Ordering::Relaxed);
    }

    pub fn status(&self) -> HealthStatus {
        let gesamt = self.bots_gesamt.load(Ordering::Relaxed);
        let erreichbar = self.bots_erreichbar.load(Ordering::Relaxed);
        if erreichbar >= gesamt {
            HealthStatus::Healthy
        } else if erreichbar > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        }
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let status = state.status();
    let http_status = match status {
        // 200 auch bei degraded (Probe soll nicht failen)
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        bots_total: state.bots_gesamt.load(Ordering::Relaxed),
        bots_responding: state.bots_erreichbar.load(Ordering::Relaxed),
    };

    (http_status, Json(response))
}
