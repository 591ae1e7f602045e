//! Prometheus-kompatible Metriken fuer loopbot
//!
//! Registrierte Metriken:
//! - `loopbot_idle_bots` – Gauge: freie Bots im Pool
//! - `loopbot_active_loops` – Gauge: Schleifen in LISTEN oder TALK
//! - `loopbot_talking_loops` – Gauge: Schleifen in TALK (0 oder 1)
//! - `loopbot_loop_participants` – Gauge je Schleife: Teilnehmerzahl
//! - `loopbot_bots_responding` – Gauge: Bots mit Antwort in der letzten Abfrage
//! - `loopbot_pool_exhausted_total` – Counter: Aktivierungen ohne freien Bot

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use loopbot_controller::ControllerSnapshot;
use loopbot_core::LoopState;
use prometheus::{Encoder, IntCounter, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Alle loopbot-Prometheus-Metriken
#[derive(Clone)]
pub struct LoopbotMetrics {
    pub registry: Arc<Registry>,

    pub idle_bots: IntGauge,
    pub active_loops: IntGauge,
    pub talking_loops: IntGauge,
    pub loop_participants: IntGaugeVec,
    pub bots_responding: IntGauge,
    pub pool_exhausted_total: IntCounter,
}

impl LoopbotMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let idle_bots = IntGauge::with_opts(Opts::new(
            "loopbot_idle_bots",
            "Anzahl freier Bots im Pool",
        ))?;
        registry.register(Box::new(idle_bots.clone()))?;

        let active_loops = IntGauge::with_opts(Opts::new(
            "loopbot_active_loops",
            "Schleifen im Zustand LISTEN oder TALK",
        ))?;
        registry.register(Box::new(active_loops.clone()))?;

        let talking_loops = IntGauge::with_opts(Opts::new(
            "loopbot_talking_loops",
            "Schleifen im Zustand TALK",
        ))?;
        registry.register(Box::new(talking_loops.clone()))?;

        let loop_participants = IntGaugeVec::new(
            Opts::new(
                "loopbot_loop_participants",
                "Teilnehmer pro Schleife laut letzter Abfrage",
            ),
            &["loop"],
        )?;
        registry.register(Box::new(loop_participants.clone()))?;

        let bots_responding = IntGauge::with_opts(Opts::new(
            "loopbot_bots_responding",
            "Bots mit Antwort in der letzten Statusabfrage",
        ))?;
        registry.register(Box::new(bots_responding.clone()))?;

        let pool_exhausted_total = IntCounter::with_opts(Opts::new(
            "loopbot_pool_exhausted_total",
            "Aktivierungen, die mangels freiem Bot OFF blieben",
        ))?;
        registry.register(Box::new(pool_exhausted_total.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry: Arc::new(registry),
            idle_bots,
            active_loops,
            talking_loops,
            loop_participants,
            bots_responding,
            pool_exhausted_total,
        })
    }

    /// Uebernimmt einen Controller-Snapshot.
    ///
    /// Der Snapshot zaehlt Pool-Erschoepfungen kumulativ, der Counter
    /// waechst nur um die Differenz.
    pub fn aktualisieren(&self, snap: &ControllerSnapshot, antwortende_bots: usize) {
        self.idle_bots.set(snap.idle_bots as i64);
        self.bots_responding.set(antwortende_bots as i64);

        let mut aktiv = 0;
        let mut sprechend = 0;
        for l in &snap.loops {
            if l.state.ist_aktiv() {
                aktiv += 1;
            }
            if l.state == LoopState::Talk {
                sprechend += 1;
            }
            self.loop_participants
                .with_label_values(&[l.name.as_str()])
                .set(i64::from(l.teilnehmer));
        }
        self.active_loops.set(aktiv);
        self.talking_loops.set(sprechend);

        let bisher = self.pool_exhausted_total.get();
        if snap.pool_erschoepft > bisher {
            self.pool_exhausted_total.inc_by(snap.pool_erschoepft - bisher);
        }
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: LoopbotMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<LoopbotMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
