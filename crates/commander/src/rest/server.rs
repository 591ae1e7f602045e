//! Axum HTTP-Server fuer den Commander

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::rest::{routes::v1_router, CommanderState};

/// REST-Server-Konfiguration
#[derive(Debug, Clone)]
pub struct RestServerKonfig {
    pub bind_addr: SocketAddr,
    /// Erlaubte CORS-Origins. Leer = alle Origins erlaubt (nur fuer Entwicklung).
    pub cors_origins: Vec<String>,
}

impl Default for RestServerKonfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 9300)),
            cors_origins: vec![],
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    // Entweder spezifische Origins oder Any
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

/// /v1-Router mit State, ohne Netzwerk-Layer
pub fn router(state: CommanderState) -> Router {
    v1_router().with_state(state)
}

/// Axum HTTP-Server fuer den Commander
pub struct RestServer {
    konfig: RestServerKonfig,
}

impl RestServer {
    pub fn neu(konfig: RestServerKonfig) -> Self {
        Self { konfig }
    }

    /// Startet den REST-Server und laeuft bis `stopp` fertig ist.
    ///
    /// `zusatz` wird neben /v1 gemountet (z.B. /health und /metrics).
    pub async fn starten(
        self,
        state: CommanderState,
        zusatz: Router,
        stopp: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let app = router(state)
            .merge(zusatz)
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&self.konfig.cors_origins));

        let listener = tokio::net::TcpListener::bind(self.konfig.bind_addr).await?;
        tracing::info!(addr = %self.konfig.bind_addr, "REST-Commander-Server gestartet");

        axum::serve(listener, app)
            .with_graceful_shutdown(stopp)
            .await?;
        tracing::info!("REST-Commander-Server beendet");
        Ok(())
    }
}
