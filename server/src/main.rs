//! loopbot – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Server.

use anyhow::Result;
use loopbot_observability::logging_initialisieren;
use loopbot_server::{config::ServerConfig, Server};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("LOOPBOT_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let vorhanden = std::path::Path::new(&config_pfad).exists();

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = ServerConfig::laden(&config_pfad)?;

    logging_initialisieren(&config.logging.level, &config.logging.format);
    if !vorhanden {
        tracing::warn!(
            pfad = %config_pfad,
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        rolle = %config.schleifen.rolle,
        bots = config.bots.anzahl,
        "loopbot wird initialisiert"
    );

    Server::neu(config).starten().await
}
