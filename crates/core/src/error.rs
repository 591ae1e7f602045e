//! Fehlertypen fuer loopbot
//!
//! Zentraler Fehler-Enum fuer Katalog, Pool und Befehlsvalidierung.
//! Untermodule koennen eigene Fehler definieren und via `#[from]` konvertieren.

use thiserror::Error;

/// Globaler Result-Alias fuer loopbot
pub type Result<T> = std::result::Result<T, LoopbotError>;

/// Alle moeglichen Fehler im loopbot-System
#[derive(Debug, Error)]
pub enum LoopbotError {
    // --- Katalog & Pool ---
    #[error("Schleife nicht gefunden: {0}")]
    LoopNichtGefunden(String),

    #[error("Bot nicht gefunden: {0}")]
    BotNichtGefunden(String),

    #[error("Schleifenkatalog ungueltig: {0}")]
    Katalog(String),

    // --- Befehle ---
    #[error("Ungueltiger Befehl: {0}")]
    UngueltigerBefehl(String),

    #[error("Bot nicht erreichbar: {0}")]
    NichtErreichbar(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Audio ---
    #[error("Audiofehler: {0}")]
    Audio(String),

    // --- Intern ---
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON-Fehler: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl LoopbotError {
    /// Gibt true zurueck wenn der Fehler an der Eingabevalidierung scheiterte
    pub fn ist_validierung(&self) -> bool {
        matches!(self, Self::UngueltigerBefehl(_) | Self::Json(_))
    }

    /// Gibt true zurueck wenn der Fehler wiederholbar sein koennte
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(self, Self::NichtErreichbar(_) | Self::Audio(_))
    }
}
