//! Fehlertypen fuer den Audio-Pfad

use thiserror::Error;

/// Alle moeglichen Fehler im Audio-Pfad eines Bots
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio-Geraet nicht gefunden: Index {0}")]
    GeraetNichtGefunden(usize),

    #[error("Kein Standard-Eingabegeraet verfuegbar")]
    KeinStandardEingabegeraet,

    #[error("Kein Standard-Ausgabegeraet verfuegbar")]
    KeinStandardAusgabegeraet,

    #[error("Stream-Fehler: {0}")]
    StreamFehler(String),

    #[error("Senden an Voice-Session fehlgeschlagen: {0}")]
    Senden(String),

    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    #[error("Ring-Buffer voll")]
    RingBufferVoll,

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unerwarteter Fehler: {0}")]
    Anyhow(#[from] anyhow::Error),
}

pub type AudioResult<T> = Result<T, AudioError>;
