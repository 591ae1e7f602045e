//! Fehlertypen fuer den loopbot Commander

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use loopbot_bot::BotError;
use loopbot_core::LoopbotError;
use serde_json::json;
use thiserror::Error;

/// Alle moeglichen Fehler im Commander-Crate
#[derive(Debug, Error)]
pub enum CommanderError {
    #[error("Ressource nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Bot nicht erreichbar: {0}")]
    NichtErreichbar(String),

    #[error("Interner Fehler: {0}")]
    Intern(#[from] anyhow::Error),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type CommanderResult<T> = Result<T, CommanderError>;

/// HTTP-Statuscode fuer REST-Fehler
impl CommanderError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NichtGefunden(_) => 404,
            Self::UngueltigeEingabe(_) => 400,
            Self::NichtErreichbar(_) => 503,
            Self::Intern(_) | Self::Io(_) => 500,
        }
    }
}

impl From<LoopbotError> for CommanderError {
    fn from(e: LoopbotError) -> Self {
        match e {
            LoopbotError::LoopNichtGefunden(_) | LoopbotError::BotNichtGefunden(_) => {
                Self::NichtGefunden(e.to_string())
            }
            LoopbotError::NichtErreichbar(m) => Self::NichtErreichbar(m),
            e if e.ist_validierung() => Self::UngueltigeEingabe(e.to_string()),
            LoopbotError::Io(io) => Self::Io(io),
            andere => Self::Intern(anyhow::anyhow!(andere.to_string())),
        }
    }
}

impl From<BotError> for CommanderError {
    fn from(e: BotError) -> Self {
        match e {
            BotError::UngueltigerBefehl(m) => Self::UngueltigeEingabe(m),
            BotError::NichtErreichbar(m) | BotError::Session(m) => Self::NichtErreichbar(m),
            BotError::Audio(a) => Self::Intern(anyhow::anyhow!(a.to_string())),
        }
    }
}

impl IntoResponse for CommanderError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), "REST-Fehler: {}", self);
        }
        (
            status,
            Json(json!({
                "error": { "code": status.as_u16(), "message": self.to_string() }
            })),
        )
            .into_response()
    }
}
