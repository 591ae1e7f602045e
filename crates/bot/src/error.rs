//! Fehlertypen des Bot-Workers

use loopbot_audio::AudioError;
use loopbot_core::LoopbotError;
use thiserror::Error;

pub type BotResult<T> = std::result::Result<T, BotError>;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Ungueltiger Befehl: {0}")]
    UngueltigerBefehl(String),

    #[error("Bot nicht erreichbar: {0}")]
    NichtErreichbar(String),

    #[error("Voice-Session: {0}")]
    Session(String),

    #[error("Audiofehler: {0}")]
    Audio(#[from] AudioError),
}

impl BotError {
    pub fn ist_validierung(&self) -> bool {
        matches!(self, Self::UngueltigerBefehl(_))
    }
}

impl From<BotError> for LoopbotError {
    fn from(e: BotError) -> Self {
        match e {
            BotError::UngueltigerBefehl(m) => LoopbotError::UngueltigerBefehl(m),
            BotError::NichtErreichbar(m) => LoopbotError::NichtErreichbar(m),
            BotError::Session(m) => LoopbotError::NichtErreichbar(m),
            BotError::Audio(a) => LoopbotError::Audio(a.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validierung_wird_erkannt() {
        assert!(BotError::UngueltigerBefehl("x".into()).ist_validierung());
        assert!(!BotError::NichtErreichbar("BOT1".into()).ist_validierung());
    }

    #[test]
    fn konvertierung_in_kernfehler() {
        let e: LoopbotError = BotError::UngueltigerBefehl("volume".into()).into();
        assert!(e.ist_validierung());
        let e: LoopbotError = BotError::NichtErreichbar("BOT2".into()).into();
        assert!(e.ist_wiederholbar());
    }
}
