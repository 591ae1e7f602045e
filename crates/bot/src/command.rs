//! Befehle der Bot-Steuerflaeche
//!
//! Jeder Befehl wird an der Bot-Grenze mit [`BotCommand::pruefen`]
//! validiert. Ein abgelehnter Befehl veraendert keinen Zustand.

use loopbot_core::verzoegerung_pruefen;
use serde::{Deserialize, Serialize};

use crate::error::{BotError, BotResult};

/// Ein einseitiger Steuerbefehl an einen Bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "befehl", rename_all = "snake_case")]
pub enum BotCommand {
    /// Schleife (Kanal) betreten
    Join { loop_name: String },
    /// Zurueck in den Root-Kanal
    Leave,
    /// Senden einschalten
    Talk,
    /// Senden ausschalten
    Mute,
    /// Wiedergabe-Lautstaerke 0.0..=1.0
    SetVolume { volume: f32 },
    EnableDelay { seconds: f64 },
    DisableDelay,
    /// Nach der Verzoegerung stumm schalten und dann verlassen
    LeaveAfterDelay,
    /// Nach der Verzoegerung stumm schalten
    MuteAfterDelay,
    SetInput { device: u32 },
    SetOutput { device: u32 },
    /// Stumm schalten und Capture schliessen
    Stop,
}

impl BotCommand {
    /// Validiert die Nutzdaten des Befehls.
    ///
    /// Lautstaerken ausserhalb 0..=1 werden spaeter geclamped, nur
    /// nicht-endliche Werte werden abgelehnt.
    pub fn pruefen(&self) -> BotResult<()> {
        match self {
            Self::Join { loop_name } if loop_name.trim().is_empty() => Err(
                BotError::UngueltigerBefehl("join ohne Schleifennamen".into()),
            ),
            Self::SetVolume { volume } if !volume.is_finite() => Err(
                BotError::UngueltigerBefehl(format!("Lautstaerke ungueltig: {volume}")),
            ),
            Self::EnableDelay { seconds } => verzoegerung_pruefen(*seconds)
                .map(|_| ())
                .map_err(|e| BotError::UngueltigerBefehl(e.to_string())),
            _ => Ok(()),
        }
    }

    /// Kurzname fuer Logs und Metriken
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave => "leave",
            Self::Talk => "talk",
            Self::Mute => "mute",
            Self::SetVolume { .. } => "set_volume",
            Self::EnableDelay { .. } => "enable_delay",
            Self::DisableDelay => "disable_delay",
            Self::LeaveAfterDelay => "leave_after_delay",
            Self::MuteAfterDelay => "mute_after_delay",
            Self::SetInput { .. } => "set_input",
            Self::SetOutput { .. } => "set_output",
            Self::Stop => "stop",
        }
    }
}
