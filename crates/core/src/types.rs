//! Gemeinsame Identifikations- und Zustandstypen fuer loopbot
//!
//! Bot-Kennungen verwenden das Newtype-Pattern um Verwechslungen mit
//! Schleifennamen zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};

/// Eindeutige Bot-Kennung (z.B. "BOT1")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotId(pub String);

impl BotId {
    /// Erstellt eine BotId aus einem beliebigen Namen
    pub fn neu(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Gibt den Namen als &str zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Eine Kommunikationsschleife aus dem statischen Katalog.
///
/// Unveraenderlich nach dem Laden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loop {
    pub name: String,
    #[serde(default)]
    pub can_listen: bool,
    #[serde(default)]
    pub can_talk: bool,
}

impl Loop {
    pub fn neu(name: impl Into<String>, can_listen: bool, can_talk: bool) -> Self {
        Self {
            name: name.into(),
            can_listen,
            can_talk,
        }
    }
}

/// Zustand einer Schleife. Zyklisch, kein Endzustand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    #[default]
    Off,
    Listen,
    Talk,
}

impl LoopState {
    /// Gibt true zurueck wenn der Zustand einen Bot benoetigt
    pub fn ist_aktiv(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Naechster Zustand beim Klick auf eine Schleife.
    ///
    /// OFF -> LISTEN, LISTEN -> TALK (falls sprechfaehig, sonst LISTEN),
    /// TALK -> LISTEN.
    pub fn nach_klick(self, can_talk: bool) -> Self {
        match self {
            Self::Off => Self::Listen,
            Self::Listen if can_talk => Self::Talk,
            Self::Listen => Self::Listen,
            Self::Talk => Self::Listen,
        }
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Off => "off",
            Self::Listen => "listen",
            Self::Talk => "talk",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for LoopState {
    type Err = crate::LoopbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "listen" => Ok(Self::Listen),
            "talk" => Ok(Self::Talk),
            anders => Err(crate::LoopbotError::UngueltigerBefehl(format!(
                "unbekannter Schleifenzustand '{anders}'"
            ))),
        }
    }
}
