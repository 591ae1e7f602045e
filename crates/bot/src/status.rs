//! Abgefragter Status eines Bots

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name des Kanals, in dem ein Bot ohne Schleife wartet
pub const ROOT_KANAL: &str = "Root";

/// Momentaufnahme eines Bots fuer die periodische Abfrage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotStatus {
    pub status_text: String,
    pub current_loop: Option<String>,
    pub streaming: bool,
    pub input_device: Option<u32>,
    pub output_device: Option<u32>,
    /// Teilnehmer pro Kanal wie die Voice-Session sie sieht
    pub participant_counts: HashMap<String, u32>,
}

/// Statustexte, die der jeweils letzte Befehl hinterlaesst
pub(crate) mod text {
    use super::ROOT_KANAL;

    pub const START: &str = "Startet…";
    pub const VERBUNDEN: &str = "Verbunden";
    pub const GESTOPPT: &str = "Gestoppt";

    fn ziel(schleife: Option<&str>) -> &str {
        schleife.unwrap_or(ROOT_KANAL)
    }

    pub fn hoeren(schleife: Option<&str>) -> String {
        format!("Hoeren → {}", ziel(schleife))
    }

    pub fn sprechen(schleife: Option<&str>) -> String {
        format!("Sprechen → {}", ziel(schleife))
    }

    pub fn stumm(schleife: Option<&str>) -> String {
        format!("Stumm → {}", ziel(schleife))
    }

    pub fn eingang(geraet: u32) -> String {
        format!("Eingang → {geraet}")
    }

    pub fn ausgang(geraet: u32) -> String {
        format!("Ausgang → {geraet}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statustexte() {
        assert_eq!(text::hoeren(Some("FD")), "Hoeren → FD");
        assert_eq!(text::sprechen(None), "Sprechen → Root");
        assert_eq!(text::stumm(Some("A2G")), "Stumm → A2G");
        assert_eq!(text::ausgang(3), "Ausgang → 3");
    }

    #[test]
    fn status_json() {
        let mut s = BotStatus {
            status_text: text::VERBUNDEN.into(),
            ..Default::default()
        };
        s.participant_counts.insert("FD".into(), 2);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["status_text"], "Verbunden");
        assert_eq!(json["participant_counts"]["FD"], 2);
        assert!(json["current_loop"].is_null());
    }
}
