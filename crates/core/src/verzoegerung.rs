//! Grenzen der Delay-Verzoegerung
//!
//! Controller, Bot-Befehle und Konfiguration pruefen Sekundenwerte hier,
//! damit nur Werte im Bereich `0..=MAX_VERZOEGERUNG_SEKUNDEN` in Timer
//! und Relay-Worker gelangen.

use std::time::Duration;

use crate::error::{LoopbotError, Result};

/// Groesste zulaessige Verzoegerung in Sekunden
pub const MAX_VERZOEGERUNG_SEKUNDEN: f64 = 600.0;

/// Prueft eine Verzoegerung und liefert sie als [`Duration`]
pub fn verzoegerung_pruefen(sekunden: f64) -> Result<Duration> {
    if !sekunden.is_finite() || !(0.0..=MAX_VERZOEGERUNG_SEKUNDEN).contains(&sekunden) {
        return Err(LoopbotError::UngueltigerBefehl(format!(
            "Verzoegerung ungueltig: {sekunden} (erlaubt 0..={MAX_VERZOEGERUNG_SEKUNDEN} s)"
        )));
    }
    Duration::try_from_secs_f64(sekunden)
        .map_err(|e| LoopbotError::UngueltigerBefehl(format!("Verzoegerung ungueltig: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gueltige_werte() {
        assert_eq!(verzoegerung_pruefen(0.0).unwrap(), Duration::ZERO);
        assert_eq!(verzoegerung_pruefen(2.5).unwrap(), Duration::from_millis(2500));
        assert_eq!(
            verzoegerung_pruefen(MAX_VERZOEGERUNG_SEKUNDEN).unwrap(),
            Duration::from_secs(600)
        );
    }

    #[test]
    fn zu_grosse_und_kaputte_werte_abgelehnt() {
        for s in [-0.5, 600.5, 1e20, 1e300, f64::INFINITY, f64::NAN] {
            let e = verzoegerung_pruefen(s).unwrap_err();
            assert!(e.ist_validierung(), "{s}: {e}");
        }
    }
}
