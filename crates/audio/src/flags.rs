//! Geteilte Skalar-Zustaende eines Bots
//!
//! Werden von den Kommando-Handlern geschrieben und vom Relay-Worker sowie
//! vom Playback-Thread ohne Lock gelesen. Alle Felder sind einfache
//! Atomics; jede Aenderung ist ein idempotentes Ueberschreiben.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use loopbot_core::MAX_VERZOEGERUNG_SEKUNDEN;

/// Standard-Verzoegerung in Sekunden
pub const STANDARD_VERZOEGERUNG_SEKUNDEN: f64 = 3.0;

const KEIN_GERAET: usize = usize::MAX;

#[derive(Debug)]
pub struct RelayFlags {
    streaming: AtomicBool,
    delay_enabled: AtomicBool,
    delay_millis: AtomicU64,
    /// f32-Bits der Wiedergabe-Lautstaerke
    volume_bits: AtomicU32,
    ausgabe_geraet: AtomicUsize,
}

impl RelayFlags {
    pub fn new() -> Self {
        Self {
            streaming: AtomicBool::new(false),
            delay_enabled: AtomicBool::new(false),
            delay_millis: AtomicU64::new(sekunden_zu_millis(STANDARD_VERZOEGERUNG_SEKUNDEN)),
            volume_bits: AtomicU32::new(1.0f32.to_bits()),
            ausgabe_geraet: AtomicUsize::new(KEIN_GERAET),
        }
    }

    /// Sendet der Bot gerade ("talk")?
    pub fn streaming(&self) -> bool {
        self.streaming.load(Ordering::Acquire)
    }

    pub fn set_streaming(&self, streaming: bool) {
        self.streaming.store(streaming, Ordering::Release);
    }

    pub fn delay_enabled(&self) -> bool {
        self.delay_enabled.load(Ordering::Acquire)
    }

    /// Aktiviert den Delay-Modus mit der gegebenen Verzoegerung
    pub fn enable_delay(&self, sekunden: f64) {
        self.delay_millis
            .store(sekunden_zu_millis(sekunden), Ordering::Release);
        self.delay_enabled.store(true, Ordering::Release);
    }

    pub fn disable_delay(&self) {
        self.delay_enabled.store(false, Ordering::Release);
    }

    /// Aktuell konfigurierte Verzoegerung (auch wenn der Modus aus ist)
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_millis.load(Ordering::Acquire))
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Acquire))
    }

    /// Setzt die Lautstaerke, geclamped auf 0.0..=1.0. Gibt den gesetzten Wert zurueck.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let v = if volume.is_nan() { 1.0 } else { volume.clamp(0.0, 1.0) };
        self.volume_bits.store(v.to_bits(), Ordering::Release);
        v
    }

    /// Gewaehltes Ausgabegeraet (None = Standardgeraet)
    pub fn ausgabe_geraet(&self) -> Option<usize> {
        match self.ausgabe_geraet.load(Ordering::Acquire) {
            KEIN_GERAET => None,
            idx => Some(idx),
        }
    }

    pub fn set_ausgabe_geraet(&self, index: usize) {
        self.ausgabe_geraet.store(index, Ordering::Release);
    }
}

impl Default for RelayFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Negative und nicht-endliche Werte werden 0, zu grosse auf das Maximum begrenzt
fn sekunden_zu_millis(sekunden: f64) -> u64 {
    if sekunden.is_finite() && sekunden > 0.0 {
        (sekunden.min(MAX_VERZOEGERUNG_SEKUNDEN) * 1000.0).round() as u64
    } else {
        0
    }
}
