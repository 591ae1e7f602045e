//! Audio-Frames des Bot-Pfads
//!
//! Capture liefert f32-Samples (-1.0..1.0), auf dem Draht zur Voice-Session
//! laufen 16-bit PCM Samples (mono, 48 kHz).

use std::time::Instant;

/// Abtastrate aller Bot-Streams
pub const SAMPLE_RATE: u32 = 48000;
/// Blockgroesse eines Capture-Frames in Samples
pub const BLOCK_SIZE: usize = 2048;

/// Ein zeitgestempelter Capture-Frame fuer das Delay-Relay.
///
/// Wird genau einmal konsumiert: abgespielt oder verworfen.
#[derive(Debug, Clone)]
pub struct DelayedFrame {
    pub captured_at: Instant,
    pub payload: Vec<i16>,
}

impl DelayedFrame {
    /// Stempelt den Frame mit dem aktuellen Zeitpunkt
    pub fn jetzt(payload: Vec<i16>) -> Self {
        Self {
            captured_at: Instant::now(),
            payload,
        }
    }
}

/// Wandelt ein f32-Sample in 16-bit PCM (`sample * 32767`, saettigend)
#[inline]
pub fn sample_aus_f32(sample: f32) -> i16 {
    (sample * i16::MAX as f32) as i16
}

/// Wandelt ein 16-bit Sample zurueck in f32 (-1.0..1.0)
#[inline]
pub fn sample_zu_f32(sample: i16) -> f32 {
    sample as f32 / (i16::MAX as f32 + 1.0)
}
