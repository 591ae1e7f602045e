//! Wiedergabe-Lautstaerke
//!
//! Jedes Ausgabe-Sample wird linear mit der aktuellen Bot-Lautstaerke
//! multipliziert und danach auf den i16-Bereich geclamped.

/// Skaliert einen einzelnen Sample-Wert.
#[inline]
pub fn skaliere_sample(sample: i16, volume: f32) -> i16 {
    (sample as f32 * volume).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Wendet die Lautstaerke in-place auf einen ganzen Buffer an
pub fn apply_volume(samples: &mut [i16], volume: f32) {
    for s in samples.iter_mut() {
        *s = skaliere_sample(*s, volume);
    }
}
