//! Audio-Geraete-Auswahl per Index
//!
//! Die Enumeration selbst liefert der Host; Bots bekommen nur einen
//! Geraete-Index (`setInput {device}` / `setOutput {device}`).

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;
use tracing::debug;

use crate::error::{AudioError, AudioResult};

/// Laedt ein Eingabegeraet anhand seines Index (None = Standardgeraet)
pub fn eingabegeraet(index: Option<usize>) -> AudioResult<Device> {
    let host = cpal::default_host();
    let device = match index {
        None => host
            .default_input_device()
            .ok_or(AudioError::KeinStandardEingabegeraet)?,
        Some(i) => host
            .input_devices()
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?
            .nth(i)
            .ok_or(AudioError::GeraetNichtGefunden(i))?,
    };
    debug!(
        index = ?index,
        name = %device.name().unwrap_or_else(|_| "<unbekannt>".into()),
        "Eingabegeraet gewaehlt"
    );
    Ok(device)
}

/// Laedt ein Ausgabegeraet anhand seines Index (None = Standardgeraet)
pub fn ausgabegeraet(index: Option<usize>) -> AudioResult<Device> {
    let host = cpal::default_host();
    let device = match index {
        None => host
            .default_output_device()
            .ok_or(AudioError::KeinStandardAusgabegeraet)?,
        Some(i) => host
            .output_devices()
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?
            .nth(i)
            .ok_or(AudioError::GeraetNichtGefunden(i))?,
    };
    debug!(
        index = ?index,
        name = %device.name().unwrap_or_else(|_| "<unbekannt>".into()),
        "Ausgabegeraet gewaehlt"
    );
    Ok(device)
}
