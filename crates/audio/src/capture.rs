//! Mikrofon-Capture via cpal
//!
//! Oeffnet einen cpal InputStream, wandelt die Samples in 16-bit PCM und
//! reicht volle Bloecke an einen Callback weiter. Der Callback laeuft im
//! cpal-Thread und darf nie blockieren.
//!
//! cpal::Stream ist !Send, deshalb lebt der Stream in einem eigenen
//! std::thread, der per Kommando-Kanal neu geoeffnet werden kann.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use crossbeam_channel::{unbounded, Sender};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::device::eingabegeraet;
use crate::error::{AudioError, AudioResult};
use crate::frame::{sample_aus_f32, BLOCK_SIZE, SAMPLE_RATE};

/// Konfiguration fuer den Audio-Capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Abtastrate in Hz
    pub sample_rate: u32,
    /// Samples pro weitergereichtem Block
    pub block_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            block_size: BLOCK_SIZE,
        }
    }
}

/// Sammelt einzelne Samples zu Bloecken fester Groesse
struct Blocker<F> {
    puffer: Vec<i16>,
    block: usize,
    ziel: F,
}

impl<F: FnMut(Vec<i16>)> Blocker<F> {
    fn neu(block: usize, ziel: F) -> Self {
        let block = block.max(1);
        Self {
            puffer: Vec::with_capacity(block),
            block,
            ziel,
        }
    }

    fn schieben(&mut self, samples: impl Iterator<Item = i16>) {
        for s in samples {
            self.puffer.push(s);
            if self.puffer.len() >= self.block {
                let voll = std::mem::replace(&mut self.puffer, Vec::with_capacity(self.block));
                (self.ziel)(voll);
            }
        }
    }
}

/// Audio-Capture-Stream
///
/// Wird der CaptureStream gedroppt, stoppt die Aufnahme automatisch.
pub struct CaptureStream {
    _stream: Stream,
    config: CaptureConfig,
}

impl CaptureStream {
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

/// Oeffnet einen Mono-Capture-Stream auf dem gegebenen Geraet.
pub fn open_capture_stream<F>(
    device: &Device,
    config: CaptureConfig,
    on_block: F,
) -> AudioResult<CaptureStream>
where
    F: FnMut(Vec<i16>) + Send + 'static,
{
    let stream_config = StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let err_fn = |err| error!("Capture-Fehler: {}", err);

    let supported = device
        .supported_input_configs()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?
        .find(|c| {
            c.min_sample_rate().0 <= config.sample_rate
                && c.max_sample_rate().0 >= config.sample_rate
        });

    let sample_format = supported
        .map(|c| c.sample_format())
        .unwrap_or(SampleFormat::F32);

    let mut blocker = Blocker::neu(config.block_size, on_block);

    let stream = match sample_format {
        SampleFormat::F32 => device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _| {
                    blocker.schieben(data.iter().copied().map(sample_aus_f32));
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
        SampleFormat::I16 => device
            .build_input_stream(
                &stream_config,
                move |data: &[i16], _| {
                    blocker.schieben(data.iter().copied());
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
        _ => {
            return Err(AudioError::StreamFehler(format!(
                "Nicht unterstuetztes Sample-Format: {:?}",
                sample_format
            )))
        }
    };

    stream
        .play()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;

    debug!("Capture-Stream geoeffnet: {}Hz mono", config.sample_rate);

    Ok(CaptureStream {
        _stream: stream,
        config,
    })
}

enum CaptureKommando {
    Geraet(Option<usize>),
    Stoppen,
}

/// Haelt den Capture-Stream eines Bots in einem eigenen Thread.
pub struct CaptureSteuerung {
    tx: Sender<CaptureKommando>,
    _thread: JoinHandle<()>,
}

impl CaptureSteuerung {
    /// Startet den Capture-Thread und oeffnet das gegebene Geraet.
    ///
    /// Ein Fehler beim Oeffnen wird geloggt; der Thread wartet dann auf
    /// den naechsten Geraetewechsel.
    pub fn starten<F>(
        name: &str,
        config: CaptureConfig,
        geraet: Option<usize>,
        on_block: F,
    ) -> AudioResult<Self>
    where
        F: FnMut(Vec<i16>) + Clone + Send + 'static,
    {
        let (tx, rx) = unbounded::<CaptureKommando>();
        let bot = name.to_string();

        let thread = std::thread::Builder::new()
            .name(format!("loopbot-capture-{name}"))
            .spawn(move || {
                let oeffnen = |index: Option<usize>| -> Option<CaptureStream> {
                    match eingabegeraet(index)
                        .and_then(|d| open_capture_stream(&d, config.clone(), on_block.clone()))
                    {
                        Ok(s) => {
                            info!(bot = %bot, geraet = ?index, "Capture gestartet");
                            Some(s)
                        }
                        Err(e) => {
                            warn!(bot = %bot, geraet = ?index, "Capture nicht moeglich: {}", e);
                            None
                        }
                    }
                };

                let mut aktiv = oeffnen(geraet);
                for kommando in rx.iter() {
                    match kommando {
                        CaptureKommando::Geraet(index) => {
                            // Alten Stream schliessen bevor das neue Geraet geoeffnet wird
                            drop(aktiv.take());
                            aktiv = oeffnen(index);
                        }
                        CaptureKommando::Stoppen => {
                            if aktiv.take().is_some() {
                                info!(bot = %bot, "Capture gestoppt");
                            }
                        }
                    }
                }
                debug!(bot = %bot, "Capture-Thread beendet");
            })
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?;

        Ok(Self {
            tx,
            _thread: thread,
        })
    }

    /// Schliesst den aktuellen Stream und oeffnet das neue Geraet
    pub fn geraet_wechseln(&self, index: usize) {
        let _ = self.tx.send(CaptureKommando::Geraet(Some(index)));
    }

    pub fn stoppen(&self) {
        let _ = self.tx.send(CaptureKommando::Stoppen);
    }
}
