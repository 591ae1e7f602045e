//! Audio-Playback via cpal
//!
//! Der Playback-Thread eines Bots leert die Warteschlange eingehender
//! Netzwerk-Audio-Bloecke, skaliert sie mit der aktuellen Lautstaerke und
//! schreibt sie in das Ausgabegeraet. Geraetefehler werden geloggt, das
//! Geraet wird nach einem festen Backoff neu geoeffnet.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use crossbeam_channel::Receiver;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::{AudioError, AudioResult};
use crate::flags::RelayFlags;
use crate::frame::SAMPLE_RATE;
use crate::frame::sample_zu_f32;
use crate::volume::apply_volume;

/// Wartezeit nach einem Geraetefehler bevor neu geoeffnet wird
pub const PLAYBACK_BACKOFF: Duration = Duration::from_millis(500);

/// Maximale Wartezeit auf freien Platz im Ring-Buffer
const SCHREIB_TIMEOUT: Duration = Duration::from_secs(1);

/// Konfiguration fuer den Audio-Playback
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Abtastrate in Hz
    pub sample_rate: u32,
    /// Ring-Buffer Kapazitaet in Samples
    pub buffer_size: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            buffer_size: SAMPLE_RATE as usize / 2,
        }
    }
}

/// Ziel fuer lautstaerke-skalierte Samples
pub trait AudioOutput {
    fn schreiben(&mut self, samples: &[i16]) -> AudioResult<()>;
}

/// Ausgabe auf ein cpal-Geraet ueber einen lock-free Ring-Buffer
pub struct CpalAusgabe {
    _stream: Stream,
    producer: HeapProd<i16>,
    gestoert: Arc<AtomicBool>,
}

impl AudioOutput for CpalAusgabe {
    fn schreiben(&mut self, samples: &[i16]) -> AudioResult<()> {
        let start = Instant::now();
        let mut offset = 0;
        while offset < samples.len() {
            if self.gestoert.load(Ordering::Relaxed) {
                return Err(AudioError::StreamFehler("Ausgabegeraet gestoert".into()));
            }
            let n = self.producer.push_slice(&samples[offset..]);
            offset += n;
            if n == 0 {
                if start.elapsed() > SCHREIB_TIMEOUT {
                    return Err(AudioError::RingBufferVoll);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        Ok(())
    }
}

/// Oeffnet einen Mono-Playback-Stream auf dem gegebenen Geraet.
pub fn open_playback_stream(device: &Device, config: PlaybackConfig) -> AudioResult<CpalAusgabe> {
    let stream_config = StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let rb = HeapRb::<i16>::new(config.buffer_size);
    let (producer, mut consumer) = rb.split();

    let gestoert = Arc::new(AtomicBool::new(false));
    let gestoert_cb = Arc::clone(&gestoert);
    let err_fn = move |err| {
        error!("Playback-Fehler: {}", err);
        gestoert_cb.store(true, Ordering::Relaxed);
    };

    let supported = device
        .supported_output_configs()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?
        .find(|c| {
            c.min_sample_rate().0 <= config.sample_rate
                && c.max_sample_rate().0 >= config.sample_rate
        });

    let sample_format = supported
        .map(|c| c.sample_format())
        .unwrap_or(SampleFormat::F32);

    let stream = match sample_format {
        SampleFormat::I16 => device
            .build_output_stream(
                &stream_config,
                move |data: &mut [i16], _| {
                    let read = consumer.pop_slice(data);
                    // Stille fuer fehlende Samples
                    data[read..].fill(0);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?,
        SampleFormat::F32 => device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _| {
                    for out in data.iter_mut() {
                        *out = consumer.try_pop().map(sample_zu_f32).unwrap_or(0.0);
                    }
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

    debug!("Playback-Stream geoeffnet: {}Hz mono", config.sample_rate);

    Ok(CpalAusgabe {
        _stream: stream,
        producer,
        gestoert,
    })
}

/// Startet den Playback-Thread eines Bots.
///
/// `oeffnen` wird im Playback-Thread aufgerufen (cpal-Streams sind !Send)
/// und bekommt den aktuell gewaehlten Ausgabegeraete-Index. Wechselt der
/// Index in den [`RelayFlags`], wird das Geraet vor dem naechsten Block
/// neu geoeffnet.
pub fn playback_starten<O, F>(
    name: &str,
    flags: Arc<RelayFlags>,
    eingang: Receiver<Vec<i16>>,
    mut oeffnen: F,
    backoff: Duration,
) -> AudioResult<JoinHandle<()>>
where
    O: AudioOutput,
    F: FnMut(Option<usize>) -> AudioResult<O> + Send + 'static,
{
    let bot = name.to_string();
    std::thread::Builder::new()
        .name(format!("loopbot-playback-{name}"))
        .spawn(move || {
            let mut ausgabe: Option<(Option<usize>, O)> = None;

            while let Ok(mut pcm) = eingang.recv() {
                let gewuenscht = flags.ausgabe_geraet();
                if matches!(&ausgabe, Some((aktuell, _)) if *aktuell != gewuenscht) {
                    info!(bot = %bot, geraet = ?gewuenscht, "Ausgabegeraet gewechselt");
                    ausgabe = None;
                }

                if ausgabe.is_none() {
                    match oeffnen(gewuenscht) {
                        Ok(o) => ausgabe = Some((gewuenscht, o)),
                        Err(e) => {
                            warn!(bot = %bot, "Ausgabegeraet nicht verfuegbar: {}", e);
                            std::thread::sleep(backoff);
                            continue;
                        }
                    }
                }

                apply_volume(&mut pcm, flags.volume());
                if let Some((_, out)) = ausgabe.as_mut() {
                    if let Err(e) = out.schreiben(&pcm) {
                        error!(bot = %bot, "Playback-Fehler: {}", e);
                        ausgabe = None;
                        std::thread::sleep(backoff);
                    }
                }
            }
            debug!(bot = %bot, "Playback-Thread beendet");
        })
        .map_err(|e| AudioError::StreamFehler(e.to_string()))
}
