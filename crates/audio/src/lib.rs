//! loopbot-audio – Audio-Pfad eines Bots
//!
//! - Mikrofon-Capture via cpal, 48 kHz mono, 2048er Bloecke
//! - Delay-Relay: zeitgestempelte FIFO mit spaet gebundenem Mute
//! - Lautsprecher-Playback mit Bot-Lautstaerke und Geraete-Backoff
//! - Geteilte Atomics fuer Streaming, Delay und Lautstaerke

pub mod capture;
pub mod delay;
pub mod device;
pub mod error;
pub mod flags;
pub mod frame;
pub mod playback;
pub mod volume;

pub use capture::{open_capture_stream, CaptureConfig, CaptureStream, CaptureSteuerung};
pub use delay::{DelayRelay, FrameSink, RelayEingang, RelayStats, RELAY_BACKOFF};
pub use device::{ausgabegeraet, eingabegeraet};
pub use error::{AudioError, AudioResult};
pub use flags::{RelayFlags, STANDARD_VERZOEGERUNG_SEKUNDEN};
pub use frame::{sample_aus_f32, sample_zu_f32, DelayedFrame, BLOCK_SIZE, SAMPLE_RATE};
pub use playback::{
    open_playback_stream, playback_starten, AudioOutput, CpalAusgabe, PlaybackConfig,
    PLAYBACK_BACKOFF,
};
pub use volume::{apply_volume, skaliere_sample};
