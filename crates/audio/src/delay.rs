//! Delay-Relay – verzoegerte Weitergabe von Capture-Audio
//!
//! ```text
//! Capture-Callback
//!     -> RelayEingang::einreihen (Zeitstempel, nicht blockierend)
//!     -> unbounded FIFO (crossbeam-channel)
//!     -> Relay-Worker (ein Thread pro Bot)
//!          Delay aus?        -> verwerfen
//!          warten bis captured_at + delay
//!          streaming == false -> verwerfen (spaet gebundenes Mute)
//!          sonst              -> FrameSink::play
//! ```
//!
//! Der Worker arbeitet strikt in Capture-Reihenfolge. Nur der Worker
//! schlaeft, der Capture-Pfad wartet nie.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

use crate::error::{AudioError, AudioResult};
use crate::flags::RelayFlags;
use crate::frame::DelayedFrame;

/// Wartezeit nach einem Ausgabefehler bevor der Worker weitermacht
pub const RELAY_BACKOFF: Duration = Duration::from_millis(10);

/// Laengster Schlaf am Stueck, bevor der Worker Delay und Verzoegerung neu liest
const WARTE_SCHEIBE: Duration = Duration::from_millis(20);

/// Ziel fuer abgespielte Frames (typischerweise die Voice-Session des Bots)
pub trait FrameSink: Send + 'static {
    fn play(&mut self, pcm: &[i16]) -> AudioResult<()>;
}

impl<F> FrameSink for F
where
    F: FnMut(&[i16]) -> AudioResult<()> + Send + 'static,
{
    fn play(&mut self, pcm: &[i16]) -> AudioResult<()> {
        self(pcm)
    }
}

/// Zaehler des Relay-Workers
#[derive(Debug, Default)]
pub struct RelayStats {
    played: AtomicU64,
    dropped: AtomicU64,
    fehler: AtomicU64,
}

impl RelayStats {
    pub fn played(&self) -> u64 {
        self.played.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn fehler(&self) -> u64 {
        self.fehler.load(Ordering::Relaxed)
    }

    fn verworfen(&self, n: u64) {
        self.dropped.fetch_add(n, Ordering::Relaxed);
    }
}

/// Klonbarer Eingang des Relays fuer den Capture-Callback
#[derive(Clone)]
pub struct RelayEingang {
    tx: Sender<DelayedFrame>,
}

impl RelayEingang {
    /// Stempelt den Frame jetzt und reiht ihn ein. Blockiert nie.
    pub fn einreihen(&self, pcm: Vec<i16>) {
        self.einreihen_frame(DelayedFrame::jetzt(pcm));
    }

    pub fn einreihen_frame(&self, frame: DelayedFrame) {
        if self.tx.send(frame).is_err() {
            warn!("Delay-Relay beendet, Frame verworfen");
        }
    }
}

/// Delay-Relay eines Bots
pub struct DelayRelay {
    eingang: RelayEingang,
    rx: Receiver<DelayedFrame>,
    flags: Arc<RelayFlags>,
    stats: Arc<RelayStats>,
    _worker: JoinHandle<()>,
}

impl DelayRelay {
    /// Startet den Relay-Worker-Thread.
    pub fn starten<S: FrameSink>(
        name: &str,
        flags: Arc<RelayFlags>,
        sink: S,
    ) -> AudioResult<Self> {
        let (tx, rx) = unbounded::<DelayedFrame>();
        let stats = Arc::new(RelayStats::default());

        let worker_rx = rx.clone();
        let worker_flags = Arc::clone(&flags);
        let worker_stats = Arc::clone(&stats);
        let worker = std::thread::Builder::new()
            .name(format!("loopbot-delay-{name}"))
            .spawn(move || relay_worker(worker_rx, worker_flags, worker_stats, sink))
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?;

        debug!(bot = name, "Delay-Relay gestartet");

        Ok(Self {
            eingang: RelayEingang { tx },
            rx,
            flags,
            stats,
            _worker: worker,
        })
    }

    pub fn eingang(&self) -> RelayEingang {
        self.eingang.clone()
    }

    pub fn einreihen(&self, pcm: Vec<i16>) {
        self.eingang.einreihen(pcm);
    }

    /// Aktiviert den Delay-Modus
    pub fn aktivieren(&self, sekunden: f64) {
        self.flags.enable_delay(sekunden);
    }

    /// Deaktiviert den Delay-Modus und verwirft alle wartenden Frames.
    ///
    /// Gibt die Anzahl verworfener Frames zurueck.
    pub fn deaktivieren(&self) -> usize {
        self.flags.disable_delay();
        let verworfen = self.rx.try_iter().count();
        self.stats.verworfen(verworfen as u64);
        debug!(verworfen, "Delay deaktiviert, Warteschlange geleert");
        verworfen
    }

    /// Anzahl noch nicht vom Worker abgeholter Frames
    pub fn wartend(&self) -> usize {
        self.rx.len()
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }
}

fn relay_worker<S: FrameSink>(
    rx: Receiver<DelayedFrame>,
    flags: Arc<RelayFlags>,
    stats: Arc<RelayStats>,
    mut sink: S,
) {
    while let Ok(frame) = rx.recv() {
        if !flags.delay_enabled() {
            trace!("Delay aus, Frame verworfen");
            stats.verworfen(1);
            continue;
        }

        // In Scheiben warten, damit eine geaenderte Verzoegerung sofort greift
        while flags.delay_enabled() {
            let Some(faellig) = frame.captured_at.checked_add(flags.delay()) else {
                break;
            };
            let jetzt = Instant::now();
            if faellig <= jetzt {
                break;
            }
            std::thread::sleep((faellig - jetzt).min(WARTE_SCHEIBE));
        }

        // Waehrend des Wartens deaktiviert: in-flight Audio wird verworfen
        if !flags.delay_enabled() {
            stats.verworfen(1);
            continue;
        }

        // Mute wird erst hier ausgewertet, nicht beim Capture
        if !flags.streaming() {
            trace!("Bot stumm, verzoegerter Frame verworfen");
            stats.verworfen(1);
            continue;
        }

        match sink.play(&frame.payload) {
            Ok(()) => {
                stats.played.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                error!("Delay-Relay Ausgabefehler: {}", e);
                stats.fehler.fetch_add(1, Ordering::Relaxed);
                std::thread::sleep(RELAY_BACKOFF);
            }
        }
    }
    debug!("Delay-Relay Worker beendet");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Gesammelt(Arc<Mutex<Vec<Vec<i16>>>>);

    impl Gesammelt {
        fn frames(&self) -> Vec<Vec<i16>> {
            self.0.lock().unwrap().clone()
        }
    }

    fn relay_mit_sammler(flags: Arc<RelayFlags>) -> (DelayRelay, Gesammelt) {
        let gesammelt = Gesammelt::default();
        let ziel = gesammelt.clone();
        let relay = DelayRelay::starten("test", flags, move |pcm: &[i16]| {
            ziel.0.lock().unwrap().push(pcm.to_vec());
            Ok(())
        })
        .unwrap();
        (relay, gesammelt)
    }

    fn warte_bis(bedingung: impl Fn() -> bool, max: Duration) {
        let start = Instant::now();
        while !bedingung() && start.elapsed() < max {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn frame_wird_nach_verzoegerung_gespielt() {
        let flags = Arc::new(RelayFlags::new());
        flags.set_streaming(true);
        let (relay, gesammelt) = relay_mit_sammler(Arc::clone(&flags));
        relay.aktivieren(0.1);

        let start = Instant::now();
        relay.einreihen(vec![1, 2, 3]);
        warte_bis(|| relay.stats().played() == 1, Duration::from_secs(2));

        assert!(start.elapsed() >= Duration::from_millis(100));
        assert_eq!(gesammelt.frames(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn reihenfolge_bleibt_erhalten() {
        let flags = Arc::new(RelayFlags::new());
        flags.set_streaming(true);
        let (relay, gesammelt) = relay_mit_sammler(Arc::clone(&flags));
        relay.aktivieren(0.05);

        for i in 0..10 {
            relay.einreihen(vec![i]);
        }
        warte_bis(|| relay.stats().played() == 10, Duration::from_secs(2));

        let reihenfolge: Vec<i16> = gesammelt.frames().into_iter().map(|f| f[0]).collect();
        assert_eq!(reihenfolge, (0..10).collect::<Vec<i16>>());
    }

    #[test]
    fn spaetes_mute_verwirft_frame() {
        // Frame bei t0 bei streaming=true, Mute bei t0+1/3, Worker wacht bei t0+1 auf
        let flags = Arc::new(RelayFlags::new());
        flags.set_streaming(true);
        let (relay, gesammelt) = relay_mit_sammler(Arc::clone(&flags));
        relay.aktivieren(0.3);

        relay.einreihen(vec![7; 16]);
        std::thread::sleep(Duration::from_millis(100));
        flags.set_streaming(false);

        warte_bis(|| relay.stats().dropped() == 1, Duration::from_secs(2));
        assert_eq!(relay.stats().dropped(), 1);
        assert_eq!(relay.stats().played(), 0);
        assert!(gesammelt.frames().is_empty());
    }

    #[test]
    fn delay_aus_verwirft_statt_echtzeit() {
        let flags = Arc::new(RelayFlags::new());
        flags.set_streaming(true);
        let (relay, gesammelt) = relay_mit_sammler(Arc::clone(&flags));

        // Delay-Modus nie aktiviert: Frames werden nicht in Echtzeit gespielt
        relay.einreihen(vec![1]);
        warte_bis(|| relay.stats().dropped() == 1, Duration::from_secs(1));
        assert!(gesammelt.frames().is_empty());
    }

    #[test]
    fn deaktivieren_leert_warteschlange() {
        let flags = Arc::new(RelayFlags::new());
        flags.set_streaming(true);
        let (relay, gesammelt) = relay_mit_sammler(Arc::clone(&flags));
        relay.aktivieren(0.5);

        for i in 0..5 {
            relay.einreihen(vec![i]);
        }
        // Der Worker haelt hoechstens einen Frame, der Rest wartet in der Queue
        std::thread::sleep(Duration::from_millis(20));
        let verworfen = relay.deaktivieren();
        assert!(verworfen >= 4, "verworfen: {}", verworfen);
        assert_eq!(relay.wartend(), 0);

        warte_bis(|| relay.stats().dropped() == 5, Duration::from_secs(2));
        assert_eq!(relay.stats().dropped(), 5);
        assert!(gesammelt.frames().is_empty());
    }

    #[test]
    fn gesenkte_verzoegerung_gibt_wartenden_frame_frei() {
        let flags = Arc::new(RelayFlags::new());
        flags.set_streaming(true);
        let (relay, gesammelt) = relay_mit_sammler(Arc::clone(&flags));
        relay.aktivieren(1e300);

        relay.einreihen(vec![1]);
        std::thread::sleep(Duration::from_millis(30));
        relay.aktivieren(0.0);
        relay.einreihen(vec![2]);

        warte_bis(|| relay.stats().played() == 2, Duration::from_secs(2));
        assert_eq!(gesammelt.frames(), vec![vec![1], vec![2]]);
        assert_eq!(relay.wartend(), 0);
    }

    #[test]
    fn ausgabefehler_beendet_worker_nicht() {
        let flags = Arc::new(RelayFlags::new());
        flags.set_streaming(true);
        let mut erster = true;
        let relay = DelayRelay::starten("fehler", Arc::clone(&flags), move |_: &[i16]| {
            if erster {
                erster = false;
                Err(AudioError::Senden("Server weg".into()))
            } else {
                Ok(())
            }
        })
        .unwrap();
        relay.aktivieren(0.0);

        relay.einreihen(vec![1]);
        relay.einreihen(vec![2]);
        warte_bis(|| relay.stats().played() == 1, Duration::from_secs(2));
        assert_eq!(relay.stats().fehler(), 1);
        assert_eq!(relay.stats().played(), 1);
    }
}
