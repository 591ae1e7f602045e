//! Bot-Worker
//!
//! Ein Bot ist ein tokio-Task, der Befehle aus seiner Queue strikt
//! nacheinander anwendet. Daneben laufen pro Bot drei Audio-Aktivitaeten:
//! Capture (cpal-Callback), Delay-Relay-Worker und Playback-Thread. Die
//! Befehle schreiben nur in die geteilten [`RelayFlags`], die Audio-Threads
//! lesen sie ohne Lock.
//!
//! Verzoegerte Befehle (`leave_after_delay`, `mute_after_delay`) laufen als
//! eigene Timer-Tasks und schicken ihre Aktion zurueck in die Queue, damit
//! alle Zustandsaenderungen weiterhin im Bot-Task passieren.

use loopbot_audio::{
    ausgabegeraet, open_playback_stream, playback_starten, CaptureConfig, CaptureSteuerung,
    DelayRelay, PlaybackConfig, RelayFlags, PLAYBACK_BACKOFF,
};
use loopbot_core::BotId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::command::BotCommand;
use crate::control::BotHandle;
use crate::error::BotResult;
use crate::router::{CaptureRouter, SessionSink};
use crate::session::VoiceSession;
use crate::status::{text, BotStatus};

/// Groesse der Befehls-Queue pro Bot
pub const BEFEHLS_QUEUE_GROESSE: usize = 64;

/// Startparameter eines Bots
#[derive(Debug, Clone)]
pub struct BotKonfig {
    pub id: BotId,
    /// Capture und Playback ueber cpal oeffnen
    pub audio: bool,
    pub capture: CaptureConfig,
    pub eingabe_geraet: Option<u32>,
    pub ausgabe_geraet: Option<u32>,
    /// Wartezeit nach einem Geraetefehler im Playback
    pub backoff: Duration,
    /// Verzoegerte Befehle verwerfen, wenn seitdem ein anderer Befehl kam
    pub veraltete_timer_verwerfen: bool,
}

impl BotKonfig {
    pub fn neu(id: impl Into<BotId>) -> Self {
        Self {
            id: id.into(),
            audio: false,
            capture: CaptureConfig::default(),
            eingabe_geraet: None,
            ausgabe_geraet: None,
            backoff: PLAYBACK_BACKOFF,
            veraltete_timer_verwerfen: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Verzoegert {
    Mute,
    Leave,
}

pub(crate) enum Nachricht {
    Befehl(BotCommand),
    Verzoegert {
        aktion: Verzoegert,
        generation: u64,
    },
    Status(oneshot::Sender<BotStatus>),
    Benutzer(oneshot::Sender<Vec<String>>),
}

pub struct Bot<S: VoiceSession> {
    id: BotId,
    session: Arc<S>,
    flags: Arc<RelayFlags>,
    relay: DelayRelay,
    router: CaptureRouter<S>,
    capture: Option<CaptureSteuerung>,
    status_text: String,
    current_loop: Option<String>,
    input_device: Option<u32>,
    output_device: Option<u32>,
    /// Zaehlt direkte Zustandsbefehle, fuer das Verwerfen veralteter Timer
    generation: u64,
    veraltete_timer_verwerfen: bool,
}

impl<S: VoiceSession> Bot<S> {
    /// Baut den Bot und seine Audio-Pfade auf.
    ///
    /// `eingehend` ist die Empfangs-Queue der Voice-Session. Mit
    /// `konfig.audio == false` (headless) wird weder Capture noch Playback
    /// geoeffnet; fehlende Geraete werden nur geloggt.
    pub fn neu(
        konfig: BotKonfig,
        session: S,
        eingehend: Option<crossbeam_channel::Receiver<Vec<i16>>>,
    ) -> BotResult<Self> {
        let session = Arc::new(session);
        let flags = Arc::new(RelayFlags::new());
        let relay = DelayRelay::starten(
            konfig.id.as_str(),
            Arc::clone(&flags),
            SessionSink::neu(Arc::clone(&session)),
        )?;
        let router = CaptureRouter::neu(Arc::clone(&flags), relay.eingang(), Arc::clone(&session));

        if let Some(index) = konfig.ausgabe_geraet {
            flags.set_ausgabe_geraet(index as usize);
        }

        let mut capture = None;
        if konfig.audio {
            let weiter = router.clone();
            capture = Some(CaptureSteuerung::starten(
                konfig.id.as_str(),
                konfig.capture.clone(),
                konfig.eingabe_geraet.map(|i| i as usize),
                move |pcm| weiter.weiterleiten(pcm),
            )?);

            if let Some(rx) = eingehend {
                let playback = PlaybackConfig {
                    sample_rate: konfig.capture.sample_rate,
                    ..PlaybackConfig::default()
                };
                playback_starten(
                    konfig.id.as_str(),
                    Arc::clone(&flags),
                    rx,
                    move |index| {
                        ausgabegeraet(index).and_then(|d| open_playback_stream(&d, playback.clone()))
                    },
                    konfig.backoff,
                )?;
            }
        } else {
            debug!(bot = %konfig.id, "Audio deaktiviert, Bot laeuft headless");
        }

        Ok(Self {
            id: konfig.id,
            session,
            flags,
            relay,
            router,
            capture,
            status_text: text::START.to_string(),
            current_loop: None,
            input_device: konfig.eingabe_geraet,
            output_device: konfig.ausgabe_geraet,
            generation: 0,
            veraltete_timer_verwerfen: konfig.veraltete_timer_verwerfen,
        })
    }

    /// Eingang fuer Capture-Bloecke (auch ohne cpal nutzbar)
    pub fn capture_router(&self) -> CaptureRouter<S> {
        self.router.clone()
    }

    pub fn flags(&self) -> Arc<RelayFlags> {
        Arc::clone(&self.flags)
    }

    /// Startet den Bot-Task. Muss innerhalb einer tokio-Runtime laufen.
    pub fn starten(mut self) -> BotHandle {
        let (tx, rx) = mpsc::channel(BEFEHLS_QUEUE_GROESSE);
        let handle = BotHandle::neu(self.id.clone(), tx.clone());
        let selbst = tx.downgrade();
        drop(tx);

        if self.session.is_connected() {
            self.status_text = text::VERBUNDEN.to_string();
        }
        info!(bot = %self.id, "Bot gestartet");

        tokio::spawn(self.ausfuehren(rx, selbst));
        handle
    }

    async fn ausfuehren(
        mut self,
        mut rx: mpsc::Receiver<Nachricht>,
        selbst: mpsc::WeakSender<Nachricht>,
    ) {
        while let Some(nachricht) = rx.recv().await {
            match nachricht {
                Nachricht::Befehl(befehl) => self.anwenden(befehl, &selbst),
                Nachricht::Verzoegert { aktion, generation } => {
                    self.verzoegert_ausfuehren(aktion, generation)
                }
                Nachricht::Status(antwort) => {
                    let _ = antwort.send(self.status());
                }
                Nachricht::Benutzer(antwort) => {
                    let _ = antwort.send(self.session.user_names());
                }
            }
        }
        info!(bot = %self.id, "Bot beendet");
    }

    fn anwenden(&mut self, befehl: BotCommand, selbst: &mpsc::WeakSender<Nachricht>) {
        debug!(bot = %self.id, befehl = befehl.name(), "Befehl");
        match befehl {
            BotCommand::Join { loop_name } => {
                self.generation += 1;
                self.kanal_wechseln(Some(loop_name));
            }
            BotCommand::Leave => {
                self.generation += 1;
                self.kanal_wechseln(None);
            }
            BotCommand::Talk => {
                self.generation += 1;
                self.sprechen();
            }
            BotCommand::Mute => {
                self.generation += 1;
                self.stumm();
            }
            BotCommand::Stop => {
                self.generation += 1;
                self.stumm();
                if let Some(c) = &self.capture {
                    c.stoppen();
                }
                self.status_text = text::GESTOPPT.to_string();
            }
            BotCommand::SetVolume { volume } => {
                let gesetzt = self.flags.set_volume(volume);
                debug!(bot = %self.id, volume = gesetzt, "Lautstaerke gesetzt");
            }
            BotCommand::EnableDelay { seconds } => {
                self.relay.aktivieren(seconds);
                info!(bot = %self.id, seconds, "Delay aktiviert");
            }
            BotCommand::DisableDelay => {
                let verworfen = self.relay.deaktivieren();
                info!(bot = %self.id, verworfen, "Delay deaktiviert");
            }
            BotCommand::LeaveAfterDelay => self.planen(Verzoegert::Leave, selbst),
            BotCommand::MuteAfterDelay => self.planen(Verzoegert::Mute, selbst),
            BotCommand::SetInput { device } => {
                if let Some(c) = &self.capture {
                    c.geraet_wechseln(device as usize);
                }
                self.input_device = Some(device);
                self.status_text = text::eingang(device);
            }
            BotCommand::SetOutput { device } => {
                self.flags.set_ausgabe_geraet(device as usize);
                self.output_device = Some(device);
                self.status_text = text::ausgang(device);
            }
        }
    }

    fn planen(&self, aktion: Verzoegert, selbst: &mpsc::WeakSender<Nachricht>) {
        let Some(tx) = selbst.upgrade() else {
            return;
        };
        let dauer = self.flags.delay();
        let generation = self.generation;
        debug!(bot = %self.id, aktion = ?aktion, dauer_ms = dauer.as_millis() as u64, "Verzoegerter Befehl geplant");
        tokio::spawn(async move {
            tokio::time::sleep(dauer).await;
            let _ = tx.send(Nachricht::Verzoegert { aktion, generation }).await;
        });
    }

    fn verzoegert_ausfuehren(&mut self, aktion: Verzoegert, generation: u64) {
        if self.veraltete_timer_verwerfen && generation != self.generation {
            debug!(bot = %self.id, aktion = ?aktion, "Veralteter Timer verworfen");
            return;
        }
        match aktion {
            Verzoegert::Mute => self.stumm(),
            Verzoegert::Leave => {
                self.stumm();
                self.kanal_wechseln(None);
            }
        }
    }

    fn kanal_wechseln(&mut self, schleife: Option<String>) {
        if let Err(e) = self.session.join_channel(schleife.as_deref()) {
            warn!(bot = %self.id, "Kanalwechsel fehlgeschlagen: {}", e);
        }
        self.status_text = text::hoeren(schleife.as_deref());
        self.current_loop = schleife;
    }

    fn sprechen(&mut self) {
        self.flags.set_streaming(true);
        self.status_text = text::sprechen(self.current_loop.as_deref());
    }

    fn stumm(&mut self) {
        self.flags.set_streaming(false);
        self.status_text = text::stumm(self.current_loop.as_deref());
    }

    fn status(&self) -> BotStatus {
        BotStatus {
            status_text: self.status_text.clone(),
            current_loop: self.current_loop.clone(),
            streaming: self.flags.streaming(),
            input_device: self.input_device,
            output_device: self.output_device,
            participant_counts: self.session.participant_counts(),
        }
    }
}
