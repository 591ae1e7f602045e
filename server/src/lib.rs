//! loopbot-server – Bibliotheks-Root
//!
//! Baut aus der Konfiguration den kompletten Laufzeitverbund: lokaler
//! Voice-Server, Bot-Pool, Controller, Status-Poller und REST-API.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::ServerConfig;
use loopbot_audio::CaptureConfig;
use loopbot_bot::{Bot, BotHandle, BotKonfig, LocalVoiceServer};
use loopbot_commander::{CommanderState, RestServer, RestServerKonfig};
use loopbot_controller::{
    AssignmentController, BotPool, ControllerKonfig, LoopRegistry, StatusPoller,
};
use loopbot_observability::{observability_router, HealthState, LoopbotMetrics};
use parking_lot::Mutex;

/// Alle laufenden Teile nach dem Aufbau
pub struct Laufzeit {
    pub voice: LocalVoiceServer,
    pub controller: Arc<Mutex<AssignmentController<BotHandle>>>,
    pub poller: StatusPoller<BotHandle>,
    pub state: CommanderState,
    pub health: HealthState,
    pub metriken: LoopbotMetrics,
}

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    fn bot_konfig(&self, name: &str) -> BotKonfig {
        let audio = &self.config.audio;
        BotKonfig {
            audio: audio.aktiv,
            capture: CaptureConfig {
                sample_rate: audio.sample_rate,
                block_size: audio.block_size,
            },
            eingabe_geraet: audio.eingabe_geraet,
            ausgabe_geraet: audio.ausgabe_geraet,
            backoff: Duration::from_millis(audio.backoff_ms),
            veraltete_timer_verwerfen: self.config.verzoegerung.veraltete_timer_verwerfen,
            ..BotKonfig::neu(name)
        }
    }

    /// Baut alle Teile auf, ohne Netzwerk-Listener zu oeffnen.
    ///
    /// Muss innerhalb einer Tokio-Runtime laufen (Bots sind Tasks).
    pub fn aufbauen(&self) -> Result<Laufzeit> {
        let cfg = &self.config;
        let katalog = cfg.katalog_pfad();
        let registry = LoopRegistry::laden(&katalog)
            .with_context(|| format!("Schleifenkatalog '{}'", katalog.display()))?;

        let voice = LocalVoiceServer::neu();
        for l in registry.iter() {
            voice.kanal_anlegen(l.name.clone());
        }
        tracing::info!(
            host = %cfg.verbindung.host,
            port = cfg.verbindung.port,
            kanaele = registry.len(),
            "Voice-Server bereit"
        );

        let mut handles = Vec::with_capacity(cfg.bots.anzahl);
        for name in cfg.bot_namen() {
            let (session, eingehend) = voice.verbinden(&name)?;
            let bot = Bot::neu(self.bot_konfig(&name), session, Some(eingehend))?;
            handles.push(bot.starten());
        }

        let mut controller = AssignmentController::neu(
            registry,
            BotPool::neu(handles),
            ControllerKonfig {
                delay_enabled: false,
                delay_seconds: cfg.verzoegerung.sekunden,
                veraltete_timer_verwerfen: cfg.verzoegerung.veraltete_timer_verwerfen,
            },
        );
        if cfg.verzoegerung.aktiv {
            // Bots kennen den Delay-Modus erst nach dem Broadcast
            controller.set_delay(true, None)?;
        }
        let controller = Arc::new(Mutex::new(controller));

        let metriken = LoopbotMetrics::neu()?;
        let health = HealthState::neu(cfg.bots.anzahl);

        let poller = StatusPoller::neu(
            Arc::clone(&controller),
            cfg.abfrage_intervall(),
            cfg.abfrage_timeout(),
        );
        let cache = poller.cache();
        let poller = {
            let cache = Arc::clone(&cache);
            let metriken = metriken.clone();
            let health = health.clone();
            poller.mit_beobachter(move |snap| {
                // Nicht antwortende Bots fehlen im Cache
                let antwortend = cache.len();
                metriken.aktualisieren(snap, antwortend);
                health.erreichbar_setzen(antwortend);
            })
        };

        let state = CommanderState::neu(Arc::clone(&controller), cache);
        Ok(Laufzeit {
            voice,
            controller,
            poller,
            state,
            health,
            metriken,
        })
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Katalog laden, Voice-Kanaele anlegen
    /// 2. Bots starten und dem Controller uebergeben
    /// 3. Status-Poller starten
    /// 4. REST-API starten, auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        let laufzeit = self.aufbauen()?;
        let poller = laufzeit.poller.starten();

        let rest = RestServerKonfig {
            bind_addr: self.config.api_bind_adresse()?,
            cors_origins: self.config.api.cors_origins.clone(),
        };
        let zusatz = observability_router(laufzeit.health, laufzeit.metriken);

        tracing::info!("loopbot laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        let ergebnis = RestServer::neu(rest)
            .starten(laufzeit.state, zusatz, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Ctrl-C-Handler fehlgeschlagen: {e}");
                }
                tracing::info!("Shutdown-Signal empfangen, loopbot wird beendet");
            })
            .await;

        poller.abort();
        // Bots verlassen ihre Schleifen, bevor die Tasks enden
        for bot in laufzeit.controller.lock().bots() {
            loopbot_bot::BotControl::leave(&bot);
        }
        ergebnis
    }
}
