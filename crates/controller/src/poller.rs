//! Periodische Statusabfrage aller Bots
//!
//! Teilnehmerzahlen und Verbindungszustand lernt der Controller nur ueber
//! diese Abfrage. Bots werden nacheinander gefragt; wer nicht innerhalb des
//! Timeouts antwortet, wird in dieser Runde uebersprungen. Pro Schleife
//! gewinnt der zuletzt antwortende Bot.

use dashmap::DashMap;
use loopbot_bot::{BotControl, BotStatus};
use loopbot_core::BotId;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::controller::{AssignmentController, ControllerSnapshot};

pub type StatusCache = Arc<DashMap<BotId, BotStatus>>;

type Beobachter = Arc<dyn Fn(&ControllerSnapshot) + Send + Sync>;

pub struct StatusPoller<C> {
    controller: Arc<Mutex<AssignmentController<C>>>,
    cache: StatusCache,
    intervall: Duration,
    timeout: Duration,
    beobachter: Option<Beobachter>,
}

impl<C: BotControl + Clone + 'static> StatusPoller<C> {
    pub fn neu(
        controller: Arc<Mutex<AssignmentController<C>>>,
        intervall: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            controller,
            cache: Arc::new(DashMap::new()),
            intervall,
            timeout,
            beobachter: None,
        }
    }

    /// Wird nach jeder Runde mit dem aktuellen Snapshot aufgerufen
    pub fn mit_beobachter(
        mut self,
        beobachter: impl Fn(&ControllerSnapshot) + Send + Sync + 'static,
    ) -> Self {
        self.beobachter = Some(Arc::new(beobachter));
        self
    }

    /// Letzter bekannter Status pro Bot
    pub fn cache(&self) -> StatusCache {
        Arc::clone(&self.cache)
    }

    /// Eine Abfragerunde. Gibt die Anzahl antwortender Bots zurueck.
    pub async fn einmal(&self) -> usize {
        // Lock nie ueber ein await halten
        let bots = self.controller.lock().bots();
        let mut antworten = 0;

        for bot in bots {
            match tokio::time::timeout(self.timeout, bot.status()).await {
                Ok(Some(status)) => {
                    self.controller
                        .lock()
                        .teilnehmer_uebernehmen(&status.participant_counts);
                    self.cache.insert(bot.id().clone(), status);
                    antworten += 1;
                }
                Ok(None) => {
                    debug!(bot = %bot.id(), "Bot antwortet nicht");
                    self.cache.remove(bot.id());
                }
                Err(_) => {
                    debug!(bot = %bot.id(), "Statusabfrage Timeout");
                    self.cache.remove(bot.id());
                }
            }
        }

        if let Some(b) = &self.beobachter {
            let snapshot = self.controller.lock().snapshot();
            b(&snapshot);
        }
        trace!(antworten, "Abfragerunde beendet");
        antworten
    }

    /// Startet die Abfrage im festen Takt
    pub fn starten(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut takt = tokio::time::interval(self.intervall);
            takt.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                takt.tick().await;
                self.einmal().await;
            }
        })
    }
}
