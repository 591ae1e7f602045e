//! Steuerflaeche eines Bots
//!
//! Alle Befehle sind einseitig: der Aufrufer wartet nie auf eine
//! Bestaetigung. Zustellfehler werden geloggt und verschluckt.

use async_trait::async_trait;
use loopbot_core::BotId;
use tokio::sync::{mpsc, oneshot};

use crate::bot::Nachricht;
use crate::command::BotCommand;
use crate::error::{BotError, BotResult};
use crate::status::BotStatus;

#[async_trait]
pub trait BotControl: Send + Sync {
    fn id(&self) -> &BotId;

    /// Prueft und stellt einen Befehl zu, ohne auf seine Ausfuehrung zu warten
    fn befehl(&self, befehl: BotCommand) -> BotResult<()>;

    /// Abgefragter Status, None wenn der Bot nicht antwortet
    async fn status(&self) -> Option<BotStatus>;

    /// Namen aller Benutzer, die die Voice-Session des Bots sieht
    async fn users(&self) -> Option<Vec<String>>;

    /// Stellt zu und loggt einen Fehler statt ihn zurueckzugeben
    fn senden(&self, befehl: BotCommand) {
        let name = befehl.name();
        if let Err(e) = self.befehl(befehl) {
            tracing::warn!(bot = %self.id(), befehl = name, "Befehl nicht zugestellt: {}", e);
        }
    }

    fn join(&self, loop_name: &str) {
        self.senden(BotCommand::Join {
            loop_name: loop_name.to_string(),
        });
    }

    fn leave(&self) {
        self.senden(BotCommand::Leave);
    }

    fn talk(&self) {
        self.senden(BotCommand::Talk);
    }

    fn mute(&self) {
        self.senden(BotCommand::Mute);
    }

    fn set_volume(&self, volume: f32) {
        self.senden(BotCommand::SetVolume { volume });
    }

    fn enable_delay(&self, seconds: f64) {
        self.senden(BotCommand::EnableDelay { seconds });
    }

    fn disable_delay(&self) {
        self.senden(BotCommand::DisableDelay);
    }

    fn leave_after_delay(&self) {
        self.senden(BotCommand::LeaveAfterDelay);
    }

    fn mute_after_delay(&self) {
        self.senden(BotCommand::MuteAfterDelay);
    }

    fn set_input(&self, device: u32) {
        self.senden(BotCommand::SetInput { device });
    }

    fn set_output(&self, device: u32) {
        self.senden(BotCommand::SetOutput { device });
    }
}

/// Handle auf einen laufenden Bot-Task
#[derive(Clone)]
pub struct BotHandle {
    id: BotId,
    tx: mpsc::Sender<Nachricht>,
}

impl BotHandle {
    pub(crate) fn neu(id: BotId, tx: mpsc::Sender<Nachricht>) -> Self {
        Self { id, tx }
    }

    fn zustellen(&self, nachricht: Nachricht) -> BotResult<()> {
        self.tx.try_send(nachricht).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                BotError::NichtErreichbar(format!("{}: Befehls-Queue voll", self.id))
            }
            mpsc::error::TrySendError::Closed(_) => {
                BotError::NichtErreichbar(format!("{}: Bot beendet", self.id))
            }
        })
    }
}

#[async_trait]
impl BotControl for BotHandle {
    fn id(&self) -> &BotId {
        &self.id
    }

    fn befehl(&self, befehl: BotCommand) -> BotResult<()> {
        befehl.pruefen()?;
        self.zustellen(Nachricht::Befehl(befehl))
    }

    async fn status(&self) -> Option<BotStatus> {
        let (tx, rx) = oneshot::channel();
        self.zustellen(Nachricht::Status(tx)).ok()?;
        rx.await.ok()
    }

    async fn users(&self) -> Option<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        self.zustellen(Nachricht::Benutzer(tx)).ok()?;
        rx.await.ok()
    }
}

impl std::fmt::Debug for BotHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotHandle").field("id", &self.id).finish()
    }
}
