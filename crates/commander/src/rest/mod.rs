//! REST-Interface fuer den loopbot Commander

pub mod handlers;
pub mod routes;
pub mod server;

use std::sync::Arc;

use loopbot_bot::BotHandle;
use loopbot_controller::{AssignmentController, StatusCache};
use loopbot_core::BotId;
use parking_lot::Mutex;

use crate::error::{CommanderError, CommanderResult};

/// Gemeinsam genutzter Controller hinter einem Lock
pub type GeteilterController = Arc<Mutex<AssignmentController<BotHandle>>>;

/// Axum-State fuer den Commander-REST-Server
#[derive(Clone)]
pub struct CommanderState {
    pub controller: GeteilterController,
    /// Letzter abgefragter Status pro Bot, befuellt vom Poller
    pub status: StatusCache,
}

impl CommanderState {
    pub fn neu(controller: GeteilterController, status: StatusCache) -> Self {
        Self { controller, status }
    }

    /// Geklontes Handle eines Bots. Der Lock ist danach wieder frei.
    pub fn bot(&self, id: &str) -> CommanderResult<BotHandle> {
        self.controller
            .lock()
            .bot(&BotId::from(id))
            .cloned()
            .ok_or_else(|| CommanderError::NichtGefunden(format!("Bot {id}")))
    }
}

#[cfg(test)]
pub(crate) mod testumgebung {
    use super::*;
    use loopbot_bot::{Bot, BotKonfig, LocalVoiceServer};
    use loopbot_controller::{BotPool, ControllerKonfig, LoopRegistry};
    use loopbot_core::Loop;

    /// Zwei Schleifen (A sprechfaehig, B nur hoeren) und echte Bots auf
    /// einem lokalen Voice-Server
    pub fn state(bots: &[&str]) -> (CommanderState, LocalVoiceServer) {
        let server = LocalVoiceServer::neu();
        server.kanal_anlegen("A");
        server.kanal_anlegen("B");

        let handles = bots
            .iter()
            .map(|name| {
                let (session, _rx) = server.verbinden(name).unwrap();
                Bot::neu(BotKonfig::neu(*name), session, None)
                    .unwrap()
                    .starten()
            })
            .collect();

        let registry =
            LoopRegistry::neu(vec![Loop::neu("A", true, true), Loop::neu("B", true, false)])
                .unwrap();
        let controller =
            AssignmentController::neu(registry, BotPool::neu(handles), ControllerKonfig::default());
        let state = CommanderState::neu(Arc::new(Mutex::new(controller)), Default::default());
        (state, server)
    }
}
