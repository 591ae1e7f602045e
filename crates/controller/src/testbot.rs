//! Aufzeichnender Bot fuer Controller-Tests

use async_trait::async_trait;
use loopbot_bot::{BotCommand, BotControl, BotResult, BotStatus};
use loopbot_core::BotId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Gemeinsames Befehlsprotokoll aller Test-Bots in Sendereihenfolge
#[derive(Clone, Default)]
pub struct Protokoll(Arc<Mutex<Vec<(String, BotCommand)>>>);

impl Protokoll {
    pub fn alle(&self) -> Vec<(String, BotCommand)> {
        self.0.lock().clone()
    }

    /// Befehle eines Bots als Kurznamen, z.B. `["join", "mute"]`
    pub fn von(&self, bot: &str) -> Vec<&'static str> {
        self.0
            .lock()
            .iter()
            .filter(|(b, _)| b == bot)
            .map(|(_, c)| c.name())
            .collect()
    }

    pub fn leeren(&self) {
        self.0.lock().clear();
    }

    pub fn ist_leer(&self) -> bool {
        self.0.lock().is_empty()
    }
}

#[derive(Clone)]
pub struct TestBot {
    id: BotId,
    protokoll: Protokoll,
    status: Arc<Mutex<Option<BotStatus>>>,
    /// Antwortet erst nach dieser Zeit auf status()
    langsam: Option<std::time::Duration>,
}

impl TestBot {
    pub fn neu(name: &str, protokoll: &Protokoll) -> Self {
        Self {
            id: BotId::from(name),
            protokoll: protokoll.clone(),
            status: Arc::new(Mutex::new(None)),
            langsam: None,
        }
    }

    pub fn mit_zaehlung(self, zaehlung: &[(&str, u32)]) -> Self {
        let counts: HashMap<String, u32> =
            zaehlung.iter().map(|(n, c)| (n.to_string(), *c)).collect();
        *self.status.lock() = Some(BotStatus {
            status_text: "Verbunden".into(),
            participant_counts: counts,
            ..Default::default()
        });
        self
    }

    pub fn langsam(mut self, dauer: std::time::Duration) -> Self {
        self.langsam = Some(dauer);
        self
    }
}

#[async_trait]
impl BotControl for TestBot {
    fn id(&self) -> &BotId {
        &self.id
    }

    fn befehl(&self, befehl: BotCommand) -> BotResult<()> {
        befehl.pruefen()?;
        self.protokoll
            .0
            .lock()
            .push((self.id.as_str().to_string(), befehl));
        Ok(())
    }

    async fn status(&self) -> Option<BotStatus> {
        if let Some(d) = self.langsam {
            tokio::time::sleep(d).await;
        }
        self.status.lock().clone()
    }

    async fn users(&self) -> Option<Vec<String>> {
        Some(vec![self.id.as_str().to_string()])
    }
}
