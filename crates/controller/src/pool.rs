//! Bot-Pool – Besitz- und Zuweisungsbuch der festen Bot-Liste
//!
//! Der Pool trifft selbst keine Entscheidungen ausser "welcher Bot ist frei
//! und am laengsten unbenutzt". Alles andere macht der Controller.

use loopbot_bot::BotControl;
use loopbot_core::BotId;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct PoolEintrag<C> {
    handle: C,
    zugewiesen: Option<String>,
    /// None = nie benutzt, gilt als aelter als jeder Zeitstempel
    zuletzt_benutzt: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct BotPool<C> {
    eintraege: Vec<PoolEintrag<C>>,
}

impl<C: BotControl> BotPool<C> {
    /// Die Reihenfolge der Handles ist die Roster-Reihenfolge
    pub fn neu(handles: Vec<C>) -> Self {
        Self {
            eintraege: handles
                .into_iter()
                .map(|handle| PoolEintrag {
                    handle,
                    zugewiesen: None,
                    zuletzt_benutzt: None,
                })
                .collect(),
        }
    }

    fn eintrag(&self, id: &BotId) -> Option<&PoolEintrag<C>> {
        self.eintraege.iter().find(|e| e.handle.id() == id)
    }

    fn eintrag_mut(&mut self, id: &BotId) -> Option<&mut PoolEintrag<C>> {
        self.eintraege.iter_mut().find(|e| e.handle.id() == id)
    }

    /// Freier Bot mit dem aeltesten `zuletzt_benutzt`.
    ///
    /// Gleichstand loest die Roster-Reihenfolge auf.
    pub fn find_idle(&self) -> Option<BotId> {
        self.eintraege
            .iter()
            .filter(|e| e.zugewiesen.is_none())
            .min_by_key(|e| e.zuletzt_benutzt)
            .map(|e| e.handle.id().clone())
    }

    pub fn get(&self, id: &BotId) -> Option<&C> {
        self.eintrag(id).map(|e| &e.handle)
    }

    pub fn zuweisen(&mut self, id: &BotId, schleife: &str) {
        if let Some(e) = self.eintrag_mut(id) {
            e.zugewiesen = Some(schleife.to_string());
        }
    }

    /// Gibt den Bot frei und stempelt ihn
    pub fn freigeben(&mut self, id: &BotId, jetzt: Instant) {
        if let Some(e) = self.eintrag_mut(id) {
            e.zugewiesen = None;
            e.zuletzt_benutzt = Some(jetzt);
        }
    }

    pub fn benutzt(&mut self, id: &BotId, jetzt: Instant) {
        if let Some(e) = self.eintrag_mut(id) {
            e.zuletzt_benutzt = Some(jetzt);
        }
    }

    pub fn zugewiesen(&self, id: &BotId) -> Option<&str> {
        self.eintrag(id).and_then(|e| e.zugewiesen.as_deref())
    }

    pub fn zuletzt_benutzt(&self, id: &BotId) -> Option<Instant> {
        self.eintrag(id).and_then(|e| e.zuletzt_benutzt)
    }

    pub fn idle_anzahl(&self) -> usize {
        self.eintraege.iter().filter(|e| e.zugewiesen.is_none()).count()
    }

    pub fn handles(&self) -> impl Iterator<Item = &C> {
        self.eintraege.iter().map(|e| &e.handle)
    }

    pub fn len(&self) -> usize {
        self.eintraege.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eintraege.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testbot::{Protokoll, TestBot};
    use std::time::Duration;

    fn pool(n: usize) -> BotPool<TestBot> {
        let protokoll = Protokoll::default();
        BotPool::neu(
            (1..=n)
                .map(|i| TestBot::neu(&format!("BOT{i}"), &protokoll))
                .collect(),
        )
    }

    #[test]
    fn gleichstand_nach_roster_reihenfolge() {
        let p = pool(3);
        assert_eq!(p.find_idle(), Some(BotId::from("BOT1")));
    }

    #[test]
    fn aeltester_freier_bot_gewinnt() {
        let mut p = pool(2);
        let t1 = Instant::now();
        let t2 = t1 + Duration::from_secs(1);
        p.freigeben(&BotId::from("BOT1"), t2);
        p.freigeben(&BotId::from("BOT2"), t1);
        assert_eq!(p.find_idle(), Some(BotId::from("BOT2")));
    }

    #[test]
    fn nie_benutzt_ist_aelter_als_benutzt() {
        let mut p = pool(2);
        p.benutzt(&BotId::from("BOT1"), Instant::now());
        assert_eq!(p.find_idle(), Some(BotId::from("BOT2")));
    }

    #[test]
    fn zugewiesene_bots_sind_nicht_frei() {
        let mut p = pool(2);
        p.zuweisen(&BotId::from("BOT1"), "FD");
        p.zuweisen(&BotId::from("BOT2"), "A2G");
        assert_eq!(p.find_idle(), None);
        assert_eq!(p.idle_anzahl(), 0);
        assert_eq!(p.zugewiesen(&BotId::from("BOT2")), Some("A2G"));

        p.freigeben(&BotId::from("BOT1"), Instant::now());
        assert_eq!(p.find_idle(), Some(BotId::from("BOT1")));
        assert!(p.zuletzt_benutzt(&BotId::from("BOT1")).is_some());
    }

    #[test]
    fn unbekannter_bot() {
        let mut p = pool(1);
        assert!(p.get(&BotId::from("BOT9")).is_none());
        // Kein Panic bei unbekannter Id
        p.zuweisen(&BotId::from("BOT9"), "FD");
        assert_eq!(p.idle_anzahl(), 1);
    }
}
