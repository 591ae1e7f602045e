//! AssignmentController – zentrale Zustandsmaschine
//!
//! Bildet Schleifen auf den festen Bot-Pool ab. Alle Uebergaenge laufen
//! seriell durch `&mut self`; Befehle an Bots sind einseitig, die eigene
//! Buchfuehrung wird beim Absenden aktualisiert, nicht bei Bestaetigung.
//!
//! Invarianten nach jeder Operation:
//! - hoechstens eine Schleife im Zustand TALK
//! - jede aktive Schleife hat genau einen Bot, kein Bot gehoert zwei Schleifen

use loopbot_bot::BotControl;
use loopbot_core::{
    verzoegerung_pruefen, BotId, Loop, LoopState, LoopbotError, Result, MAX_VERZOEGERUNG_SEKUNDEN,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::pool::BotPool;
use crate::registry::LoopRegistry;

/// Laufzeit-Einstellungen des Controllers
#[derive(Debug, Clone)]
pub struct ControllerKonfig {
    pub delay_enabled: bool,
    pub delay_seconds: f64,
    /// Verzoegertes `talk` verwerfen, wenn die Schleife seitdem umgeschaltet wurde
    pub veraltete_timer_verwerfen: bool,
}

impl Default for ControllerKonfig {
    fn default() -> Self {
        Self {
            delay_enabled: false,
            delay_seconds: 3.0,
            veraltete_timer_verwerfen: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SchleifenZustand {
    state: LoopState,
    bot: Option<BotId>,
}

/// Anzeige einer Schleife fuer Aufrufer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchleifenAnsicht {
    pub name: String,
    pub can_listen: bool,
    pub can_talk: bool,
    pub state: LoopState,
    pub bot: Option<BotId>,
    pub teilnehmer: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub loops: Vec<SchleifenAnsicht>,
    pub delay_enabled: bool,
    pub delay_seconds: f64,
    pub idle_bots: usize,
    pub pool_erschoepft: u64,
}

pub struct AssignmentController<C> {
    registry: LoopRegistry,
    pool: BotPool<C>,
    zustaende: HashMap<String, SchleifenZustand>,
    teilnehmer: HashMap<String, u32>,
    generationen: HashMap<String, Arc<AtomicU64>>,
    konfig: ControllerKonfig,
    pool_erschoepft: u64,
}

impl<C: BotControl + Clone + 'static> AssignmentController<C> {
    pub fn neu(registry: LoopRegistry, pool: BotPool<C>, konfig: ControllerKonfig) -> Self {
        let zustaende = registry
            .iter()
            .map(|l| (l.name.clone(), SchleifenZustand::default()))
            .collect();
        let teilnehmer = registry.iter().map(|l| (l.name.clone(), 0)).collect();
        let generationen = registry
            .iter()
            .map(|l| (l.name.clone(), Arc::new(AtomicU64::new(0))))
            .collect();
        info!(
            schleifen = registry.len(),
            bots = pool.len(),
            delay = konfig.delay_enabled,
            "Controller bereit"
        );
        Self {
            registry,
            pool,
            zustaende,
            teilnehmer,
            generationen,
            konfig,
            pool_erschoepft: 0,
        }
    }

    fn schleife(&self, name: &str) -> Result<Loop> {
        self.registry
            .get(name)
            .cloned()
            .ok_or_else(|| LoopbotError::LoopNichtGefunden(name.to_string()))
    }

    fn zustand(&self, name: &str) -> SchleifenZustand {
        self.zustaende.get(name).cloned().unwrap_or_default()
    }

    /// Macht ausstehende verzoegerte Befehle dieser Schleife ungueltig
    fn generation_erhoehen(&self, name: &str) {
        if let Some(g) = self.generationen.get(name) {
            g.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Setzt den gewuenschten Zustand einer Schleife.
    ///
    /// Gibt den tatsaechlich eingenommenen Zustand zurueck. Ist kein Bot
    /// frei, bleibt die Schleife OFF und es wird kein Befehl gesendet.
    pub fn set_loop_state(&mut self, name: &str, gewuenscht: LoopState) -> Result<LoopState> {
        let schleife = self.schleife(name)?;
        let mut neu = gewuenscht;
        if !schleife.can_talk && neu == LoopState::Talk {
            // Nicht sprechfaehig: TALK wird zu OFF, nicht zu LISTEN
            debug!(loop_name = name, "TALK auf nicht sprechfaehiger Schleife, gehe auf OFF");
            neu = LoopState::Off;
        }

        let alt = self.zustand(name);
        let jetzt = Instant::now();

        if neu == LoopState::Off {
            if let Some(bot_id) = alt.bot {
                self.generation_erhoehen(name);
                if let Some(bot) = self.pool.get(&bot_id) {
                    if self.konfig.delay_enabled && alt.state == LoopState::Talk {
                        bot.leave_after_delay();
                    } else {
                        bot.leave();
                        bot.mute();
                    }
                }
                self.pool.freigeben(&bot_id, jetzt);
                info!(loop_name = name, bot = %bot_id, "Schleife aus, Bot freigegeben");
            }
            self.zustaende
                .insert(name.to_string(), SchleifenZustand::default());
            return Ok(LoopState::Off);
        }

        let bot_id = match alt.bot.clone() {
            Some(id) => id,
            None => match self.pool.find_idle() {
                Some(id) => {
                    self.pool.zuweisen(&id, name);
                    id
                }
                None => {
                    self.pool_erschoepft += 1;
                    warn!(loop_name = name, "Kein freier Bot, Anfrage ignoriert");
                    return Ok(alt.state);
                }
            },
        };
        let Some(bot) = self.pool.get(&bot_id).cloned() else {
            return Err(LoopbotError::BotNichtGefunden(bot_id.to_string()));
        };
        self.generation_erhoehen(name);

        if neu == LoopState::Talk {
            self.andere_sprecher_herabstufen(name, jetzt);
            bot.join(name);
            if self.konfig.delay_enabled {
                self.talk_planen(name, bot);
            } else {
                bot.talk();
            }
        } else if alt.state == LoopState::Talk && self.konfig.delay_enabled {
            bot.mute_after_delay();
        } else {
            bot.join(name);
            bot.mute();
        }

        self.pool.zuweisen(&bot_id, name);
        self.pool.benutzt(&bot_id, jetzt);
        info!(loop_name = name, bot = %bot_id, von = %alt.state, nach = %neu, "Schleife umgeschaltet");
        self.zustaende.insert(
            name.to_string(),
            SchleifenZustand {
                state: neu,
                bot: Some(bot_id),
            },
        );
        Ok(neu)
    }

    /// Stuft jede andere sprechende Schleife auf LISTEN herab.
    ///
    /// Der Bot bleibt verbunden und wird nur stumm geschaltet.
    fn andere_sprecher_herabstufen(&mut self, ausser: &str, jetzt: Instant) {
        let sprecher: Vec<(String, BotId)> = self
            .registry
            .iter()
            .filter(|l| l.name != ausser)
            .filter_map(|l| {
                let z = self.zustaende.get(&l.name)?;
                match (&z.state, &z.bot) {
                    (LoopState::Talk, Some(bot)) => Some((l.name.clone(), bot.clone())),
                    _ => None,
                }
            })
            .collect();

        for (name, bot_id) in sprecher {
            if let Some(bot) = self.pool.get(&bot_id) {
                if self.konfig.delay_enabled {
                    bot.mute_after_delay();
                } else {
                    bot.mute();
                }
            }
            self.generation_erhoehen(&name);
            self.pool.benutzt(&bot_id, jetzt);
            self.zustaende.insert(
                name.clone(),
                SchleifenZustand {
                    state: LoopState::Listen,
                    bot: Some(bot_id.clone()),
                },
            );
            info!(loop_name = %name, bot = %bot_id, "Sprecher auf LISTEN herabgestuft");
        }
    }

    /// `talk` nach der Verzoegerung, damit der Beitritt nicht vor dem
    /// verzoegerten Audio beim Hoerer ankommt
    fn talk_planen(&self, name: &str, bot: C) {
        // Die Zuweisung ist hier bereits gebucht, daher kein Fehlerpfad mehr
        let dauer = verzoegerung_pruefen(
            self.konfig
                .delay_seconds
                .clamp(0.0, MAX_VERZOEGERUNG_SEKUNDEN),
        )
        .unwrap_or(Duration::ZERO);
        let waechter = if self.konfig.veraltete_timer_verwerfen {
            self.generationen
                .get(name)
                .map(|g| (Arc::clone(g), g.load(Ordering::Acquire)))
        } else {
            None
        };
        let schleife = name.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(dauer).await;
            if let Some((generation, erwartet)) = waechter {
                if generation.load(Ordering::Acquire) != erwartet {
                    debug!(loop_name = %schleife, "Veraltetes talk verworfen");
                    return;
                }
            }
            debug!(loop_name = %schleife, bot = %bot.id(), "Verzoegertes talk");
            bot.talk();
        });
    }

    /// Klick-Semantik: OFF -> LISTEN -> TALK -> LISTEN.
    ///
    /// Klicks auf Schleifen ohne Hoerrecht werden ignoriert.
    pub fn click(&mut self, name: &str) -> Result<LoopState> {
        let schleife = self.schleife(name)?;
        let aktuell = self.zustand(name).state;
        if !schleife.can_listen {
            debug!(loop_name = name, "Klick auf Schleife ohne Hoerrecht ignoriert");
            return Ok(aktuell);
        }
        self.set_loop_state(name, aktuell.nach_klick(schleife.can_talk))
    }

    pub fn off(&mut self, name: &str) -> Result<LoopState> {
        self.set_loop_state(name, LoopState::Off)
    }

    /// Schaltet den Delay-Modus global und verteilt ihn an alle Bots
    pub fn set_delay(&mut self, aktiv: bool, sekunden: Option<f64>) -> Result<()> {
        if let Some(s) = sekunden {
            verzoegerung_pruefen(s)?;
            self.konfig.delay_seconds = s;
        }
        self.konfig.delay_enabled = aktiv;
        for bot in self.pool.handles() {
            if aktiv {
                bot.enable_delay(self.konfig.delay_seconds);
            } else {
                bot.disable_delay();
            }
        }
        info!(aktiv, sekunden = self.konfig.delay_seconds, "Delay-Modus umgeschaltet");
        Ok(())
    }

    /// Leitet die Lautstaerke an den Bot der Schleife.
    ///
    /// Gibt false zurueck, wenn der Schleife gerade kein Bot gehoert.
    pub fn set_loop_volume(&mut self, name: &str, volume: f32) -> Result<bool> {
        self.schleife(name)?;
        if !volume.is_finite() {
            return Err(LoopbotError::UngueltigerBefehl(format!(
                "Lautstaerke ungueltig: {volume}"
            )));
        }
        let Some(bot_id) = self.zustand(name).bot else {
            return Ok(false);
        };
        match self.pool.get(&bot_id) {
            Some(bot) => {
                bot.set_volume(volume.clamp(0.0, 1.0));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_input_device(&self, device: u32) {
        for bot in self.pool.handles() {
            bot.set_input(device);
        }
        info!(device, "Eingabegeraet an alle Bots");
    }

    pub fn set_output_device(&self, device: u32) {
        for bot in self.pool.handles() {
            bot.set_output(device);
        }
        info!(device, "Ausgabegeraet an alle Bots");
    }

    /// Uebernimmt die Teilnehmerzahlen eines Bot-Berichts.
    ///
    /// Schleifen, die im Bericht fehlen, zaehlen 0.
    pub fn teilnehmer_uebernehmen(&mut self, zaehlung: &HashMap<String, u32>) {
        for l in self.registry.iter() {
            let n = zaehlung.get(&l.name).copied().unwrap_or(0);
            self.teilnehmer.insert(l.name.clone(), n);
        }
    }

    pub fn state(&self, name: &str) -> Option<LoopState> {
        self.zustaende.get(name).map(|z| z.state)
    }

    pub fn bot_von(&self, name: &str) -> Option<BotId> {
        self.zustaende.get(name).and_then(|z| z.bot.clone())
    }

    pub fn teilnehmer(&self) -> &HashMap<String, u32> {
        &self.teilnehmer
    }

    pub fn delay_enabled(&self) -> bool {
        self.konfig.delay_enabled
    }

    pub fn bot(&self, id: &BotId) -> Option<&C> {
        self.pool.get(id)
    }

    /// Geklonte Handles aller Bots in Roster-Reihenfolge
    pub fn bots(&self) -> Vec<C> {
        self.pool.handles().cloned().collect()
    }

    pub fn pool(&self) -> &BotPool<C> {
        &self.pool
    }

    pub fn registry(&self) -> &LoopRegistry {
        &self.registry
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let loops = self
            .registry
            .iter()
            .map(|l| {
                let z = self.zustand(&l.name);
                SchleifenAnsicht {
                    name: l.name.clone(),
                    can_listen: l.can_listen,
                    can_talk: l.can_talk,
                    state: z.state,
                    bot: z.bot,
                    teilnehmer: self.teilnehmer.get(&l.name).copied().unwrap_or(0),
                }
            })
            .collect();
        ControllerSnapshot {
            loops,
            delay_enabled: self.konfig.delay_enabled,
            delay_seconds: self.konfig.delay_seconds,
            idle_bots: self.pool.idle_anzahl(),
            pool_erschoepft: self.pool_erschoepft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testbot::{Protokoll, TestBot};
    use loopbot_bot::BotCommand;

    fn katalog() -> LoopRegistry {
        LoopRegistry::neu(vec![
            Loop::neu("A", true, true),
            Loop::neu("B", true, true),
            Loop::neu("C", true, false),
            Loop::neu("D", true, true),
            Loop::neu("X", false, false),
        ])
        .unwrap()
    }

    fn aufbau(bots: usize, konfig: ControllerKonfig) -> (AssignmentController<TestBot>, Protokoll) {
        let protokoll = Protokoll::default();
        let handles = (1..=bots)
            .map(|i| TestBot::neu(&format!("BOT{i}"), &protokoll))
            .collect();
        let c = AssignmentController::neu(katalog(), BotPool::neu(handles), konfig);
        (c, protokoll)
    }

    fn mit_delay(sekunden: f64) -> ControllerKonfig {
        ControllerKonfig {
            delay_enabled: true,
            delay_seconds: sekunden,
            veraltete_timer_verwerfen: false,
        }
    }

    fn bot(name: &str) -> Option<BotId> {
        Some(BotId::from(name))
    }

    /// Prueft Exklusivitaet und Bijektion
    fn invarianten(c: &AssignmentController<TestBot>) {
        let snap = c.snapshot();
        let sprecher = snap.loops.iter().filter(|l| l.state == LoopState::Talk).count();
        assert!(sprecher <= 1, "mehrere TALK-Schleifen: {:?}", snap.loops);

        let mut gesehen = std::collections::HashSet::new();
        for l in &snap.loops {
            match (&l.state, &l.bot) {
                (LoopState::Off, None) => {}
                (LoopState::Off, Some(b)) => panic!("OFF-Schleife {} haelt {}", l.name, b),
                (_, None) => panic!("aktive Schleife {} ohne Bot", l.name),
                (_, Some(b)) => {
                    assert!(gesehen.insert(b.clone()), "Bot {} doppelt vergeben", b);
                    assert_eq!(c.pool().zugewiesen(b), Some(l.name.as_str()));
                }
            }
        }
        assert_eq!(c.pool().idle_anzahl(), c.pool().len() - gesehen.len());
    }

    #[tokio::test]
    async fn szenario_zwei_sprecher_wechseln() {
        let (mut c, p) = aufbau(3, ControllerKonfig::default());

        assert_eq!(c.click("A").unwrap(), LoopState::Listen);
        assert_eq!(c.bot_von("A"), bot("BOT1"));
        assert_eq!(p.von("BOT1"), vec!["join", "mute"]);

        assert_eq!(c.click("A").unwrap(), LoopState::Talk);
        assert_eq!(p.von("BOT1"), vec!["join", "mute", "join", "talk"]);

        assert_eq!(c.click("B").unwrap(), LoopState::Listen);
        assert_eq!(c.bot_von("B"), bot("BOT2"));

        p.leeren();
        assert_eq!(c.click("B").unwrap(), LoopState::Talk);
        // A herabgestuft: nur mute, kein leave
        assert_eq!(c.state("A"), Some(LoopState::Listen));
        assert_eq!(c.bot_von("A"), bot("BOT1"));
        assert_eq!(p.von("BOT1"), vec!["mute"]);
        assert_eq!(p.von("BOT2"), vec!["join", "talk"]);
        // Herabstufung vor join/talk des neuen Sprechers
        assert_eq!(p.alle()[0].0, "BOT1");
        invarianten(&c);
    }

    #[tokio::test]
    async fn szenario_nur_hoeren() {
        let (mut c, p) = aufbau(3, ControllerKonfig::default());
        assert_eq!(c.click("C").unwrap(), LoopState::Listen);

        // Klick bleibt auf LISTEN
        p.leeren();
        assert_eq!(c.click("C").unwrap(), LoopState::Listen);
        assert_eq!(p.von("BOT1"), vec!["join", "mute"]);

        // Explizites TALK wird zu OFF
        p.leeren();
        assert_eq!(c.set_loop_state("C", LoopState::Talk).unwrap(), LoopState::Off);
        assert_eq!(c.state("C"), Some(LoopState::Off));
        assert_eq!(c.bot_von("C"), None);
        assert_eq!(p.von("BOT1"), vec!["leave", "mute"]);
        invarianten(&c);
    }

    #[tokio::test]
    async fn off_auf_off_tut_nichts() {
        let (mut c, p) = aufbau(2, ControllerKonfig::default());
        assert_eq!(c.off("A").unwrap(), LoopState::Off);
        assert!(p.ist_leer());
        assert_eq!(c.pool().idle_anzahl(), 2);
        assert_eq!(c.snapshot(), {
            let (c2, _) = aufbau(2, ControllerKonfig::default());
            c2.snapshot()
        });
    }

    #[tokio::test]
    async fn off_gibt_bot_frei() {
        let (mut c, p) = aufbau(2, ControllerKonfig::default());
        c.click("A").unwrap();
        p.leeren();
        c.off("A").unwrap();
        assert_eq!(p.von("BOT1"), vec!["leave", "mute"]);
        assert_eq!(c.pool().zugewiesen(&BotId::from("BOT1")), None);
        assert!(c.pool().zuletzt_benutzt(&BotId::from("BOT1")).is_some());
        invarianten(&c);
    }

    #[tokio::test]
    async fn pool_erschoepft_ist_stilles_noop() {
        let (mut c, p) = aufbau(1, ControllerKonfig::default());
        c.click("A").unwrap();
        p.leeren();

        assert_eq!(c.click("B").unwrap(), LoopState::Off);
        assert_eq!(c.state("B"), Some(LoopState::Off));
        assert!(p.ist_leer());
        assert_eq!(c.snapshot().pool_erschoepft, 1);
        invarianten(&c);
    }

    #[tokio::test(start_paused = true)]
    async fn lru_auswahl() {
        let (mut c, _p) = aufbau(3, ControllerKonfig::default());
        c.click("A").unwrap(); // BOT1
        c.click("B").unwrap(); // BOT2
        c.click("D").unwrap(); // BOT3

        c.off("B").unwrap(); // BOT2 frei bei t1
        tokio::time::advance(Duration::from_secs(1)).await;
        c.off("A").unwrap(); // BOT1 frei bei t2 > t1

        c.click("C").unwrap();
        assert_eq!(c.bot_von("C"), bot("BOT2"));
        invarianten(&c);
    }

    #[tokio::test]
    async fn klick_ohne_hoerrecht_ignoriert() {
        let (mut c, p) = aufbau(2, ControllerKonfig::default());
        assert_eq!(c.click("X").unwrap(), LoopState::Off);
        assert!(p.ist_leer());
    }

    #[tokio::test]
    async fn unbekannte_schleife() {
        let (mut c, _) = aufbau(1, ControllerKonfig::default());
        assert!(matches!(
            c.click("ZZ").unwrap_err(),
            LoopbotError::LoopNichtGefunden(_)
        ));
        assert!(c.set_loop_volume("ZZ", 0.5).is_err());
    }

    #[tokio::test]
    async fn off_erzwingt_off_aus_jedem_zustand() {
        let (mut c, _) = aufbau(2, ControllerKonfig::default());
        c.click("A").unwrap();
        c.click("A").unwrap();
        assert_eq!(c.state("A"), Some(LoopState::Talk));
        assert_eq!(c.off("A").unwrap(), LoopState::Off);
        assert_eq!(c.pool().idle_anzahl(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn talk_mit_delay_kommt_per_timer() {
        let (mut c, p) = aufbau(2, mit_delay(3.0));
        c.click("A").unwrap();
        p.leeren();

        c.click("A").unwrap();
        assert_eq!(p.von("BOT1"), vec!["join"]);

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(p.von("BOT1"), vec!["join"]);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(p.von("BOT1"), vec!["join", "talk"]);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_herabstufung_und_verlassen_verzoegert() {
        let (mut c, p) = aufbau(3, mit_delay(3.0));
        c.set_loop_state("A", LoopState::Talk).unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        p.leeren();

        c.set_loop_state("B", LoopState::Talk).unwrap();
        assert_eq!(p.von("BOT1"), vec!["mute_after_delay"]);
        assert_eq!(c.state("A"), Some(LoopState::Listen));

        p.leeren();
        c.set_loop_state("B", LoopState::Listen).unwrap();
        assert_eq!(p.von("BOT2"), vec!["mute_after_delay"]);

        p.leeren();
        c.set_loop_state("B", LoopState::Talk).unwrap();
        c.off("B").unwrap();
        assert_eq!(p.von("BOT2"), vec!["join", "leave_after_delay"]);
        invarianten(&c);
    }

    #[tokio::test(start_paused = true)]
    async fn veraltetes_talk_feuert_standardmaessig() {
        let (mut c, p) = aufbau(2, mit_delay(1.0));
        c.set_loop_state("A", LoopState::Talk).unwrap();
        c.set_loop_state("A", LoopState::Listen).unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(p.von("BOT1").contains(&"talk"));
    }

    #[tokio::test(start_paused = true)]
    async fn veraltetes_talk_wird_verworfen_wenn_aktiviert() {
        let mut konfig = mit_delay(1.0);
        konfig.veraltete_timer_verwerfen = true;
        let (mut c, p) = aufbau(2, konfig);
        c.set_loop_state("A", LoopState::Talk).unwrap();
        c.set_loop_state("A", LoopState::Listen).unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!p.von("BOT1").contains(&"talk"));

        // Unveraendertes TALK bekommt sein talk weiterhin
        c.set_loop_state("B", LoopState::Talk).unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(p.von("BOT2").contains(&"talk"));
    }

    #[tokio::test]
    async fn delay_umschalten_geht_an_alle_bots() {
        let (mut c, p) = aufbau(3, ControllerKonfig::default());
        c.set_delay(true, Some(2.5)).unwrap();
        assert!(c.delay_enabled());
        for b in ["BOT1", "BOT2", "BOT3"] {
            assert_eq!(p.von(b), vec!["enable_delay"]);
        }
        assert!(p
            .alle()
            .iter()
            .all(|(_, cmd)| *cmd == BotCommand::EnableDelay { seconds: 2.5 }));

        p.leeren();
        c.set_delay(false, None).unwrap();
        assert_eq!(p.von("BOT2"), vec!["disable_delay"]);
        assert_eq!(c.snapshot().delay_seconds, 2.5);

        assert!(c.set_delay(true, Some(f64::NAN)).is_err());
    }

    #[tokio::test]
    async fn lautstaerke_geht_an_zugewiesenen_bot() {
        let (mut c, p) = aufbau(2, ControllerKonfig::default());
        assert!(!c.set_loop_volume("A", 0.5).unwrap());
        c.click("A").unwrap();
        p.leeren();
        assert!(c.set_loop_volume("A", 0.5).unwrap());
        assert_eq!(p.alle(), vec![("BOT1".to_string(), BotCommand::SetVolume { volume: 0.5 })]);
        assert!(c.set_loop_volume("A", f32::NAN).is_err());
    }

    #[tokio::test]
    async fn geraete_an_alle_bots() {
        let (c, p) = aufbau(2, ControllerKonfig::default());
        c.set_input_device(3);
        c.set_output_device(1);
        assert_eq!(p.von("BOT1"), vec!["set_input", "set_output"]);
        assert_eq!(p.von("BOT2"), vec!["set_input", "set_output"]);
    }

    #[tokio::test]
    async fn teilnehmer_fehlende_zaehlen_null() {
        let (mut c, _) = aufbau(1, ControllerKonfig::default());
        let mut z = HashMap::new();
        z.insert("A".to_string(), 4);
        z.insert("Fremd".to_string(), 9);
        c.teilnehmer_uebernehmen(&z);
        assert_eq!(c.teilnehmer().get("A"), Some(&4));
        assert_eq!(c.teilnehmer().get("B"), Some(&0));
        assert!(!c.teilnehmer().contains_key("Fremd"));
    }

    #[tokio::test(start_paused = true)]
    async fn zu_grosse_verzoegerung_abgelehnt() {
        let (mut c, p) = aufbau(2, mit_delay(1.0));
        c.click("A").unwrap();
        c.click("A").unwrap();
        p.leeren();

        for s in [1e20, MAX_VERZOEGERUNG_SEKUNDEN + 1.0, f64::INFINITY] {
            let e = c.set_delay(true, Some(s)).unwrap_err();
            assert!(e.ist_validierung());
        }
        assert!(p.alle().is_empty());
        assert_eq!(c.snapshot().delay_seconds, 1.0);

        // TALK danach laeuft normal durch, Pool und Zustaende bleiben konsistent
        assert_eq!(c.set_loop_state("B", LoopState::Talk).unwrap(), LoopState::Talk);
        invarianten(&c);
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(p.von("BOT2").contains(&"talk"));
        invarianten(&c);
    }

    #[tokio::test(start_paused = true)]
    async fn zu_grosse_verzoegerung_aus_konfig_wird_begrenzt() {
        let (mut c, p) = aufbau(2, mit_delay(1e20));
        assert_eq!(c.set_loop_state("A", LoopState::Talk).unwrap(), LoopState::Talk);
        invarianten(&c);
        assert_eq!(p.von("BOT1"), vec!["join"]);

        tokio::time::sleep(Duration::from_secs_f64(MAX_VERZOEGERUNG_SEKUNDEN + 1.0)).await;
        assert_eq!(p.von("BOT1"), vec!["join", "talk"]);
        invarianten(&c);
    }

    #[tokio::test(start_paused = true)]
    async fn invarianten_ueber_viele_operationen() {
        let (mut c, _) = aufbau(3, mit_delay(0.5));
        let namen = ["A", "B", "C", "D", "X", "ZZ"];
        let mut x: u64 = 0x2545_F491_4F6C_DD1D;
        for _ in 0..2000 {
            // xorshift
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            let name = namen[(x % namen.len() as u64) as usize];
            let _ = match (x >> 8) % 5 {
                0 | 1 => c.click(name),
                2 => c.off(name),
                3 => c.set_loop_state(name, LoopState::Talk),
                _ => c.set_loop_state(name, LoopState::Listen),
            };
            if (x >> 16) % 11 == 0 {
                let _ = c.set_delay((x >> 20) % 2 == 0, None);
            }
            invarianten(&c);
        }
    }
}
