//! Voice-Session – Naht zum Voice-Server
//!
//! Ein Bot spricht nur ueber [`VoiceSession`] mit dem Voice-Server:
//! Kanal wechseln, PCM senden, Teilnehmer zaehlen. Der mitgelieferte
//! [`LocalVoiceServer`] haelt Kanaele und Mitglieder im Prozess und
//! verteilt Audio an alle anderen Mitglieder desselben Kanals.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use dashmap::{DashMap, DashSet};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{BotError, BotResult};

/// Groesse der Empfangs-Queue pro Mitglied (Bloecke)
pub const EMPFANGS_QUEUE_GROESSE: usize = 128;

/// Verbindung eines Bots zum Voice-Server
pub trait VoiceSession: Send + Sync + 'static {
    /// Wechselt in den Kanal (None = Root-Kanal)
    fn join_channel(&self, kanal: Option<&str>) -> BotResult<()>;

    /// Sendet einen PCM-Block in den aktuellen Kanal
    fn send_audio(&self, pcm: &[i16]) -> BotResult<()>;

    /// Teilnehmer pro Kanal
    fn participant_counts(&self) -> HashMap<String, u32>;

    /// Namen aller verbundenen Benutzer
    fn user_names(&self) -> Vec<String>;

    fn is_connected(&self) -> bool;
}

struct Mitglied {
    kanal: Option<String>,
    tx: Sender<Vec<i16>>,
}

struct ServerInner {
    kanaele: DashSet<String>,
    mitglieder: DashMap<String, Mitglied>,
}

/// In-Prozess Voice-Server
///
/// Thread-safe und `Clone`-faehig (innerer Arc).
#[derive(Clone)]
pub struct LocalVoiceServer {
    inner: Arc<ServerInner>,
}

impl LocalVoiceServer {
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(ServerInner {
                kanaele: DashSet::new(),
                mitglieder: DashMap::new(),
            }),
        }
    }

    /// Legt einen Kanal an, damit er auch leer in den Zaehlungen erscheint
    pub fn kanal_anlegen(&self, name: impl Into<String>) {
        self.inner.kanaele.insert(name.into());
    }

    /// Verbindet einen Benutzer. Er startet im Root-Kanal.
    ///
    /// Gibt die Session und die Empfangs-Queue fuer eingehendes Audio zurueck.
    pub fn verbinden(&self, name: &str) -> BotResult<(LocalSession, Receiver<Vec<i16>>)> {
        let (tx, rx) = bounded(EMPFANGS_QUEUE_GROESSE);
        match self.inner.mitglieder.entry(name.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(BotError::Session(format!("Name bereits vergeben: {name}")));
            }
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(Mitglied { kanal: None, tx });
            }
        }
        tracing::info!(benutzer = name, "Benutzer verbunden");
        Ok((
            LocalSession {
                server: self.clone(),
                name: name.to_string(),
            },
            rx,
        ))
    }

    pub fn trennen(&self, name: &str) -> bool {
        let entfernt = self.inner.mitglieder.remove(name).is_some();
        if entfernt {
            tracing::info!(benutzer = name, "Benutzer getrennt");
        }
        entfernt
    }

    /// Verschiebt ein Mitglied. Unbekannte Kanaele werden angelegt.
    pub fn verschieben(&self, name: &str, kanal: Option<&str>) -> BotResult<()> {
        if let Some(k) = kanal {
            self.kanal_anlegen(k);
        }
        let mut mitglied = self
            .inner
            .mitglieder
            .get_mut(name)
            .ok_or_else(|| BotError::Session(format!("nicht verbunden: {name}")))?;
        mitglied.kanal = kanal.map(str::to_string);
        tracing::debug!(benutzer = name, kanal = ?kanal, "Kanal gewechselt");
        Ok(())
    }

    /// Aktueller Kanal eines Mitglieds (None = Root oder nicht verbunden)
    pub fn kanal_von(&self, name: &str) -> Option<String> {
        self.inner
            .mitglieder
            .get(name)
            .and_then(|m| m.kanal.clone())
    }

    /// Leitet einen Block an alle anderen Mitglieder im Kanal des Absenders.
    ///
    /// Volle Queues verwerfen den Block. Gibt die Anzahl der Empfaenger zurueck.
    pub fn audio_verteilen(&self, absender: &str, pcm: &[i16]) -> usize {
        let Some(kanal) = self.kanal_von(absender) else {
            // Root-Kanal ist stumm
            return 0;
        };

        let mut weitergeleitet = 0usize;
        for eintrag in self.inner.mitglieder.iter() {
            if eintrag.key() == absender || eintrag.kanal.as_deref() != Some(kanal.as_str()) {
                continue;
            }
            match eintrag.tx.try_send(pcm.to_vec()) {
                Ok(()) => weitergeleitet += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        empfaenger = %eintrag.key(),
                        kanal = %kanal,
                        "Empfangs-Queue voll – Block verworfen"
                    );
                }
                Err(TrySendError::Disconnected(_)) => {
                    tracing::debug!(empfaenger = %eintrag.key(), "Empfangs-Queue geschlossen");
                }
            }
        }
        weitergeleitet
    }

    /// Teilnehmer pro bekanntem Kanal (leere Kanaele zaehlen 0)
    pub fn teilnehmer_zaehlen(&self) -> HashMap<String, u32> {
        let mut zaehlung: HashMap<String, u32> = self
            .inner
            .kanaele
            .iter()
            .map(|k| (k.key().clone(), 0))
            .collect();
        for m in self.inner.mitglieder.iter() {
            if let Some(k) = &m.kanal {
                *zaehlung.entry(k.clone()).or_insert(0) += 1;
            }
        }
        zaehlung
    }

    pub fn benutzer(&self) -> Vec<String> {
        let mut namen: Vec<String> = self
            .inner
            .mitglieder
            .iter()
            .map(|m| m.key().clone())
            .collect();
        namen.sort();
        namen
    }

    pub fn ist_verbunden(&self, name: &str) -> bool {
        self.inner.mitglieder.contains_key(name)
    }
}

impl Default for LocalVoiceServer {
    fn default() -> Self {
        Self::neu()
    }
}

/// Session eines Benutzers am [`LocalVoiceServer`]. Trennt beim Drop.
pub struct LocalSession {
    server: LocalVoiceServer,
    name: String,
}

impl LocalSession {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl VoiceSession for LocalSession {
    fn join_channel(&self, kanal: Option<&str>) -> BotResult<()> {
        self.server.verschieben(&self.name, kanal)
    }

    fn send_audio(&self, pcm: &[i16]) -> BotResult<()> {
        if !self.server.ist_verbunden(&self.name) {
            return Err(BotError::Session(format!("nicht verbunden: {}", self.name)));
        }
        self.server.audio_verteilen(&self.name, pcm);
        Ok(())
    }

    fn participant_counts(&self) -> HashMap<String, u32> {
        self.server.teilnehmer_zaehlen()
    }

    fn user_names(&self) -> Vec<String> {
        self.server.benutzer()
    }

    fn is_connected(&self) -> bool {
        self.server.ist_verbunden(&self.name)
    }
}

impl Drop for LocalSession {
    fn drop(&mut self) {
        self.server.trennen(&self.name);
    }
}
