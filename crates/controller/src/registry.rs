//! Statischer Schleifenkatalog
//!
//! Pro Rolle liegt eine Datei `loops_<ROLLE>.txt` mit einer JSON-Liste
//! `[{"name": .., "can_listen": .., "can_talk": ..}, ..]`. Der Katalog ist
//! nach dem Laden unveraenderlich; die Reihenfolge der Datei bleibt erhalten.

use loopbot_core::{Loop, LoopbotError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct LoopRegistry {
    loops: Vec<Loop>,
    index: HashMap<String, usize>,
}

impl LoopRegistry {
    /// Baut den Katalog. Leere oder doppelte Namen werden abgelehnt.
    pub fn neu(loops: Vec<Loop>) -> Result<Self> {
        let mut index = HashMap::with_capacity(loops.len());
        for (i, l) in loops.iter().enumerate() {
            if l.name.trim().is_empty() {
                return Err(LoopbotError::Katalog(format!("Eintrag {i} ohne Namen")));
            }
            if index.insert(l.name.clone(), i).is_some() {
                return Err(LoopbotError::Katalog(format!("Doppelte Schleife: {}", l.name)));
            }
        }
        Ok(Self { loops, index })
    }

    pub fn aus_json(json: &str) -> Result<Self> {
        let loops: Vec<Loop> = serde_json::from_str(json)?;
        Self::neu(loops)
    }

    pub fn laden(pfad: &Path) -> Result<Self> {
        let inhalt = std::fs::read_to_string(pfad)?;
        let registry = Self::aus_json(&inhalt)?;
        tracing::info!(
            pfad = %pfad.display(),
            schleifen = registry.len(),
            "Schleifenkatalog geladen"
        );
        Ok(registry)
    }

    /// Pfad der Katalogdatei fuer eine Rolle (Rolle wird grossgeschrieben)
    pub fn katalog_pfad(verzeichnis: &Path, rolle: &str) -> PathBuf {
        verzeichnis.join(format!("loops_{}.txt", rolle.to_uppercase()))
    }

    pub fn get(&self, name: &str) -> Option<&Loop> {
        self.index.get(name).map(|&i| &self.loops[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Loop> {
        self.loops.iter()
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}
