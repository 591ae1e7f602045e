//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass loopbot ohne Konfigurationsdatei
//! lauffaehig ist (dann allerdings mit leerem Schleifenkatalog, falls
//! keine `loops_FD.txt` im Arbeitsverzeichnis liegt).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// Vollstaendige Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Voice-Server und Bot-Namen
    pub verbindung: VerbindungEinstellungen,
    pub bots: BotEinstellungen,
    /// Rolle und Katalogverzeichnis
    pub schleifen: SchleifenEinstellungen,
    pub verzoegerung: VerzoegerungEinstellungen,
    /// Statusabfrage der Bots
    pub abfrage: AbfrageEinstellungen,
    pub audio: AudioEinstellungen,
    /// REST-API, /health und /metrics
    pub api: ApiEinstellungen,
    pub logging: LoggingEinstellungen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungEinstellungen {
    pub host: String,
    pub port: u16,
    /// Bots heissen `<bot_name>1..n`
    pub bot_name: String,
}

impl Default for VerbindungEinstellungen {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 64738,
            bot_name: "BOT".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotEinstellungen {
    pub anzahl: usize,
}

impl Default for BotEinstellungen {
    fn default() -> Self {
        Self { anzahl: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchleifenEinstellungen {
    /// Rolle des Bedieners, waehlt `loops_<ROLLE>.txt`
    pub rolle: String,
    pub verzeichnis: PathBuf,
}

impl Default for SchleifenEinstellungen {
    fn default() -> Self {
        Self {
            rolle: "FD".into(),
            verzeichnis: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerzoegerungEinstellungen {
    pub sekunden: f64,
    /// Delay-Modus beim Start
    pub aktiv: bool,
    /// Verzoegerte Befehle verwerfen, wenn die Schleife inzwischen umgeschaltet wurde
    pub veraltete_timer_verwerfen: bool,
}

impl Default for VerzoegerungEinstellungen {
    fn default() -> Self {
        Self {
            sekunden: 3.0,
            aktiv: false,
            veraltete_timer_verwerfen: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AbfrageEinstellungen {
    pub intervall_ms: u64,
    pub timeout_ms: u64,
}

impl Default for AbfrageEinstellungen {
    fn default() -> Self {
        Self {
            intervall_ms: 1000,
            timeout_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioEinstellungen {
    /// Capture und Playback ueber echte Geraete (false = headless)
    pub aktiv: bool,
    pub eingabe_geraet: Option<u32>,
    pub ausgabe_geraet: Option<u32>,
    pub sample_rate: u32,
    pub block_size: usize,
    /// Wartezeit nach einem Geraetefehler
    pub backoff_ms: u64,
}

impl Default for AudioEinstellungen {
    fn default() -> Self {
        Self {
            aktiv: false,
            eingabe_geraet: None,
            ausgabe_geraet: None,
            sample_rate: loopbot_audio::SAMPLE_RATE,
            block_size: loopbot_audio::BLOCK_SIZE,
            backoff_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEinstellungen {
    pub bind_adresse: String,
    pub port: u16,
    /// Leer = alle Origins erlaubt
    pub cors_origins: Vec<String>,
}

impl Default for ApiEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "127.0.0.1".into(),
            port: 9300,
            cors_origins: vec![],
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level oder EnvFilter-Direktive
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str::<Self>(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => bail!("Konfigurationsdatei '{pfad}' nicht lesbar: {e}"),
        };
        config.pruefen()?;
        Ok(config)
    }

    /// Verwirft Werte, mit denen der Start keinen Sinn ergibt
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if self.bots.anzahl == 0 {
            bail!("bots.anzahl muss mindestens 1 sein");
        }
        loopbot_core::verzoegerung_pruefen(self.verzoegerung.sekunden)
            .context("verzoegerung.sekunden")?;
        if self.abfrage.intervall_ms == 0 || self.abfrage.timeout_ms == 0 {
            bail!("abfrage.intervall_ms und abfrage.timeout_ms muessen > 0 sein");
        }
        if !loopbot_observability::logging::log_format_gueltig(&self.logging.format) {
            bail!("logging.format muss 'text' oder 'json' sein");
        }
        Ok(())
    }

    /// Bot-Namen in Roster-Reihenfolge
    pub fn bot_namen(&self) -> Vec<String> {
        (1..=self.bots.anzahl)
            .map(|i| format!("{}{i}", self.verbindung.bot_name))
            .collect()
    }

    pub fn katalog_pfad(&self) -> PathBuf {
        loopbot_controller::LoopRegistry::katalog_pfad(
            &self.schleifen.verzeichnis,
            &self.schleifen.rolle,
        )
    }

    pub fn api_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.api.bind_adresse, self.api.port)
            .parse()
            .with_context(|| format!("ungueltige API-Adresse '{}'", self.api.bind_adresse))
    }

    pub fn abfrage_intervall(&self) -> Duration {
        Duration::from_millis(self.abfrage.intervall_ms)
    }

    pub fn abfrage_timeout(&self) -> Duration {
        Duration::from_millis(self.abfrage.timeout_ms)
    }
}
