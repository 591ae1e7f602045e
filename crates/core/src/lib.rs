//! loopbot-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen loopbot-Crates gemeinsam genutzt werden: Schleifen, deren
//! Zustaende und Bot-Kennungen.

pub mod error;
pub mod types;
pub mod verzoegerung;

// Re-Exporte fuer bequemen Zugriff
pub use error::{LoopbotError, Result};
pub use types::{BotId, Loop, LoopState};
pub use verzoegerung::{verzoegerung_pruefen, MAX_VERZOEGERUNG_SEKUNDEN};
