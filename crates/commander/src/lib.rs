#![allow(clippy::result_large_err)]
//! loopbot-commander – REST-Schnittstelle fuer loopbot
//!
//! Stellt unter `/v1/...` zwei Flaechen bereit:
//! - **Controller**: Schleifenliste, Klick, OFF, expliziter Zustand,
//!   Lautstaerke, Delay-Modus und Geraetewahl
//! - **Bots**: die einzelnen Steuerbefehle eines Bots plus Status und
//!   Benutzerliste unter `/v1/bots/:id/...`

pub mod error;
pub mod rest;

pub use error::{CommanderError, CommanderResult};
pub use rest::server::{RestServer, RestServerKonfig};
pub use rest::CommanderState;
