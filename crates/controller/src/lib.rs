//! loopbot-controller – Zuweisung von Schleifen auf den Bot-Pool
//!
//! - [`LoopRegistry`]: statischer Schleifenkatalog
//! - [`BotPool`]: feste Bot-Liste, Auswahl des aeltesten freien Bots
//! - [`AssignmentController`]: Zustandsmaschine mit exklusivem TALK
//! - [`StatusPoller`]: periodische Abfrage der Teilnehmerzahlen

pub mod controller;
pub mod poller;
pub mod pool;
pub mod registry;

#[cfg(test)]
mod testbot;

pub use controller::{AssignmentController, ControllerKonfig, ControllerSnapshot, SchleifenAnsicht};
pub use poller::{StatusCache, StatusPoller};
pub use pool::BotPool;
pub use registry::LoopRegistry;
