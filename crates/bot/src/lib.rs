//! loopbot-bot – Relay-Worker
//!
//! Ein Bot vertritt einen Bediener auf dem Voice-Server und ist zu jedem
//! Zeitpunkt an hoechstens eine Schleife gebunden. Gesteuert wird er nur
//! ueber [`BotControl`]; was er tut, sieht man in [`BotStatus`].

pub mod bot;
pub mod command;
pub mod control;
pub mod error;
pub mod router;
pub mod session;
pub mod status;

pub use bot::{Bot, BotKonfig, BEFEHLS_QUEUE_GROESSE};
pub use command::BotCommand;
pub use control::{BotControl, BotHandle};
pub use error::{BotError, BotResult};
pub use router::{CaptureRouter, SessionSink};
pub use session::{LocalSession, LocalVoiceServer, VoiceSession};
pub use status::{BotStatus, ROOT_KANAL};
