//! Verdrahtung zwischen Capture, Delay-Relay und Voice-Session

use loopbot_audio::{AudioError, AudioResult, FrameSink, RelayEingang, RelayFlags};
use std::sync::Arc;

use crate::session::VoiceSession;

/// Gibt Relay-Frames an die Voice-Session weiter
pub struct SessionSink<S: VoiceSession> {
    session: Arc<S>,
}

impl<S: VoiceSession> SessionSink<S> {
    pub fn neu(session: Arc<S>) -> Self {
        Self { session }
    }
}

impl<S: VoiceSession> FrameSink for SessionSink<S> {
    fn play(&mut self, pcm: &[i16]) -> AudioResult<()> {
        self.session
            .send_audio(pcm)
            .map_err(|e| AudioError::Senden(e.to_string()))
    }
}

/// Entscheidet pro Capture-Block: Delay-Relay, direkt senden oder verwerfen.
///
/// Laeuft im Capture-Callback und blockiert nie.
pub struct CaptureRouter<S: VoiceSession> {
    flags: Arc<RelayFlags>,
    relay: RelayEingang,
    session: Arc<S>,
}

impl<S: VoiceSession> Clone for CaptureRouter<S> {
    fn clone(&self) -> Self {
        Self {
            flags: Arc::clone(&self.flags),
            relay: self.relay.clone(),
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: VoiceSession> CaptureRouter<S> {
    pub fn neu(flags: Arc<RelayFlags>, relay: RelayEingang, session: Arc<S>) -> Self {
        Self {
            flags,
            relay,
            session,
        }
    }

    pub fn weiterleiten(&self, pcm: Vec<i16>) {
        if self.flags.delay_enabled() {
            // Auch stumme Bloecke einreihen: Mute wird erst beim Abspielen geprueft
            self.relay.einreihen(pcm);
        } else if self.flags.streaming() {
            if let Err(e) = self.session.send_audio(&pcm) {
                tracing::warn!("Audio nicht gesendet: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LocalVoiceServer;
    use loopbot_audio::DelayRelay;
    use std::time::{Duration, Instant};

    struct Aufbau {
        server: LocalVoiceServer,
        flags: Arc<RelayFlags>,
        relay: DelayRelay,
        router: CaptureRouter<crate::session::LocalSession>,
        hoerer: crossbeam_channel::Receiver<Vec<i16>>,
        _hoerer_session: crate::session::LocalSession,
    }

    fn aufbauen() -> Aufbau {
        let server = LocalVoiceServer::neu();
        let (bot, _) = server.verbinden("BOT1").unwrap();
        let (hoerer_session, hoerer) = server.verbinden("Hoerer").unwrap();
        bot.join_channel(Some("FD")).unwrap();
        hoerer_session.join_channel(Some("FD")).unwrap();

        let session = Arc::new(bot);
        let flags = Arc::new(RelayFlags::new());
        let relay = DelayRelay::starten(
            "BOT1",
            Arc::clone(&flags),
            SessionSink::neu(Arc::clone(&session)),
        )
        .unwrap();
        let router = CaptureRouter::neu(Arc::clone(&flags), relay.eingang(), session);
        Aufbau {
            server,
            flags,
            relay,
            router,
            hoerer,
            _hoerer_session: hoerer_session,
        }
    }

    #[test]
    fn ohne_delay_nur_beim_sprechen_senden() {
        let a = aufbauen();
        a.router.weiterleiten(vec![1]);
        assert!(a.hoerer.try_recv().is_err());

        a.flags.set_streaming(true);
        a.router.weiterleiten(vec![2]);
        assert_eq!(a.hoerer.try_recv().unwrap(), vec![2]);
        assert_eq!(a.server.benutzer().len(), 2);
    }

    #[test]
    fn mit_delay_ueber_relay() {
        let a = aufbauen();
        a.flags.set_streaming(true);
        a.relay.aktivieren(0.1);

        let start = Instant::now();
        a.router.weiterleiten(vec![3, 4]);
        // Nicht sofort beim Hoerer
        assert!(a.hoerer.try_recv().is_err());

        let block = a.hoerer.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(block, vec![3, 4]);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn verzoegertes_audio_nach_mute_verworfen() {
        let a = aufbauen();
        a.flags.set_streaming(true);
        a.relay.aktivieren(0.2);

        a.router.weiterleiten(vec![9]);
        std::thread::sleep(Duration::from_millis(50));
        a.flags.set_streaming(false);

        assert!(a.hoerer.recv_timeout(Duration::from_millis(500)).is_err());
        assert_eq!(a.relay.stats().dropped(), 1);
    }
}
