use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Uninitialized,

    /// Client sent C0+C1, waiting for S0+S1+S2
    SentC0C1,

    /// Server sent S0+S1+S2, waiting for C2
    SentS0S1S2,

    Done,

    Failed,
}

impl HandshakeState {
    pub fn new() -> Self {
        HandshakeState::Uninitialized
    }

    pub fn is_done(&self) -> bool {
        *self == HandshakeState::Done
    }

    pub fn is_failed(&self) -> bool {
        *self == HandshakeState::Failed
    }

    pub fn transition(&mut self, event: HandshakeEvent) -> Result<()> {
        let next = match (*self, event) {
            (HandshakeState::Uninitialized, HandshakeEvent::SentC0C1) => HandshakeState::SentC0C1,
            (HandshakeState::SentC0C1, HandshakeEvent::ReceivedS0S1S2) => HandshakeState::Done,
            (HandshakeState::Uninitialized, HandshakeEvent::ReceivedC0C1) => HandshakeState::SentS0S1S2,
            (HandshakeState::SentS0S1S2, HandshakeEvent::ReceivedC2) => HandshakeState::Done,
            (_, HandshakeEvent::Error) => {
                *self = HandshakeState::Failed;
                return Err(Error::handshake("Handshake failed"));
            }
            _ => {
                return Err(Error::handshake(format!(
                    "Invalid transition from {:?} with event {:?}",
                    self, event
                )));
            }
        };
        *self = next;
        Ok(())
    }
}

impl Default for HandshakeState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum HandshakeEvent {
    SentC0C1,
    ReceivedS0S1S2,
    ReceivedC0C1,
    ReceivedC2,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_and_server_paths() {
        let mut client = HandshakeState::new();
        client.transition(HandshakeEvent::SentC0C1).unwrap();
        client.transition(HandshakeEvent::ReceivedS0S1S2).unwrap();
        assert!(client.is_done());

        let mut server = HandshakeState::new();
        server.transition(HandshakeEvent::ReceivedC0C1).unwrap();
        server.transition(HandshakeEvent::ReceivedC2).unwrap();
        assert!(server.is_done());
    }

    #[test]
    fn test_invalid_transition() {
        let mut state = HandshakeState::new();
        assert!(state.transition(HandshakeEvent::ReceivedC2).is_err());
        assert_eq!(state, HandshakeState::Uninitialized);

        assert!(state.transition(HandshakeEvent::Error).is_err());
        assert!(state.is_failed());
    }
}
