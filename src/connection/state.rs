/// Progress of one RTMP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Sending our first handshake packet
    HandshakeSend,

    /// Waiting for the peer's handshake packet
    HandshakeRecv,

    /// Waiting for the echo that completes the handshake
    HandshakeAck,

    /// Handshake done, no connect yet
    Connect,

    /// NetConnection established
    NetConnect,

    /// A NetStream exists
    NetStream,

    Done,
}

impl SessionState {
    pub fn is_handshaking(&self) -> bool {
        matches!(
            self,
            SessionState::HandshakeSend | SessionState::HandshakeRecv | SessionState::HandshakeAck
        )
    }

    /// Check if the handshake finished and the session is still open
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            SessionState::Connect | SessionState::NetConnect | SessionState::NetStream
        )
    }

    pub fn can_transition_to(&self, next: SessionState) -> bool {
        match (*self, next) {
            (SessionState::HandshakeSend, SessionState::HandshakeRecv) => true,
            (SessionState::HandshakeRecv, SessionState::HandshakeAck) => true,
            (SessionState::HandshakeRecv, SessionState::Connect) => true,
            (SessionState::HandshakeAck, SessionState::Connect) => true,
            (SessionState::Connect, SessionState::NetConnect) => true,
            (SessionState::NetConnect, SessionState::NetStream) => true,
            (SessionState::NetStream, SessionState::NetConnect) => true,
            (_, SessionState::Done) => true,
            _ => false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::HandshakeSend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(SessionState::HandshakeSend.can_transition_to(SessionState::HandshakeRecv));
        assert!(SessionState::Connect.can_transition_to(SessionState::NetConnect));
        assert!(SessionState::NetStream.can_transition_to(SessionState::Done));
        assert!(!SessionState::HandshakeSend.can_transition_to(SessionState::NetStream));
        assert!(!SessionState::Done.can_transition_to(SessionState::Connect));
    }

    #[test]
    fn test_connected_states() {
        assert!(SessionState::HandshakeAck.is_handshaking());
        assert!(!SessionState::HandshakeAck.is_connected());
        assert!(SessionState::NetStream.is_connected());
        assert!(!SessionState::Done.is_connected());
    }
}
