#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientState {
    /// Not connected
    #[default]
    Disconnected,

    /// Handshake and connect in flight
    Connecting,

    /// NetConnection established
    Connected,

    /// A NetStream was created
    StreamCreated,

    /// Receiving a stream
    Playing,

    /// Connection error
    Error,
}

impl ClientState {
    /// Check if connected
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            ClientState::Connected | ClientState::StreamCreated | ClientState::Playing
        )
    }

    /// Check if can play
    pub fn can_play(&self) -> bool {
        *self == ClientState::StreamCreated
    }

    /// Check if disconnected
    pub fn is_disconnected(&self) -> bool {
        matches!(self, ClientState::Disconnected | ClientState::Error)
    }
}
