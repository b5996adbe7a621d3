use crate::protocol::constants::{DEFAULT_CHUNK_SIZE, MAX_CHANNELS};
use crate::protocol::header::ContentType;
use crate::HeaderError;

/// Per-channel values that small headers inherit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    /// Payload bytes between two headers on this channel
    pub chunksize: usize,

    /// Body size of the last 8 or 12 byte header, 0 when none was seen
    pub last_bodysize: usize,

    /// Type of the last 8 or 12 byte header
    pub last_type: ContentType,
}

impl Default for ChannelState {
    fn default() -> Self {
        ChannelState {
            chunksize: DEFAULT_CHUNK_SIZE,
            last_bodysize: 0,
            last_type: ContentType::None,
        }
    }
}

/// The 64 channel states of one direction of a session.
#[derive(Debug, Clone)]
pub struct ChannelTable {
    channels: Vec<ChannelState>,
}

impl ChannelTable {
    pub fn new() -> Self {
        ChannelTable {
            channels: vec![ChannelState::default(); MAX_CHANNELS],
        }
    }

    pub fn get(&self, channel: u8) -> Result<&ChannelState, HeaderError> {
        self.channels
            .get(channel as usize)
            .ok_or(HeaderError::ChannelOutOfRange(channel))
    }

    pub fn get_mut(&mut self, channel: u8) -> Result<&mut ChannelState, HeaderError> {
        self.channels
            .get_mut(channel as usize)
            .ok_or(HeaderError::ChannelOutOfRange(channel))
    }

    pub fn chunksize(&self, channel: u8) -> usize {
        self.get(channel)
            .map(|state| state.chunksize)
            .unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    pub fn set_chunksize(&mut self, channel: u8, size: usize) -> Result<(), HeaderError> {
        self.get_mut(channel)?.chunksize = size;
        Ok(())
    }

    /// Apply a negotiated chunk size to every channel
    pub fn set_all_chunksizes(&mut self, size: usize) {
        for state in &mut self.channels {
            state.chunksize = size;
        }
    }

    /// Forget inherited sizes and types, chunk sizes are kept
    pub fn reset(&mut self) {
        for state in &mut self.channels {
            state.last_bodysize = 0;
            state.last_type = ContentType::None;
        }
    }
}

impl Default for ChannelTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let table = ChannelTable::new();
        assert_eq!(table.chunksize(0), 128);
        assert_eq!(table.get(63).unwrap().last_bodysize, 0);
        assert_eq!(table.get(64), Err(HeaderError::ChannelOutOfRange(64)));
    }

    #[test]
    fn test_set_all_chunksizes() {
        let mut table = ChannelTable::new();
        table.set_chunksize(3, 256).unwrap();
        assert_eq!(table.chunksize(3), 256);
        assert_eq!(table.chunksize(4), 128);

        table.set_all_chunksizes(4096);
        assert_eq!(table.chunksize(4), 4096);
        assert_eq!(table.chunksize(3), 4096);
    }
}
