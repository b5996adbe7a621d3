use crate::protocol::{MAX_BODY_SIZE, MAX_HEADER_SIZE, PING_MSG_SIZE};
use crate::{Buffer, Error, Result};

/// Ping message kinds (system channel, `User` content type).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingType {
    /// Clear the stream
    Clear,
    /// Clear the playing buffer
    Play,
    /// Buffer time in milliseconds
    Time,
    /// Reset the stream
    Reset,
    /// Server pings the client
    Client,
    /// Client answers a ping
    Pong,
}

impl PingType {
    pub fn as_u16(self) -> u16 {
        match self {
            PingType::Clear => 0,
            PingType::Play => 1,
            PingType::Time => 3,
            PingType::Reset => 4,
            PingType::Client => 6,
            PingType::Pong => 7,
        }
    }

    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(PingType::Clear),
            1 => Some(PingType::Play),
            3 => Some(PingType::Time),
            4 => Some(PingType::Reset),
            6 => Some(PingType::Client),
            7 => Some(PingType::Pong),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    pub ping_type: PingType,
    pub target: u16,
    pub param1: u16,
}

/// Encode a ping body, always `PING_MSG_SIZE` bytes.
pub fn encode_ping(ping_type: PingType, milliseconds: u32) -> Buffer {
    let mut buf = Buffer::with_size(PING_MSG_SIZE);
    buf.write_u16_be(ping_type.as_u16());
    match ping_type {
        PingType::Time | PingType::Client | PingType::Pong => buf.write_u32_be(milliseconds),
        PingType::Clear | PingType::Play | PingType::Reset => buf.write_u32_be(0),
    }
    buf
}

pub fn decode_ping(data: &[u8]) -> Result<Ping> {
    let mut buf = Buffer::from_slice(data);
    let kind = buf.read_u16_be()?;
    let ping_type = PingType::from_u16(kind)
        .ok_or_else(|| Error::protocol(format!("Unknown ping type {}", kind)))?;
    let target = buf.read_u16_be()?;
    let param1 = buf.read_u16_be()?;
    Ok(Ping {
        ping_type,
        target,
        param1,
    })
}

/// User control events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserControl {
    StreamStart,
    StreamEof,
    StreamNoData,
    StreamBuffer,
    StreamLive,
    StreamPing,
    StreamPong,
}

impl UserControl {
    pub fn as_u16(self) -> u16 {
        match self {
            UserControl::StreamStart => 0,
            UserControl::StreamEof => 1,
            UserControl::StreamNoData => 2,
            UserControl::StreamBuffer => 3,
            UserControl::StreamLive => 4,
            UserControl::StreamPing => 6,
            UserControl::StreamPong => 7,
        }
    }

    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(UserControl::StreamStart),
            1 => Some(UserControl::StreamEof),
            2 => Some(UserControl::StreamNoData),
            3 => Some(UserControl::StreamBuffer),
            4 => Some(UserControl::StreamLive),
            6 => Some(UserControl::StreamPing),
            7 => Some(UserControl::StreamPong),
            _ => None,
        }
    }

    /// Events carrying a second 32 bit parameter
    fn has_param2(self) -> bool {
        matches!(
            self,
            UserControl::StreamStart
                | UserControl::StreamEof
                | UserControl::StreamNoData
                | UserControl::StreamBuffer
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserEvent {
    pub event: UserControl,
    pub param1: u32,
    pub param2: u32,
}

/// u16 event followed by a u32, usually the stream id. Set Buffer appends
/// the buffer length, sent as zero.
pub fn encode_user_control(event: UserControl, data: u32) -> Buffer {
    let size = if event == UserControl::StreamBuffer { 10 } else { 6 };
    let mut buf = Buffer::with_size(size);
    buf.write_u16_be(event.as_u16());
    buf.write_u32_be(data);
    if event == UserControl::StreamBuffer {
        buf.write_u32_be(0);
    }
    buf
}

pub fn decode_user_control(data: &[u8]) -> Result<UserEvent> {
    let mut buf = Buffer::from_slice(data);
    let kind = buf.read_u16_be()?;
    let event = UserControl::from_u16(kind)
        .ok_or_else(|| Error::protocol(format!("Unknown user control event {}", kind)))?;
    let param1 = buf.read_u32_be()?;
    // senders are inconsistent about the second word, only take it if present
    let param2 = if event.has_param2() && buf.has_remaining(4) {
        buf.read_u32_be()?
    } else {
        0
    };
    Ok(UserEvent {
        event,
        param1,
        param2,
    })
}

fn encode_u32(value: u32) -> Buffer {
    let mut buf = Buffer::with_size(4);
    buf.write_u32_be(value);
    buf
}

pub fn encode_chunk_size(size: u32) -> Buffer {
    encode_u32(size)
}

pub fn decode_chunk_size(data: &[u8]) -> Result<u32> {
    let size = Buffer::from_slice(data).read_u32_be()?;
    if size == 0 {
        return Err(Error::protocol("chunk size of zero"));
    }
    // no chunk carries more than the largest body
    if size as usize > MAX_BODY_SIZE + MAX_HEADER_SIZE {
        return Err(Error::protocol(format!("chunk size {} is out of range", size)));
    }
    Ok(size)
}

/// Acknowledgement of the number of bytes read so far
pub fn encode_bytes_read(bytes: u32) -> Buffer {
    encode_u32(bytes)
}

pub fn encode_window_size(size: u32) -> Buffer {
    encode_u32(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_reset_is_zero_padded() {
        let buf = encode_ping(PingType::Reset, 1234);
        assert_eq!(buf.as_slice(), &[0, 4, 0, 0, 0, 0]);
    }

    #[test]
    fn test_ping_time_carries_milliseconds() {
        let buf = encode_ping(PingType::Client, 0x0102_0304);
        assert_eq!(buf.as_slice(), &[0, 6, 1, 2, 3, 4]);

        let ping = decode_ping(buf.as_slice()).unwrap();
        assert_eq!(ping.ping_type, PingType::Client);
        assert_eq!(ping.target, 0x0102);
        assert_eq!(ping.param1, 0x0304);
    }

    #[test]
    fn test_decode_short_ping_fails() {
        assert!(decode_ping(&[0, 0, 0]).is_err());
        assert!(decode_ping(&[0, 2, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_user_control_live() {
        // Stream Live body from a captured session
        let event = decode_user_control(&[0x00, 0x04, 0x00, 0x00, 0x00, 0x01]).unwrap();
        assert_eq!(event.event, UserControl::StreamLive);
        assert_eq!(event.param1, 1);
        assert_eq!(event.param2, 0);

        assert_eq!(
            encode_user_control(UserControl::StreamLive, 1).as_slice(),
            &[0x00, 0x04, 0x00, 0x00, 0x00, 0x01]
        );
    }

    #[test]
    fn test_user_control_buffer_has_two_params() {
        let buf = encode_user_control(UserControl::StreamBuffer, 1);
        assert_eq!(buf.len(), 10);

        let event = decode_user_control(&[0, 3, 0, 0, 0, 1, 0, 0, 0x0b, 0xb8]).unwrap();
        assert_eq!(event.event, UserControl::StreamBuffer);
        assert_eq!(event.param2, 3000);
    }

    #[test]
    fn test_chunk_size() {
        let buf = encode_chunk_size(4096);
        assert_eq!(buf.as_slice(), &[0x00, 0x00, 0x10, 0x00]);
        assert_eq!(decode_chunk_size(buf.as_slice()).unwrap(), 4096);
        assert!(decode_chunk_size(&[0, 0, 0, 0]).is_err());
        assert!(decode_chunk_size(&[0, 0]).is_err());
        assert_eq!(decode_chunk_size(&[0, 1, 0, 0xb]).unwrap(), 65547);
        assert!(decode_chunk_size(&[0, 1, 0, 0xc]).is_err());
        assert!(decode_chunk_size(&[0x40, 0, 0, 0]).is_err());
    }
}
