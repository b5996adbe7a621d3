use byteorder::{BigEndian, ByteOrder};
use crate::protocol::channel::ChannelTable;
use crate::protocol::constants::*;
use crate::{Buffer, HeaderError};

/// The four legal chunk header sizes, selected by bits 7-6 of the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderSize {
    /// `0x00`: full header with routing
    Twelve,
    /// `0x40`: no routing
    Eight,
    /// `0x80`: only the opaque 3 byte field
    Four,
    /// `0xc0`: continuation, everything is inherited
    One,
}

impl HeaderSize {
    pub fn from_byte(byte: u8) -> Self {
        match byte & HEADSIZE_MASK {
            0x00 => HeaderSize::Twelve,
            0x40 => HeaderSize::Eight,
            0x80 => HeaderSize::Four,
            _ => HeaderSize::One,
        }
    }

    /// Bits 7-6 of the first header byte
    pub fn marker(self) -> u8 {
        match self {
            HeaderSize::Twelve => 0x00,
            HeaderSize::Eight => 0x40,
            HeaderSize::Four => 0x80,
            HeaderSize::One => 0xc0,
        }
    }

    pub fn len(self) -> usize {
        match self {
            HeaderSize::Twelve => 12,
            HeaderSize::Eight => 8,
            HeaderSize::Four => 4,
            HeaderSize::One => 1,
        }
    }
}

impl TryFrom<usize> for HeaderSize {
    type Error = HeaderError;

    fn try_from(len: usize) -> Result<Self, HeaderError> {
        match len {
            12 => Ok(HeaderSize::Twelve),
            8 => Ok(HeaderSize::Eight),
            4 => Ok(HeaderSize::Four),
            1 => Ok(HeaderSize::One),
            other => Err(HeaderError::SizeOutOfRange(other)),
        }
    }
}

/// Message type byte of 8 and 12 byte headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    None,
    ChunkSize,
    Abort,
    BytesRead,
    /// Ping and user control events
    User,
    WindowSize,
    SetBandwidth,
    Route,
    AudioData,
    VideoData,
    SharedObj,
    Amf3Notify,
    Amf3SharedObj,
    Amf3Invoke,
    Notify,
    Invoke,
    FlvData,
    Unknown(u8),
}

impl ContentType {
    pub fn as_u8(self) -> u8 {
        match self {
            ContentType::None => 0x00,
            ContentType::ChunkSize => 0x01,
            ContentType::Abort => 0x02,
            ContentType::BytesRead => 0x03,
            ContentType::User => 0x04,
            ContentType::WindowSize => 0x05,
            ContentType::SetBandwidth => 0x06,
            ContentType::Route => 0x07,
            ContentType::AudioData => 0x08,
            ContentType::VideoData => 0x09,
            ContentType::SharedObj => 0x0a,
            ContentType::Amf3Notify => 0x0f,
            ContentType::Amf3SharedObj => 0x10,
            ContentType::Amf3Invoke => 0x11,
            ContentType::Notify => 0x12,
            ContentType::Invoke => 0x14,
            ContentType::FlvData => 0x16,
            ContentType::Unknown(byte) => byte,
        }
    }

    pub fn is_invoke(self) -> bool {
        matches!(self, ContentType::Invoke | ContentType::Amf3Invoke)
    }
}

impl From<u8> for ContentType {
    fn from(byte: u8) -> Self {
        match byte {
            0x00 => ContentType::None,
            0x01 => ContentType::ChunkSize,
            0x02 => ContentType::Abort,
            0x03 => ContentType::BytesRead,
            0x04 => ContentType::User,
            0x05 => ContentType::WindowSize,
            0x06 => ContentType::SetBandwidth,
            0x07 => ContentType::Route,
            0x08 => ContentType::AudioData,
            0x09 => ContentType::VideoData,
            0x0a => ContentType::SharedObj,
            0x0f => ContentType::Amf3Notify,
            0x10 => ContentType::Amf3SharedObj,
            0x11 => ContentType::Amf3Invoke,
            0x12 => ContentType::Notify,
            0x14 => ContentType::Invoke,
            0x16 => ContentType::FlvData,
            other => ContentType::Unknown(other),
        }
    }
}

/// A decoded chunk header with inherited fields filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtmpHeader {
    pub channel: u8,
    pub head_size: HeaderSize,
    /// Opaque 24 bit field after the first byte, zero when absent
    pub mystery_word: u32,
    pub bodysize: usize,
    pub content_type: ContentType,
    /// Source/destination tag of 12 byte headers
    pub routing: u32,
}

impl RtmpHeader {
    pub fn new(
        channel: u8,
        head_size: HeaderSize,
        bodysize: usize,
        content_type: ContentType,
        routing: u32,
    ) -> Self {
        RtmpHeader {
            channel,
            head_size,
            mystery_word: 0,
            bodysize,
            content_type,
            routing,
        }
    }

    /// Bytes the header occupies on the wire
    pub fn len(&self) -> usize {
        self.head_size.len()
    }

    /// Write every field the header size carries, including the opaque word
    pub fn encode(&self) -> Result<Buffer, HeaderError> {
        if self.channel as usize >= MAX_CHANNELS {
            return Err(HeaderError::ChannelOutOfRange(self.channel));
        }
        if self.bodysize > MAX_BODY_SIZE {
            return Err(HeaderError::BodySizeTooLarge(self.bodysize));
        }

        let len = self.len();
        let mut buf = Buffer::with_size(len);
        buf.write_u8(self.head_size.marker() | (self.channel & INDEX_MASK));
        if len >= 4 {
            buf.write_u24_be(self.mystery_word);
        }
        if len >= 8 {
            buf.write_u24_be(self.bodysize as u32);
            buf.write_u8(self.content_type.as_u8());
        }
        if len == 12 {
            buf.write_u32_be(self.routing);
        }
        Ok(buf)
    }
}

/// Encode a header of exactly `head_size` bytes, no field is ever omitted
/// on the basis of channel history.
pub fn encode_header(
    channel: u8,
    head_size: HeaderSize,
    bodysize: usize,
    content_type: ContentType,
    routing: u32,
) -> Result<Buffer, HeaderError> {
    RtmpHeader::new(channel, head_size, bodysize, content_type, routing).encode()
}

/// Decode the header at the start of `bytes`.
///
/// 8 and 12 byte headers record their body size and type in `channels`;
/// 1 and 4 byte headers take them from there. Nothing past the header is read.
pub fn decode_header(bytes: &[u8], channels: &mut ChannelTable) -> Result<RtmpHeader, HeaderError> {
    let first = *bytes.first().ok_or(HeaderError::Truncated {
        needed: 1,
        available: 0,
    })?;
    let head_size = HeaderSize::try_from(HeaderSize::from_byte(first).len())?;
    let channel = first & INDEX_MASK;
    let len = head_size.len();
    if bytes.len() < len {
        return Err(HeaderError::Truncated {
            needed: len,
            available: bytes.len(),
        });
    }

    let state = channels.get_mut(channel)?;

    let mystery_word = if len >= 4 {
        BigEndian::read_u24(&bytes[1..4])
    } else {
        0
    };

    let bodysize = if len >= 8 {
        let size = BigEndian::read_u24(&bytes[4..7]) as usize;
        if size > MAX_BODY_SIZE {
            log::error!("Suspicious RTMP body size {} on channel {}", size, channel);
            return Err(HeaderError::BodySizeTooLarge(size));
        }
        state.last_bodysize = size;
        size
    } else {
        if state.last_bodysize == 0 {
            return Err(HeaderError::NoPriorBodySize(channel));
        }
        state.last_bodysize
    };

    let content_type = if len >= 8 {
        let content_type = ContentType::from(bytes[7]);
        state.last_type = content_type;
        content_type
    } else {
        state.last_type
    };

    let routing = if len == 12 {
        BigEndian::read_u32(&bytes[8..12])
    } else {
        0
    };

    log::trace!(
        "RTMP header: channel {}, head size {}, body size {}, type {:?}",
        channel, len, bodysize, content_type
    );

    Ok(RtmpHeader {
        channel,
        head_size,
        mystery_word,
        bodysize,
        content_type,
        routing,
    })
}
