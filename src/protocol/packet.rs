use crate::protocol::channel::ChannelTable;
use crate::protocol::command::{decode_msg_body, RtmpMsg};
use crate::protocol::header::{decode_header, ContentType, RtmpHeader};
use crate::{Buffer, Result};

/// A complete message taken off a channel queue.
#[derive(Debug, Clone, PartialEq)]
pub struct RtmpPacket {
    pub header: RtmpHeader,
    pub payload: Vec<u8>,
}

impl RtmpPacket {
    pub fn new(header: RtmpHeader, payload: Vec<u8>) -> Self {
        RtmpPacket { header, payload }
    }

    /// Split a queued message buffer into its header and body.
    ///
    /// Queued buffers start with a full 12 byte header, so no channel
    /// history is needed to decode them.
    pub fn from_buffer(buf: &Buffer) -> Result<Self> {
        let bytes = buf.as_slice();
        let header = decode_header(bytes, &mut ChannelTable::new())?;
        let payload = bytes[header.len()..].to_vec();
        Ok(RtmpPacket { header, payload })
    }

    pub fn channel(&self) -> u8 {
        self.header.channel
    }

    pub fn content_type(&self) -> ContentType {
        self.header.content_type
    }

    /// True once the whole advertised body has arrived
    pub fn is_complete(&self) -> bool {
        self.payload.len() >= self.header.bodysize
    }

    pub fn is_invoke(&self) -> bool {
        self.header.content_type.is_invoke()
    }

    /// Decode the body as an AMF0 invoke. AMF3 invokes carry one leading
    /// format byte before the AMF0 data.
    pub fn to_msg(&self) -> Result<RtmpMsg> {
        match self.header.content_type {
            ContentType::Amf3Invoke if !self.payload.is_empty() => decode_msg_body(&self.payload[1..]),
            _ => decode_msg_body(&self.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::header::HeaderSize;

    #[test]
    fn test_from_buffer() {
        let mut buf = RtmpHeader::new(3, HeaderSize::Twelve, 3, ContentType::Invoke, 0)
            .encode()
            .unwrap();
        buf.append(&[1, 2, 3]);

        let packet = RtmpPacket::from_buffer(&buf).unwrap();
        assert_eq!(packet.channel(), 3);
        assert_eq!(packet.payload, vec![1, 2, 3]);
        assert!(packet.is_complete());
        assert!(packet.is_invoke());
    }
}
