use std::io::Write;
use crate::protocol::{ChannelTable, ContentType, HeaderSize, RtmpHeader};
use crate::{Buffer, Result};

/// Build the wire form of one message: `header`, then the body in
/// `chunksize` pieces, each piece after the first led by a 1 byte
/// continuation header for the same channel.
pub fn merge(header: &RtmpHeader, payload: &[u8], chunksize: usize) -> Result<Buffer> {
    let mut header = *header;
    header.bodysize = payload.len();

    let chunksize = chunksize.max(1);
    let continuation = HeaderSize::One.marker() | header.channel;

    let mut out = header.encode()?;
    for (i, piece) in payload.chunks(chunksize).enumerate() {
        if i > 0 {
            out.write_u8(continuation);
        }
        out.append(piece);
    }
    Ok(out)
}

/// Multiplexes outgoing messages using the chunk sizes of the outgoing
/// direction.
pub struct ChunkWriter {
    channels: ChannelTable,
}

impl ChunkWriter {
    pub fn new() -> Self {
        ChunkWriter {
            channels: ChannelTable::new(),
        }
    }

    /// Set outgoing chunk size of every channel
    pub fn set_chunk_size(&mut self, size: usize) {
        self.channels.set_all_chunksizes(size);
    }

    pub fn chunk_size(&self, channel: u8) -> usize {
        self.channels.chunksize(channel)
    }

    pub fn merge(
        &self,
        channel: u8,
        head_size: HeaderSize,
        content_type: ContentType,
        routing: u32,
        payload: &[u8],
    ) -> Result<Buffer> {
        let header = RtmpHeader::new(channel, head_size, payload.len(), content_type, routing);
        merge(&header, payload, self.chunk_size(channel))
    }

    /// Merge a message and send it in one write
    pub fn write_message<W: Write>(
        &self,
        writer: &mut W,
        channel: u8,
        head_size: HeaderSize,
        content_type: ContentType,
        routing: u32,
        payload: &[u8],
    ) -> Result<usize> {
        let buf = self.merge(channel, head_size, content_type, routing, payload)?;
        writer.write_all(buf.as_slice())?;
        writer.flush()?;
        log::trace!(
            "Sent {:?} on channel {}, {} bytes",
            content_type,
            channel,
            buf.len()
        );
        Ok(buf.len())
    }
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FROM_CLIENT, FROM_SERVER};

    #[test]
    fn test_continuation_bytes() {
        let body = vec![0x55u8; 300];
        let header = RtmpHeader::new(3, HeaderSize::Twelve, 0, ContentType::Invoke, FROM_CLIENT);
        let buf = merge(&header, &body, 128).unwrap();
        let bytes = buf.as_slice();

        assert_eq!(&bytes[..12], &[0x03, 0, 0, 0, 0x00, 0x01, 0x2c, 0x14, 0, 0, 0, 0]);
        assert_eq!(bytes[12 + 128], 0xc3);
        assert_eq!(bytes[12 + 128 + 1 + 128], 0xc3);
        assert_eq!(bytes.len(), 12 + 300 + 2);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_header() {
        let writer = ChunkWriter::new();
        let buf = writer
            .merge(4, HeaderSize::Eight, ContentType::AudioData, 0, &[1u8; 256])
            .unwrap();
        assert_eq!(buf.len(), 8 + 256 + 1);
        assert_eq!(buf.as_slice()[8 + 128], 0xc4);
    }

    #[test]
    fn test_empty_body_is_header_only() {
        let writer = ChunkWriter::new();
        let buf = writer
            .merge(2, HeaderSize::Twelve, ContentType::User, FROM_SERVER, &[])
            .unwrap();
        assert_eq!(buf.len(), 12);
    }

    #[test]
    fn test_oversized_body_rejected() {
        let writer = ChunkWriter::new();
        assert!(writer
            .merge(3, HeaderSize::Twelve, ContentType::Invoke, 0, &vec![0u8; 65536])
            .is_err());
    }

    #[test]
    fn test_write_message() {
        let mut writer = ChunkWriter::new();
        writer.set_chunk_size(4096);
        let mut out = Vec::new();
        let sent = writer
            .write_message(&mut out, 8, HeaderSize::Twelve, ContentType::VideoData, 1, &[9u8; 1000])
            .unwrap();
        assert_eq!(sent, 1012);
        assert_eq!(out.len(), 1012);
    }
}
