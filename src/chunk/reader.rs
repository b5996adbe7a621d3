use crate::chunk::stream::ChunkStreamContext;
use crate::message::{decode_chunk_size, CQue};
use crate::protocol::{
    decode_header, ChannelTable, ContentType, HeaderSize, EMPTY_PACKET, MAX_CHANNELS,
    MAX_HEADER_SIZE,
};
use crate::{Buffer, HeaderError, Result};

/// Demultiplexes raw reads into per-channel message queues.
///
/// Every queued message buffer starts with a full 12 byte header holding
/// the resolved channel, size and type, followed by the body; the buffer
/// cursor is left at the start of the body.
pub struct ChunkReader {
    /// Inherited header fields and chunk sizes of the incoming direction
    channels: ChannelTable,

    contexts: Vec<ChunkStreamContext>,

    queues: Vec<CQue>,

    /// Start of a fragment cut off at the end of the previous read
    leftover: Vec<u8>,
}

impl ChunkReader {
    pub fn new() -> Self {
        ChunkReader {
            channels: ChannelTable::new(),
            contexts: vec![ChunkStreamContext::new(); MAX_CHANNELS],
            queues: (0..MAX_CHANNELS)
                .map(|channel| CQue::with_name(format!("channel {}", channel)))
                .collect(),
            leftover: Vec::new(),
        }
    }

    /// Set incoming chunk size of every channel
    pub fn set_chunk_size(&mut self, size: usize) {
        self.channels.set_all_chunksizes(size);
    }

    pub fn chunk_size(&self, channel: u8) -> usize {
        self.channels.chunksize(channel)
    }

    pub fn channels(&self) -> &ChannelTable {
        &self.channels
    }

    pub fn queue(&self, channel: u8) -> Option<&CQue> {
        self.queues.get(channel as usize)
    }

    pub fn context(&self, channel: u8) -> Option<&ChunkStreamContext> {
        self.contexts.get(channel as usize)
    }

    /// Bytes held back waiting for the rest of a fragment
    pub fn pending(&self) -> usize {
        self.leftover.len()
    }

    /// Split one raw read into the channel queues.
    ///
    /// Returns each channel that received data, once, in discovery order.
    /// A header error aborts the read and is returned.
    pub fn split(&mut self, raw: &[u8]) -> Result<Vec<u8>> {
        if raw == [EMPTY_PACKET] {
            log::debug!("Skipping empty packet");
            return Ok(Vec::new());
        }

        let mut data = std::mem::take(&mut self.leftover);
        data.extend_from_slice(raw);

        let mut active: Vec<u8> = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            let header = match decode_header(&data[pos..], &mut self.channels) {
                Ok(header) => header,
                Err(HeaderError::Truncated { .. }) => {
                    self.leftover = data[pos..].to_vec();
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let channel = header.channel;
            let index = channel as usize;
            let chunksize = self.channels.chunksize(channel);
            let assembling = self.contexts[index].is_assembling();
            // Anything but a 1 byte header starts a new message, and so does
            // a 1 byte header on an idle channel.
            let new_message = header.head_size != HeaderSize::One || !assembling;
            let remaining = if new_message {
                header.bodysize
            } else {
                self.contexts[index].remaining()
            };

            // bodysize is capped by decode_header and chunksize by
            // decode_chunk_size, so a fragment is never more than one chunk
            let payload = remaining.min(chunksize);
            let pktsize = header.len() + payload;
            if data.len() - pos < pktsize {
                self.leftover = data[pos..].to_vec();
                break;
            }

            let body = &data[pos + header.len()..pos + pktsize];
            if new_message {
                if assembling {
                    log::warn!(
                        "Channel {} message dropped with {} bytes missing",
                        channel,
                        self.contexts[index].remaining()
                    );
                }
                let mut full = header;
                full.head_size = HeaderSize::Twelve;
                let mut buf = full.encode()?;
                buf.append(body);
                buf.set_position(MAX_HEADER_SIZE)?;
                self.queues[index].push(buf);
                self.contexts[index].start_message(header);
            } else {
                self.queues[index].with_back(|buf| buf.append(body));
            }
            self.contexts[index].consume(payload);

            if !active.contains(&channel) {
                active.push(channel);
            }
            if !self.contexts[index].is_assembling() {
                self.message_complete(channel);
            }
            pos += pktsize;
        }

        Ok(active)
    }

    /// A chunk size message takes effect for the rest of the current read
    fn message_complete(&mut self, channel: u8) {
        let index = channel as usize;
        let content_type = self.contexts[index].header().map(|h| h.content_type);
        log::debug!("Channel {} message complete ({:?})", channel, content_type);

        if content_type != Some(ContentType::ChunkSize) {
            return;
        }
        let body = self.queues[index].with_back(|buf| buf.remaining_slice().to_vec());
        match body.map(|body| decode_chunk_size(&body)) {
            Some(Ok(size)) => {
                log::debug!("Setting incoming chunk size to {}", size);
                self.channels.set_all_chunksizes(size as usize);
            }
            Some(Err(e)) => log::warn!("Ignoring bad chunk size message: {}", e),
            None => {}
        }
    }

    /// Pop the oldest message of `channel` if it is no longer being filled
    pub fn pop_complete(&self, channel: u8) -> Option<Buffer> {
        let que = self.queues.get(channel as usize)?;
        let assembling = self.contexts[channel as usize].is_assembling();
        match que.size() {
            0 => None,
            1 if assembling => None,
            _ => que.pop(),
        }
    }

    /// Drop all queued data and channel history
    pub fn reset(&mut self) {
        self.channels.reset();
        self.leftover.clear();
        for ctx in &mut self.contexts {
            ctx.reset();
        }
        for que in &self.queues {
            que.clear();
        }
    }
}

impl Default for ChunkReader {
    fn default() -> Self {
        Self::new()
    }
}
