use crate::protocol::RtmpHeader;

/// Assembly progress of the message currently arriving on one channel.
#[derive(Debug, Clone, Default)]
pub struct ChunkStreamContext {
    /// Header of the message being assembled, inherited fields filled in
    header: Option<RtmpHeader>,

    /// Body bytes still expected
    remaining: usize,

    /// Fragments received for the current message
    fragments: usize,
}

impl ChunkStreamContext {
    pub fn new() -> Self {
        ChunkStreamContext::default()
    }

    /// Check if a message is partially received
    pub fn is_assembling(&self) -> bool {
        self.remaining > 0
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn header(&self) -> Option<&RtmpHeader> {
        self.header.as_ref()
    }

    pub fn start_message(&mut self, header: RtmpHeader) {
        self.remaining = header.bodysize;
        self.header = Some(header);
        self.fragments = 0;
    }

    /// Account for one fragment carrying `len` body bytes
    pub fn consume(&mut self, len: usize) {
        self.remaining = self.remaining.saturating_sub(len);
        self.fragments += 1;
    }

    pub fn reset(&mut self) {
        *self = ChunkStreamContext::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ContentType, HeaderSize};

    #[test]
    fn test_assembly_progress() {
        let mut ctx = ChunkStreamContext::new();
        assert!(!ctx.is_assembling());

        ctx.start_message(RtmpHeader::new(3, HeaderSize::Twelve, 300, ContentType::Invoke, 0));
        ctx.consume(128);
        assert!(ctx.is_assembling());
        assert_eq!(ctx.remaining(), 172);

        ctx.consume(128);
        ctx.consume(44);
        assert!(!ctx.is_assembling());
        assert_eq!(ctx.fragments(), 3);
    }
}
