use std::io::{ErrorKind, Read, Write};
use crate::chunk::{ChunkReader, ChunkWriter};
use crate::connection::state::SessionState;
use crate::handshake::{client_finish, server_finish, server_response, C0C1, HandshakeEvent, HandshakeState};
use crate::message::{encode_chunk_size, encode_ping, CQue, PingType};
use crate::protocol::{
    ContentType, HeaderSize, RtmpMsg, RtmpPacket, FROM_CLIENT, FROM_SERVER, HANDSHAKE_SIZE,
    SYSTEM_CHANNEL,
};
use crate::{Buffer, Error, Result};

/// Bytes asked for per socket read; partial chunks carry over
const READ_SIZE: usize = 4096;

/// One RTMP conversation over a blocking byte stream.
pub struct RtmpSession<S: Read + Write> {
    stream: S,

    state: SessionState,

    handshake: HandshakeState,

    /// Raw reads not yet split into channels
    incoming: CQue,

    reader: ChunkReader,

    writer: ChunkWriter,

    /// Routing tag written in 12 byte headers
    routing: u32,

    bytes_read: u64,
}

impl<S: Read + Write> RtmpSession<S> {
    pub fn new(stream: S) -> Self {
        RtmpSession {
            stream,
            state: SessionState::default(),
            handshake: HandshakeState::new(),
            incoming: CQue::with_name("incoming"),
            reader: ChunkReader::new(),
            writer: ChunkWriter::new(),
            routing: FROM_CLIENT,
            bytes_read: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn set_state(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            log::warn!("Unexpected session state change {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    pub fn routing(&self) -> u32 {
        self.routing
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    pub fn reader(&self) -> &ChunkReader {
        &self.reader
    }

    pub fn set_in_chunk_size(&mut self, size: usize) {
        self.reader.set_chunk_size(size);
    }

    pub fn set_out_chunk_size(&mut self, size: usize) {
        self.writer.set_chunk_size(size);
    }

    pub fn out_chunk_size(&self) -> usize {
        self.writer.chunk_size(SYSTEM_CHANNEL)
    }

    /// Run the client side of the handshake.
    ///
    /// `payload` is sent right behind C2 in the same write, normally the
    /// already chunked connect message.
    pub fn client_handshake(&mut self, payload: &[u8]) -> Result<()> {
        self.routing = FROM_CLIENT;
        self.state = SessionState::HandshakeSend;

        let c0c1 = C0C1::create_client();
        self.write_raw(&c0c1.encode())
            .map_err(|e| self.handshake_failed(format!("Failed to send C0+C1: {}", e)))?;
        self.handshake.transition(HandshakeEvent::SentC0C1)?;

        self.state = SessionState::HandshakeRecv;
        let mut reply = vec![0u8; 1 + HANDSHAKE_SIZE * 2];
        self.stream
            .read_exact(&mut reply)
            .map_err(|e| self.handshake_failed(format!("Failed to read S0+S1+S2: {}", e)))?;

        let second = client_finish(&reply, payload)?;
        self.write_raw(&second)
            .map_err(|e| self.handshake_failed(format!("Failed to send C2: {}", e)))?;
        self.handshake.transition(HandshakeEvent::ReceivedS0S1S2)?;

        self.state = SessionState::Connect;
        log::debug!("Client handshake complete");
        Ok(())
    }

    /// Run the server side of the handshake. Data that arrived with C2 is
    /// kept for the next `recv_msgs()`.
    pub fn server_handshake(&mut self) -> Result<()> {
        self.routing = FROM_SERVER;
        self.state = SessionState::HandshakeRecv;

        let mut c0c1 = vec![0u8; 1 + HANDSHAKE_SIZE];
        self.stream
            .read_exact(&mut c0c1)
            .map_err(|e| self.handshake_failed(format!("Failed to read C0+C1: {}", e)))?;
        let reply = server_response(&c0c1)?;
        self.write_raw(&reply.encode())
            .map_err(|e| self.handshake_failed(format!("Failed to send S0+S1+S2: {}", e)))?;
        self.handshake.transition(HandshakeEvent::ReceivedC0C1)?;

        self.state = SessionState::HandshakeAck;
        let mut data = Vec::with_capacity(HANDSHAKE_SIZE * 2);
        let mut buf = [0u8; READ_SIZE];
        while data.len() < HANDSHAKE_SIZE {
            let n = self.stream.read(&mut buf)?;
            if n == 0 {
                return Err(self.handshake_failed("Connection closed before C2".to_string()));
            }
            data.extend_from_slice(&buf[..n]);
        }

        let rest = server_finish(&data, &reply)?;
        if !rest.is_empty() {
            log::debug!("{} bytes of data arrived with C2", rest.len());
            self.incoming.push(Buffer::new(rest));
        }
        self.handshake.transition(HandshakeEvent::ReceivedC2)?;

        self.state = SessionState::Connect;
        log::debug!("Server handshake complete");
        Ok(())
    }

    fn handshake_failed(&mut self, msg: String) -> Error {
        let _ = self.handshake.transition(HandshakeEvent::Error);
        self.state = SessionState::Done;
        Error::handshake(msg)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }

    /// Chunk and send one message in a single write
    pub fn send_msg(
        &mut self,
        channel: u8,
        head_size: HeaderSize,
        content_type: ContentType,
        routing: u32,
        payload: &[u8],
    ) -> Result<usize> {
        self.writer
            .write_message(&mut self.stream, channel, head_size, content_type, routing, payload)
    }

    pub fn send_invoke(&mut self, channel: u8, head_size: HeaderSize, msg: &RtmpMsg) -> Result<usize> {
        log::debug!("Sending {} on channel {}", msg.method, channel);
        let body = msg.encode()?;
        self.send_msg(channel, head_size, ContentType::Invoke, self.routing, body.as_slice())
    }

    pub fn send_ping(&mut self, ping_type: PingType, milliseconds: u32) -> Result<usize> {
        let body = encode_ping(ping_type, milliseconds);
        self.send_msg(
            SYSTEM_CHANNEL,
            HeaderSize::Twelve,
            ContentType::User,
            self.routing,
            body.as_slice(),
        )
    }

    /// Tell the peer our new chunk size, then start using it
    pub fn send_chunk_size(&mut self, size: usize) -> Result<usize> {
        let body = encode_chunk_size(size as u32);
        let sent = self.send_msg(
            SYSTEM_CHANNEL,
            HeaderSize::Twelve,
            ContentType::ChunkSize,
            self.routing,
            body.as_slice(),
        )?;
        self.writer.set_chunk_size(size);
        Ok(sent)
    }

    /// Read once from the stream into the incoming queue
    fn read_raw(&mut self) -> Result<usize> {
        let mut buf = vec![0u8; READ_SIZE];
        let n = match self.stream.read(&mut buf) {
            Ok(0) => {
                self.state = SessionState::Done;
                return Err(Error::connection("Connection closed by peer"));
            }
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Err(Error::timeout(format!("Read timed out: {}", e)));
            }
            Err(e) => return Err(e.into()),
        };
        log::trace!("Read {} bytes", n);
        self.bytes_read += n as u64;
        buf.truncate(n);
        self.incoming.push(Buffer::new(buf));
        Ok(n)
    }

    /// Split everything queued so far and collect the finished messages
    fn drain_incoming(&mut self) -> Result<Vec<RtmpPacket>> {
        let mut packets = Vec::new();
        if self.incoming.size() > 1 {
            self.incoming.merge();
        }
        while let Some(raw) = self.incoming.pop() {
            let channels = self.reader.split(raw.as_slice())?;
            for channel in channels {
                while let Some(buf) = self.reader.pop_complete(channel) {
                    let packet = RtmpPacket::from_buffer(&buf)?;
                    if !packet.is_complete() {
                        log::warn!(
                            "Dropping partial {:?} on channel {}",
                            packet.content_type(),
                            channel
                        );
                        continue;
                    }
                    packets.push(packet);
                }
            }
        }
        Ok(packets)
    }

    /// Block until at least one complete message has arrived
    pub fn recv_msgs(&mut self) -> Result<Vec<RtmpPacket>> {
        loop {
            let packets = self.drain_incoming()?;
            if !packets.is_empty() {
                return Ok(packets);
            }
            self.read_raw()?;
        }
    }

    pub fn close(&mut self) {
        self.state = SessionState::Done;
        self.incoming.clear();
        self.reader.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkWriter;
    use crate::handshake::{C2, S0S1S2};
    use crate::protocol::{Status, COMMAND_CHANNEL};
    use std::io::Cursor;

    /// Canned input with captured output
    struct MockStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl MockStream {
        fn new(input: Vec<u8>) -> Self {
            MockStream {
                input: Cursor::new(input),
                output: Vec::new(),
            }
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_server_handshake_then_message() {
        let c0c1 = C0C1::create_client();
        let writer = ChunkWriter::new();
        let body = RtmpMsg::create_stream(2.0).encode().unwrap();

        let mut input = c0c1.encode();
        // echo is not checked against our S1 here, any C2 is accepted
        let c2 = C2::create_from_s1(&S0S1S2::generate(&c0c1));
        input.extend_from_slice(&c2.encode());
        input.extend_from_slice(
            writer
                .merge(COMMAND_CHANNEL, HeaderSize::Eight, ContentType::Invoke, 0, body.as_slice())
                .unwrap()
                .as_slice(),
        );

        let mut session = RtmpSession::new(MockStream::new(input));
        session.server_handshake().unwrap();
        assert_eq!(session.state(), SessionState::Connect);
        assert_eq!(session.routing(), FROM_SERVER);
        assert_eq!(session.get_ref().output.len(), 3073);

        let packets = session.recv_msgs().unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].to_msg().unwrap().method, "createStream");

        let err = session.recv_msgs().unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[test]
    fn test_client_handshake_sends_payload_with_c2() {
        let s0s1s2 = S0S1S2::generate(&C0C1::create_client());
        let mut session = RtmpSession::new(MockStream::new(s0s1s2.encode()));
        session.client_handshake(&[0x03, 0x01]).unwrap();

        let output = &session.get_ref().output;
        assert_eq!(output.len(), 1537 + 1536 + 2);
        // C2 starts with the server uptime
        assert_eq!(&output[1537..1541], &s0s1s2.s1_timestamp.to_be_bytes());
        assert_eq!(&output[1545..1537 + 1536], s0s1s2.s1_random.as_slice());
        assert_eq!(&output[1537 + 1536..], &[0x03, 0x01]);
    }

    #[test]
    fn test_truncated_handshake_is_fatal() {
        let mut session = RtmpSession::new(MockStream::new(vec![3u8; 200]));
        assert!(matches!(session.server_handshake(), Err(Error::Handshake(_))));
        assert_eq!(session.state(), SessionState::Done);
    }

    #[test]
    fn test_send_invoke_and_ping() {
        let mut session = RtmpSession::new(MockStream::new(Vec::new()));
        session.send_ping(PingType::Reset, 0).unwrap();
        let out = session.get_ref().output.clone();
        assert_eq!(&out[..12], &[0x02, 0, 0, 0, 0, 0, 6, 0x04, 0, 0, 0, 0]);

        session.get_mut().output.clear();
        session
            .send_invoke(COMMAND_CHANNEL, HeaderSize::Twelve, &RtmpMsg::result(Status::ConnectSuccess, 1.0))
            .unwrap();
        let out = &session.get_ref().output;
        assert_eq!(out[0], 0x03);
        assert_eq!(out[7], 0x14);
    }

    #[test]
    fn test_send_chunk_size_switches_writer() {
        let mut session = RtmpSession::new(MockStream::new(Vec::new()));
        session.send_chunk_size(4096).unwrap();
        assert_eq!(session.out_chunk_size(), 4096);
        assert_eq!(&session.get_ref().output[12..], &[0, 0, 0x10, 0]);
    }
}
