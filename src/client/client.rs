use std::collections::VecDeque;
use std::net::TcpStream;
use crate::amf::Amf0Value;
use crate::chunk::merge;
use crate::client::config::ClientConfig;
use crate::client::state::ClientState;
use crate::client::{connect_to_server, RtmpUrl};
use crate::connection::{RtmpSession, SessionState};
use crate::message::{decode_ping, PingType};
use crate::protocol::{
    ContentType, HeaderSize, RtmpHeader, RtmpMsg, RtmpPacket, Status, StreamOp, COMMAND_CHANNEL,
    DEFAULT_AUDIO_SET, DEFAULT_CHUNK_SIZE, DEFAULT_VIDEO_SET, FROM_CLIENT, VIDEO_FUNCTION_SEEK,
};
use crate::{Buffer, Error, Result};

/// Transaction id of the connect call
const CONNECT_ID: f64 = 1.0;

/// A blocking RTMP client that plays files off a server.
pub struct RtmpClient {
    /// Client configuration
    config: ClientConfig,

    /// Client state
    state: ClientState,

    session: Option<RtmpSession<TcpStream>>,

    /// Server URL
    url: Option<RtmpUrl>,

    /// Stream ID
    stream_id: Option<f64>,

    /// Transaction ID counter
    transaction_id: f64,

    /// Messages received but not yet consumed
    pending: VecDeque<RtmpPacket>,
}

impl RtmpClient {
    /// Create new client
    pub fn new() -> Self {
        RtmpClient::with_config(ClientConfig::default())
    }

    /// Create client with config
    pub fn with_config(config: ClientConfig) -> Self {
        RtmpClient {
            config,
            state: ClientState::Disconnected,
            session: None,
            url: None,
            stream_id: None,
            transaction_id: CONNECT_ID,
            pending: VecDeque::new(),
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn url(&self) -> Option<&RtmpUrl> {
        self.url.as_ref()
    }

    pub fn stream_id(&self) -> Option<f64> {
        self.stream_id
    }

    /// Connect to rtmp://host[:port]/app.
    ///
    /// The connect call travels with the handshake's C2 and this returns
    /// once the server accepted it.
    pub fn connect(&mut self, url: &str) -> Result<()> {
        let url = RtmpUrl::parse(url)?;
        self.state = ClientState::Connecting;

        let result = self.open(&url);
        if result.is_err() {
            self.state = ClientState::Error;
            self.session = None;
        }
        self.url = Some(url);
        result
    }

    fn open(&mut self, url: &RtmpUrl) -> Result<()> {
        let stream = connect_to_server(url, self.config.connect_timeout)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(self.config.read_timeout)?;

        let body = self.encode_connect(&url.app, &url.tc_url())?;
        let header = RtmpHeader::new(
            COMMAND_CHANNEL,
            HeaderSize::Twelve,
            body.len(),
            ContentType::Invoke,
            FROM_CLIENT,
        );
        let connect = merge(&header, body.as_slice(), DEFAULT_CHUNK_SIZE)?;

        let mut session = RtmpSession::new(stream);
        session.client_handshake(connect.as_slice())?;
        self.session = Some(session);
        self.transaction_id = CONNECT_ID;

        let reply = self.wait_for_result(CONNECT_ID)?;
        if reply.status != Some(Status::ConnectSuccess) {
            return Err(Error::connection(format!(
                "connect to {} refused: {:?}",
                url.url, reply.status
            )));
        }
        log::info!("Connected to {}", url.url);

        let chunk_size = self.config.chunk_size;
        let session = self.session_mut()?;
        session.set_state(SessionState::NetConnect);
        if chunk_size != DEFAULT_CHUNK_SIZE {
            session.send_chunk_size(chunk_size)?;
        }
        self.state = ClientState::Connected;
        Ok(())
    }

    /// AMF body of the connect call
    pub fn encode_connect(&self, app: &str, tc_url: &str) -> Result<Buffer> {
        let optional = |value: &Option<String>| match value {
            Some(url) => Amf0Value::string(url.as_str()),
            None => Amf0Value::Null,
        };
        RtmpMsg::new("connect", CONNECT_ID)
            .with_object(Amf0Value::object([
                ("app", Amf0Value::string(app)),
                ("flashVer", Amf0Value::string(self.config.flash_version.as_str())),
                ("swfUrl", optional(&self.config.swf_url)),
                ("tcUrl", Amf0Value::string(tc_url)),
                ("fpad", Amf0Value::Boolean(false)),
                ("audioCodecs", Amf0Value::Number(DEFAULT_AUDIO_SET)),
                ("videoCodecs", Amf0Value::Number(DEFAULT_VIDEO_SET)),
                ("videoFunction", Amf0Value::Number(VIDEO_FUNCTION_SEEK)),
                ("pageUrl", optional(&self.config.page_url)),
            ]))
            .encode()
    }

    /// AMF body of createStream
    pub fn encode_stream(&self, transaction_id: f64) -> Result<Buffer> {
        RtmpMsg::create_stream(transaction_id).encode()
    }

    /// AMF body of play/pause/publish/stop/seek
    pub fn encode_stream_op(
        &self,
        op: StreamOp,
        transaction_id: f64,
        name: Option<&str>,
        position: Option<f64>,
    ) -> Result<Buffer> {
        RtmpMsg::stream_op(op, transaction_id, name, position).encode()
    }

    fn next_transaction_id(&mut self) -> f64 {
        self.transaction_id += 1.0;
        self.transaction_id
    }

    fn session_mut(&mut self) -> Result<&mut RtmpSession<TcpStream>> {
        self.session
            .as_mut()
            .ok_or_else(|| Error::invalid_state("Not connected"))
    }

    fn send_invoke_body(&mut self, body: &Buffer) -> Result<usize> {
        self.session_mut()?.send_msg(
            COMMAND_CHANNEL,
            HeaderSize::Eight,
            ContentType::Invoke,
            FROM_CLIENT,
            body.as_slice(),
        )
    }

    /// Next complete message; pings are answered on the way
    fn next_packet(&mut self) -> Result<RtmpPacket> {
        loop {
            if let Some(packet) = self.pending.pop_front() {
                if packet.content_type() == ContentType::User {
                    self.answer_ping(&packet)?;
                    continue;
                }
                return Ok(packet);
            }
            let packets = self.session_mut()?.recv_msgs()?;
            self.pending.extend(packets);
        }
    }

    fn answer_ping(&mut self, packet: &RtmpPacket) -> Result<()> {
        match decode_ping(&packet.payload) {
            Ok(ping) if ping.ping_type == PingType::Client => {
                let stamp = (u32::from(ping.target) << 16) | u32::from(ping.param1);
                self.session_mut()?.send_ping(PingType::Pong, stamp)?;
            }
            Ok(ping) => log::debug!("Ping {:?} from server", ping.ping_type),
            Err(e) => log::warn!("Bad ping from server: {}", e),
        }
        Ok(())
    }

    /// Wait for the `_result` or `_error` of call `transaction_id`
    fn wait_for_result(&mut self, transaction_id: f64) -> Result<RtmpMsg> {
        loop {
            let packet = self.next_packet()?;
            if !packet.is_invoke() {
                log::debug!("Skipping {:?} while waiting for a result", packet.content_type());
                continue;
            }
            let msg = packet.to_msg()?;
            match msg.method.as_str() {
                "_result" if msg.transaction_id == transaction_id => return Ok(msg),
                "_error" if msg.transaction_id == transaction_id => {
                    return Err(Error::protocol(format!("Call {} failed: {:?}", transaction_id, msg.status)));
                }
                _ => log::debug!("Skipping {} while waiting for a result", msg.method),
            }
        }
    }

    /// Wait for the next onStatus
    fn wait_for_status(&mut self) -> Result<RtmpMsg> {
        loop {
            let packet = self.next_packet()?;
            if !packet.is_invoke() {
                continue;
            }
            let msg = packet.to_msg()?;
            if msg.method == "onStatus" {
                return Ok(msg);
            }
            log::debug!("Skipping {} while waiting for a status", msg.method);
        }
    }

    /// Create a NetStream and return its id
    pub fn create_stream(&mut self) -> Result<f64> {
        if !self.state.is_connected() {
            return Err(Error::invalid_state("Not connected"));
        }
        let transaction_id = self.next_transaction_id();
        let body = self.encode_stream(transaction_id)?;
        self.send_invoke_body(&body)?;

        let reply = self.wait_for_result(transaction_id)?;
        let stream_id = reply
            .first_number()
            .ok_or_else(|| Error::protocol("createStream result without a stream id"))?;
        log::debug!("Created stream {}", stream_id);

        self.session_mut()?.set_state(SessionState::NetStream);
        self.stream_id = Some(stream_id);
        self.state = ClientState::StreamCreated;
        Ok(stream_id)
    }

    /// Play `name` to the end and return the FLV data received.
    ///
    /// A stream is created first if there is none.
    pub fn play(&mut self, name: &str) -> Result<Vec<u8>> {
        if !self.state.can_play() {
            self.create_stream()?;
        }
        let transaction_id = self.next_transaction_id();
        let body = self.encode_stream_op(StreamOp::Play, transaction_id, Some(name), None)?;
        self.send_invoke_body(&body)?;
        self.state = ClientState::Playing;

        let result = self.collect_media(name);
        self.state = ClientState::StreamCreated;
        result
    }

    fn collect_media(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        loop {
            let packet = self.next_packet()?;
            match packet.content_type() {
                ContentType::FlvData | ContentType::AudioData | ContentType::VideoData => {
                    data.extend_from_slice(&packet.payload);
                }
                _ if packet.is_invoke() => {
                    let msg = packet.to_msg()?;
                    match msg.status {
                        Some(Status::PlayStart) => log::debug!("Playing {}", name),
                        Some(Status::PlayStop) => {
                            log::debug!("Finished {}, {} bytes", name, data.len());
                            return Ok(data);
                        }
                        Some(Status::PlayStreamNotFound) => {
                            return Err(Error::not_found(format!("Stream {} not found", name)));
                        }
                        Some(status) if status.is_error() => {
                            return Err(Error::stream(format!("Playing {} failed: {}", name, status.code())));
                        }
                        _ => log::debug!("Skipping {} while playing", msg.method),
                    }
                }
                other => log::debug!("Skipping {:?} while playing", other),
            }
        }
    }

    /// Pause at `position` milliseconds and wait for the server's notify
    pub fn pause(&mut self, position: f64) -> Result<Status> {
        self.stream_op(StreamOp::Pause, position)
    }

    /// Seek to `position` milliseconds and wait for the server's notify
    pub fn seek(&mut self, position: f64) -> Result<Status> {
        self.stream_op(StreamOp::Seek, position)
    }

    fn stream_op(&mut self, op: StreamOp, position: f64) -> Result<Status> {
        if self.stream_id.is_none() {
            return Err(Error::invalid_state(format!("{} without a stream", op.method())));
        }
        let transaction_id = self.next_transaction_id();
        let body = self.encode_stream_op(op, transaction_id, None, Some(position))?;
        self.send_invoke_body(&body)?;

        let reply = self.wait_for_status()?;
        reply
            .status
            .ok_or_else(|| Error::protocol(format!("{} answered without a status", op.method())))
    }

    /// Delete the stream, if any, and drop the connection
    pub fn close(&mut self) {
        if let Some(stream_id) = self.stream_id.take() {
            let body = RtmpMsg::new("deleteStream", 0.0)
                .with_object(Amf0Value::Null)
                .with_object(Amf0Value::Number(stream_id))
                .encode();
            let sent = body.and_then(|body| self.send_invoke_body(&body));
            if let Err(e) = sent {
                log::warn!("Couldn't delete stream {}: {}", stream_id, e);
            }
        }
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        self.pending.clear();
        self.state = ClientState::Disconnected;
    }
}

impl Default for RtmpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode_msg_body;

    #[test]
    fn test_encode_connect() {
        let client = RtmpClient::new();
        let body = client.encode_connect("oflaDemo", "rtmp://localhost:1935/oflaDemo").unwrap();
        let msg = decode_msg_body(body.as_slice()).unwrap();

        assert_eq!(msg.method, "connect");
        assert_eq!(msg.transaction_id, 1.0);
        let string = |name| msg.find_property(name).and_then(Amf0Value::as_string);
        assert_eq!(string("app"), Some("oflaDemo"));
        assert_eq!(string("flashVer"), Some("LNX 9,0,31,0"));
        assert_eq!(string("tcUrl"), Some("rtmp://localhost:1935/oflaDemo"));
        assert_eq!(msg.find_property("fpad").and_then(Amf0Value::as_boolean), Some(false));
        assert_eq!(
            msg.find_property("audioCodecs").and_then(Amf0Value::as_number),
            Some(615.0)
        );
        assert_eq!(
            msg.find_property("videoCodecs").and_then(Amf0Value::as_number),
            Some(124.0)
        );
        assert!(msg.find_property("swfUrl").is_some_and(Amf0Value::is_null));
    }

    #[test]
    fn test_encode_stream_ops() {
        let client = RtmpClient::new();
        let msg = decode_msg_body(client.encode_stream(2.0).unwrap().as_slice()).unwrap();
        assert_eq!(msg.method, "createStream");
        assert_eq!(msg.transaction_id, 2.0);

        let body = client
            .encode_stream_op(StreamOp::Seek, 3.0, None, Some(2500.0))
            .unwrap();
        let msg = decode_msg_body(body.as_slice()).unwrap();
        assert_eq!(msg.method, "seek");
        assert_eq!(msg.first_number(), Some(2500.0));
    }

    #[test]
    fn test_requires_connection() {
        let mut client = RtmpClient::new();
        assert!(matches!(client.create_stream(), Err(Error::InvalidState(_))));
        assert!(matches!(client.pause(0.0), Err(Error::InvalidState(_))));
        assert!(client.state().is_disconnected());
    }

    #[test]
    fn test_connect_refused() {
        // bind then drop to get a port nobody listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut client = RtmpClient::new();
        let err = client.connect(&format!("rtmp://127.0.0.1:{}/app", port));
        assert!(err.is_err());
        assert_eq!(client.state(), ClientState::Error);
    }
}
