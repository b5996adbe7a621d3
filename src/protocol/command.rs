use crate::amf::{Amf0Decoder, Amf0Encoder, Amf0Value};
use crate::{Buffer, Error, Result};

/// Status codes carried in the `code` property of `_result`, `_error` and
/// `onStatus` info objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    ConnectSuccess,
    ConnectFailed,
    ConnectRejected,
    ConnectClosed,
    ConnectInvalidApp,
    CallFailed,
    PlayStart,
    PlayStop,
    PlayReset,
    PlayStreamNotFound,
    PlayFailed,
    PauseNotify,
    UnpauseNotify,
    SeekNotify,
    PublishStart,
    StreamFailed,
}

impl Status {
    const ALL: [Status; 16] = [
        Status::ConnectSuccess,
        Status::ConnectFailed,
        Status::ConnectRejected,
        Status::ConnectClosed,
        Status::ConnectInvalidApp,
        Status::CallFailed,
        Status::PlayStart,
        Status::PlayStop,
        Status::PlayReset,
        Status::PlayStreamNotFound,
        Status::PlayFailed,
        Status::PauseNotify,
        Status::UnpauseNotify,
        Status::SeekNotify,
        Status::PublishStart,
        Status::StreamFailed,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Status::ConnectSuccess => "NetConnection.Connect.Success",
            Status::ConnectFailed => "NetConnection.Connect.Failed",
            Status::ConnectRejected => "NetConnection.Connect.Rejected",
            Status::ConnectClosed => "NetConnection.Connect.Closed",
            Status::ConnectInvalidApp => "NetConnection.Connect.InvalidApp",
            Status::CallFailed => "NetConnection.Call.Failed",
            Status::PlayStart => "NetStream.Play.Start",
            Status::PlayStop => "NetStream.Play.Stop",
            Status::PlayReset => "NetStream.Play.Reset",
            Status::PlayStreamNotFound => "NetStream.Play.StreamNotFound",
            Status::PlayFailed => "NetStream.Play.Failed",
            Status::PauseNotify => "NetStream.Pause.Notify",
            Status::UnpauseNotify => "NetStream.Unpause.Notify",
            Status::SeekNotify => "NetStream.Seek.Notify",
            Status::PublishStart => "NetStream.Publish.Start",
            Status::StreamFailed => "NetStream.Failed",
        }
    }

    pub fn from_code(code: &str) -> Option<Status> {
        Status::ALL.iter().copied().find(|status| status.code() == code)
    }

    /// "error" for failures, "status" otherwise
    pub fn level(self) -> &'static str {
        match self {
            Status::ConnectFailed
            | Status::ConnectRejected
            | Status::ConnectInvalidApp
            | Status::CallFailed
            | Status::PlayStreamNotFound
            | Status::PlayFailed
            | Status::StreamFailed => "error",
            _ => "status",
        }
    }

    pub fn is_error(self) -> bool {
        self.level() == "error"
    }

    fn description(self) -> &'static str {
        match self {
            Status::ConnectSuccess => "Connection succeeded.",
            Status::ConnectFailed => "Connection Failed.",
            Status::ConnectRejected => "Connection Rejected.",
            Status::PlayStreamNotFound => "Stream not found.",
            _ => "",
        }
    }

    /// `{ level, code, description }` info object
    pub fn info_object(self, description: Option<&str>) -> Amf0Value {
        Amf0Value::object([
            ("level", Amf0Value::string(self.level())),
            ("code", Amf0Value::string(self.code())),
            ("description", Amf0Value::string(description.unwrap_or(self.description()))),
        ])
    }
}

/// Stream operations a client sends on an existing stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOp {
    Play,
    Pause,
    Publish,
    Stop,
    Seek,
}

impl StreamOp {
    pub fn method(self) -> &'static str {
        match self {
            StreamOp::Play => "play",
            StreamOp::Pause => "pause",
            StreamOp::Publish => "publish",
            StreamOp::Stop => "stop",
            StreamOp::Seek => "seek",
        }
    }
}

/// A decoded invoke body: method name, transaction id and the AMF objects
/// that follow.
#[derive(Debug, Clone, PartialEq)]
pub struct RtmpMsg {
    pub method: String,
    pub transaction_id: f64,
    /// Set for `_result`, `_error` and `onStatus` bodies with a known code
    pub status: Option<Status>,
    pub objects: Vec<Amf0Value>,
}

impl RtmpMsg {
    pub fn new(method: impl Into<String>, transaction_id: f64) -> Self {
        RtmpMsg {
            method: method.into(),
            transaction_id,
            status: None,
            objects: Vec::new(),
        }
    }

    pub fn with_object(mut self, value: Amf0Value) -> Self {
        self.objects.push(value);
        self
    }

    /// `_result`, `_error` and `onStatus` carry a status object
    pub fn is_status_message(&self) -> bool {
        matches!(self.method.as_str(), "_result" | "_error" | "onStatus")
    }

    /// First property called `name` in any object argument
    pub fn find_property(&self, name: &str) -> Option<&Amf0Value> {
        self.objects.iter().find_map(|obj| obj.get_property(name))
    }

    /// First string argument, the stream name of play/publish
    pub fn first_string(&self) -> Option<&str> {
        self.objects.iter().find_map(|obj| obj.as_string())
    }

    /// First number argument after the transaction id
    pub fn first_number(&self) -> Option<f64> {
        self.objects.iter().find_map(|obj| obj.as_number())
    }

    pub fn encode(&self) -> Result<Buffer> {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&Amf0Value::string(self.method.as_str()))?;
        encoder.encode(&Amf0Value::Number(self.transaction_id))?;
        encoder.encode_all(&self.objects)?;
        Ok(encoder.into_buffer())
    }

    pub fn result(status: Status, transaction_id: f64) -> Self {
        let mut msg = RtmpMsg::new("_result", transaction_id)
            .with_object(Amf0Value::Null)
            .with_object(status.info_object(None));
        msg.status = Some(status);
        msg
    }

    /// `_result` answering createStream with the new stream id
    pub fn stream_id(transaction_id: f64, stream_id: f64) -> Self {
        RtmpMsg::new("_result", transaction_id)
            .with_object(Amf0Value::Null)
            .with_object(Amf0Value::Number(stream_id))
    }

    pub fn error(status: Status, transaction_id: f64, description: &str) -> Self {
        let mut msg = RtmpMsg::new("_error", transaction_id)
            .with_object(Amf0Value::Null)
            .with_object(status.info_object(Some(description)));
        msg.status = Some(status);
        msg
    }

    pub fn on_status(status: Status, description: Option<&str>) -> Self {
        let mut msg = RtmpMsg::new("onStatus", 0.0)
            .with_object(Amf0Value::Null)
            .with_object(status.info_object(description));
        msg.status = Some(status);
        msg
    }

    pub fn create_stream(transaction_id: f64) -> Self {
        RtmpMsg::new("createStream", transaction_id).with_object(Amf0Value::Null)
    }

    /// play/pause/publish/stop/seek on an existing stream.
    ///
    /// `name` is the stream name for play and publish; `position` is the
    /// millisecond offset of pause and seek.
    pub fn stream_op(op: StreamOp, transaction_id: f64, name: Option<&str>, position: Option<f64>) -> Self {
        let mut msg = RtmpMsg::new(op.method(), transaction_id).with_object(Amf0Value::Null);
        match op {
            StreamOp::Play | StreamOp::Publish => {
                if let Some(name) = name {
                    msg.objects.push(Amf0Value::string(name));
                }
            }
            StreamOp::Pause => {
                msg.objects.push(Amf0Value::Boolean(true));
                msg.objects.push(Amf0Value::Number(position.unwrap_or(0.0)));
            }
            StreamOp::Seek => msg.objects.push(Amf0Value::Number(position.unwrap_or(0.0))),
            StreamOp::Stop => {}
        }
        msg
    }
}

pub fn encode_result(status: Status, transaction_id: f64) -> Result<Buffer> {
    RtmpMsg::result(status, transaction_id).encode()
}

pub fn encode_stream_id(transaction_id: f64, stream_id: f64) -> Result<Buffer> {
    RtmpMsg::stream_id(transaction_id, stream_id).encode()
}

pub fn encode_on_status(status: Status, description: Option<&str>) -> Result<Buffer> {
    RtmpMsg::on_status(status, description).encode()
}

pub fn encode_error(status: Status, transaction_id: f64, description: &str) -> Result<Buffer> {
    RtmpMsg::error(status, transaction_id, description).encode()
}

/// Decode an AMF0 invoke body.
///
/// The method name and transaction id are required; trailing objects are
/// collected until the body is exhausted or a value fails to decode.
pub fn decode_msg_body(data: &[u8]) -> Result<RtmpMsg> {
    let mut buffer = Buffer::from_slice(data);
    let mut decoder = Amf0Decoder::new(&mut buffer);

    let method = decoder
        .decode()?
        .as_string()
        .ok_or_else(|| Error::amf_decode("Name field of RTMP message corrupted"))?
        .to_string();

    let transaction_id = match decoder.decode()? {
        Amf0Value::Number(n) => n,
        // some onStatus messages carry a marker instead of an id
        Amf0Value::Null | Amf0Value::Undefined => 0.0,
        other => {
            return Err(Error::amf_decode(format!(
                "transaction id of {} is {:?}",
                method, other
            )));
        }
    };

    let mut msg = RtmpMsg::new(method, transaction_id);
    let status_message = msg.is_status_message();
    while decoder.has_remaining() {
        let value = match decoder.decode() {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Stopped decoding {} body: {}", msg.method, e);
                break;
            }
        };
        if status_message && msg.status.is_none() {
            msg.status = value
                .get_property("code")
                .and_then(|code| code.as_string())
                .and_then(Status::from_code);
        }
        msg.objects.push(value);
    }

    Ok(msg)
}
