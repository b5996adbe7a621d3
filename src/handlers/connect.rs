use std::io::{Read, Write};
use crate::amf::Amf0Value;
use crate::connection::SessionState;
use crate::handlers::{CommandHandler, HandlerContext};
use crate::message::PingType;
use crate::protocol::{HeaderSize, RtmpMsg, Status};
use crate::Result;

/// Answers NetConnection.connect
pub struct ConnectHandler;

impl ConnectHandler {
    pub fn new() -> Self {
        ConnectHandler
    }
}

impl Default for ConnectHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Read + Write> CommandHandler<S> for ConnectHandler {
    fn command_name(&self) -> &str {
        "connect"
    }

    fn handle(&mut self, msg: &RtmpMsg, ctx: &mut HandlerContext<'_, S>) -> Result<()> {
        let param = |name: &str| msg.find_property(name).and_then(Amf0Value::as_string).unwrap_or("");
        log::info!(
            "{} connect app: {}, tcUrl: {}, swfUrl: {}",
            ctx.conn_id,
            param("app"),
            param("tcUrl"),
            param("swfUrl")
        );

        ctx.session.send_ping(PingType::Reset, 0)?;
        ctx.session.send_invoke(
            ctx.channel,
            HeaderSize::Twelve,
            &RtmpMsg::result(Status::ConnectSuccess, msg.transaction_id),
        )?;

        let chunk_size = ctx.server.config().chunk_size;
        if chunk_size != ctx.session.out_chunk_size() {
            ctx.session.send_chunk_size(chunk_size)?;
        }

        ctx.session.set_state(SessionState::NetConnect);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::amf::Amf0Value;
    use crate::handlers::tests::run;
    use crate::message::{decode_ping, PingType};
    use crate::protocol::{ContentType, RtmpMsg, Status, COMMAND_CHANNEL, SYSTEM_CHANNEL};
    use std::path::Path;

    #[test]
    fn test_connect_gets_reset_then_success() {
        let connect = RtmpMsg::new("connect", 1.0).with_object(Amf0Value::object([
            ("app", Amf0Value::string("oflaDemo")),
            ("tcUrl", Amf0Value::string("rtmp://localhost/oflaDemo")),
        ]));
        let replies = run(Path::new("."), &[connect]);
        assert_eq!(replies.len(), 2);

        assert_eq!(replies[0].channel(), SYSTEM_CHANNEL);
        assert_eq!(replies[0].content_type(), ContentType::User);
        assert_eq!(decode_ping(&replies[0].payload).unwrap().ping_type, PingType::Reset);

        assert_eq!(replies[1].channel(), COMMAND_CHANNEL);
        let msg = replies[1].to_msg().unwrap();
        assert_eq!(msg.method, "_result");
        assert_eq!(msg.transaction_id, 1.0);
        assert_eq!(msg.status, Some(Status::ConnectSuccess));
    }
}
