use std::io::{Read, Write};
use crate::connection::SessionState;
use crate::handlers::{CommandHandler, HandlerContext};
use crate::protocol::RtmpMsg;
use crate::Result;

/// deleteStream and closeStream need no reply
pub struct DeleteStreamHandler {
    method: &'static str,
}

impl DeleteStreamHandler {
    pub fn new(method: &'static str) -> Self {
        DeleteStreamHandler { method }
    }
}

impl<S: Read + Write> CommandHandler<S> for DeleteStreamHandler {
    fn command_name(&self) -> &str {
        self.method
    }

    fn handle(&mut self, msg: &RtmpMsg, ctx: &mut HandlerContext<'_, S>) -> Result<()> {
        log::debug!(
            "{} {} {}",
            ctx.conn_id,
            self.method,
            msg.first_number().unwrap_or(0.0)
        );
        if ctx.session.state() == SessionState::NetStream {
            ctx.session.set_state(SessionState::NetConnect);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::amf::Amf0Value;
    use crate::handlers::tests::run;
    use crate::protocol::RtmpMsg;
    use std::path::Path;

    #[test]
    fn test_no_reply() {
        let delete = RtmpMsg::new("deleteStream", 0.0)
            .with_object(Amf0Value::Null)
            .with_object(Amf0Value::Number(1.0));
        let close = RtmpMsg::new("closeStream", 0.0).with_object(Amf0Value::Null);
        assert!(run(Path::new("."), &[delete, close]).is_empty());
    }
}
