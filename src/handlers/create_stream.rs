use std::io::{Read, Write};
use crate::connection::SessionState;
use crate::handlers::{CommandHandler, HandlerContext};
use crate::protocol::{HeaderSize, RtmpMsg};
use crate::Result;

/// Hands out stream ids, starting at 1
pub struct CreateStreamHandler {
    next_id: f64,
}

impl CreateStreamHandler {
    pub fn new() -> Self {
        CreateStreamHandler { next_id: 1.0 }
    }
}

impl Default for CreateStreamHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Read + Write> CommandHandler<S> for CreateStreamHandler {
    fn command_name(&self) -> &str {
        "createStream"
    }

    fn handle(&mut self, msg: &RtmpMsg, ctx: &mut HandlerContext<'_, S>) -> Result<()> {
        let stream_id = self.next_id;
        self.next_id += 1.0;
        log::debug!("{} created stream {}", ctx.conn_id, stream_id);

        ctx.session.send_invoke(
            ctx.channel,
            HeaderSize::Eight,
            &RtmpMsg::stream_id(msg.transaction_id, stream_id),
        )?;
        ctx.session.set_state(SessionState::NetStream);
        Ok(())
    }
}
