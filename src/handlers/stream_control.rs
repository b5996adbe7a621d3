use std::io::{Read, Write};
use crate::handlers::{CommandHandler, HandlerContext};
use crate::protocol::{RtmpMsg, Status, StreamOp};
use crate::Result;

/// Acknowledges pause and seek with their notify status
pub struct StreamControlHandler {
    op: StreamOp,
    status: Status,
}

impl StreamControlHandler {
    pub fn pause() -> Self {
        StreamControlHandler {
            op: StreamOp::Pause,
            status: Status::PauseNotify,
        }
    }

    pub fn seek() -> Self {
        StreamControlHandler {
            op: StreamOp::Seek,
            status: Status::SeekNotify,
        }
    }
}

impl<S: Read + Write> CommandHandler<S> for StreamControlHandler {
    fn command_name(&self) -> &str {
        self.op.method()
    }

    fn handle(&mut self, msg: &RtmpMsg, ctx: &mut HandlerContext<'_, S>) -> Result<()> {
        log::debug!(
            "{} {} at {}ms",
            ctx.conn_id,
            self.op.method(),
            msg.first_number().unwrap_or(0.0)
        );
        ctx.send_status(self.status, None)?;
        Ok(())
    }
}
