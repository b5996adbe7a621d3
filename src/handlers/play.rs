use std::io::{Read, Write};
use std::sync::PoisonError;
use crate::handlers::{CommandHandler, HandlerContext};
use crate::protocol::{ContentType, HeaderSize, RtmpMsg, Status};
use crate::stream::StreamState;
use crate::Result;

/// Streams a file from the docroot as FLV data messages
pub struct PlayHandler;

impl PlayHandler {
    pub fn new() -> Self {
        PlayHandler
    }
}

impl Default for PlayHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Read + Write> CommandHandler<S> for PlayHandler {
    fn command_name(&self) -> &str {
        "play"
    }

    fn handle(&mut self, msg: &RtmpMsg, ctx: &mut HandlerContext<'_, S>) -> Result<()> {
        let Some(name) = msg.first_string() else {
            log::warn!("{} play without a stream name", ctx.conn_id);
            ctx.send_status(Status::PlayFailed, Some("No stream name given"))?;
            return Ok(());
        };

        let shared = match ctx.server.resolve(name) {
            Ok(shared) => shared,
            Err(e) => {
                log::warn!("{} can't play {}: {}", ctx.conn_id, name, e);
                ctx.send_status(Status::PlayStreamNotFound, Some(name))?;
                return Ok(());
            }
        };
        // private cursor over the cached pages
        let mut stream = shared.lock().unwrap_or_else(PoisonError::into_inner).fork();

        log::info!(
            "{} playing {} ({} bytes)",
            ctx.conn_id,
            stream.filespec().display(),
            stream.filesize()
        );
        ctx.send_status(Status::PlayStart, Some(name))?;

        let mut page = Vec::with_capacity(stream.pagesize());
        let mut head_size = HeaderSize::Twelve;
        loop {
            page.clear();
            if stream.play(&mut page, false)? > 0 {
                let routing = ctx.session.routing();
                ctx.session
                    .send_msg(ctx.channel, head_size, ContentType::FlvData, routing, &page)?;
                head_size = HeaderSize::Eight;
            }
            if stream.state() != StreamState::Play {
                break;
            }
        }

        log::debug!("{} sent {} bytes of {}", ctx.conn_id, stream.bytes_sent(), name);
        ctx.send_status(Status::PlayStop, Some(name))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::tests::run;
    use crate::protocol::{ContentType, RtmpMsg, StreamOp, Status};
    use std::fs;

    fn play(name: &str) -> RtmpMsg {
        RtmpMsg::stream_op(StreamOp::Play, 0.0, Some(name), None)
    }

    #[test]
    fn test_play_streams_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(dir.path().join("clip.flv"), &data).unwrap();

        let replies = run(dir.path(), &[play("clip")]);
        let first = replies.first().unwrap().to_msg().unwrap();
        let last = replies.last().unwrap().to_msg().unwrap();
        assert_eq!(first.status, Some(Status::PlayStart));
        assert_eq!(last.status, Some(Status::PlayStop));

        let media: Vec<_> = replies
            .iter()
            .filter(|p| p.content_type() == ContentType::FlvData)
            .collect();
        // 4096 byte pages
        assert_eq!(media.len(), 3);
        let received: Vec<u8> = media.iter().flat_map(|p| p.payload.clone()).collect();
        assert_eq!(received, data);
    }

    #[test]
    fn test_play_missing_stream() {
        let dir = tempfile::tempdir().unwrap();
        let replies = run(dir.path(), &[play("nothing")]);
        assert_eq!(replies.len(), 1);

        let msg = replies[0].to_msg().unwrap();
        assert_eq!(msg.method, "onStatus");
        assert_eq!(msg.status, Some(Status::PlayStreamNotFound));
    }

    #[test]
    fn test_play_twice_replays() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("short.flv"), b"FLV\x01\x05\x00\x00\x00\x09").unwrap();

        let replies = run(dir.path(), &[play("short.flv"), play("short.flv")]);
        let media = replies
            .iter()
            .filter(|p| p.content_type() == ContentType::FlvData)
            .count();
        assert_eq!(media, 2);
    }
}
