mod connect;
mod create_stream;
mod delete_stream;
mod play;
mod stream_control;

use std::collections::HashMap;
use std::io::{Read, Write};
use crate::connection::{RtmpSession, SessionState};
use crate::message::{decode_ping, PingType};
use crate::protocol::{ContentType, HeaderSize, RtmpMsg, RtmpPacket, Status};
use crate::server::ServerContext;
use crate::{Error, Result};

pub use connect::ConnectHandler;
pub use create_stream::CreateStreamHandler;
pub use delete_stream::DeleteStreamHandler;
pub use play::PlayHandler;
pub use stream_control::StreamControlHandler;

/// What a handler can reach while answering one invoke
pub struct HandlerContext<'a, S: Read + Write> {
    pub session: &'a mut RtmpSession<S>,
    pub server: &'a ServerContext,
    pub conn_id: &'a str,
    /// Channel the request arrived on; replies go back on it
    pub channel: u8,
}

impl<S: Read + Write> HandlerContext<'_, S> {
    /// Send an onStatus on the request channel
    pub fn send_status(&mut self, status: Status, description: Option<&str>) -> Result<usize> {
        self.session.send_invoke(
            self.channel,
            HeaderSize::Twelve,
            &RtmpMsg::on_status(status, description),
        )
    }
}

pub trait CommandHandler<S: Read + Write> {
    /// Get command name this handler processes
    fn command_name(&self) -> &str;

    /// Handle the command, writing any replies through the session
    fn handle(&mut self, msg: &RtmpMsg, ctx: &mut HandlerContext<'_, S>) -> Result<()>;
}

/// Command handler registry, one per connection
pub struct CommandHandlerRegistry<S: Read + Write> {
    handlers: HashMap<String, Box<dyn CommandHandler<S>>>,
}

impl<S: Read + Write> CommandHandlerRegistry<S> {
    pub fn new() -> Self {
        let mut registry = CommandHandlerRegistry {
            handlers: HashMap::new(),
        };

        // Register default handlers
        registry.register(Box::new(ConnectHandler::new()));
        registry.register(Box::new(CreateStreamHandler::new()));
        registry.register(Box::new(PlayHandler::new()));
        registry.register(Box::new(StreamControlHandler::pause()));
        registry.register(Box::new(StreamControlHandler::seek()));
        registry.register(Box::new(DeleteStreamHandler::new("deleteStream")));
        registry.register(Box::new(DeleteStreamHandler::new("closeStream")));

        registry
    }

    pub fn register(&mut self, handler: Box<dyn CommandHandler<S>>) {
        self.handlers.insert(handler.command_name().to_string(), handler);
    }

    pub fn handles(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Run the handler for `msg`. Unknown methods are answered with
    /// NetConnection.Call.Failed.
    pub fn handle(&mut self, msg: &RtmpMsg, ctx: &mut HandlerContext<'_, S>) -> Result<()> {
        if let Some(handler) = self.handlers.get_mut(&msg.method) {
            return handler.handle(msg, ctx);
        }

        match msg.method.as_str() {
            // replies to our own calls
            "_result" | "_error" | "onStatus" => {
                log::debug!("{} ignoring {}", ctx.conn_id, msg.method);
                Ok(())
            }
            _ => {
                log::warn!("{} unknown method {}", ctx.conn_id, msg.method);
                let reply = RtmpMsg::error(Status::CallFailed, msg.transaction_id, "Method not found");
                ctx.session.send_invoke(ctx.channel, HeaderSize::Twelve, &reply)?;
                Ok(())
            }
        }
    }
}

impl<S: Read + Write> Default for CommandHandlerRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve one accepted connection until the peer goes away.
///
/// Runs the server handshake, then answers invokes and pings. A peer
/// closing the socket ends the connection normally.
pub fn serve_connection<S: Read + Write>(stream: S, server: &ServerContext, conn_id: &str) -> Result<()> {
    let mut session = RtmpSession::new(stream);
    session.server_handshake()?;
    log::info!("{} handshake complete", conn_id);

    let mut registry = CommandHandlerRegistry::new();
    loop {
        let packets = match session.recv_msgs() {
            Ok(packets) => packets,
            Err(Error::Connection(reason)) => {
                log::info!("{} closed: {}", conn_id, reason);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        for packet in packets {
            dispatch(&mut registry, &mut session, server, conn_id, &packet)?;
        }
        if session.state() == SessionState::Done {
            return Ok(());
        }
    }
}

fn dispatch<S: Read + Write>(
    registry: &mut CommandHandlerRegistry<S>,
    session: &mut RtmpSession<S>,
    server: &ServerContext,
    conn_id: &str,
    packet: &RtmpPacket,
) -> Result<()> {
    match packet.content_type() {
        ContentType::Invoke | ContentType::Amf3Invoke => {
            let msg = match packet.to_msg() {
                Ok(msg) => msg,
                Err(e) => {
                    log::warn!("{} bad invoke on channel {}: {}", conn_id, packet.channel(), e);
                    return Ok(());
                }
            };
            log::debug!("{} received {} ({})", conn_id, msg.method, msg.transaction_id);

            let mut ctx = HandlerContext {
                session,
                server,
                conn_id,
                channel: packet.channel(),
            };
            registry.handle(&msg, &mut ctx)
        }
        ContentType::User => {
            match decode_ping(&packet.payload) {
                Ok(ping) if ping.ping_type == PingType::Client => {
                    let stamp = (u32::from(ping.target) << 16) | u32::from(ping.param1);
                    session.send_ping(PingType::Pong, stamp)?;
                }
                Ok(ping) => log::debug!("{} ping {:?}", conn_id, ping.ping_type),
                Err(e) => log::warn!("{} bad ping: {}", conn_id, e),
            }
            Ok(())
        }
        ContentType::ChunkSize | ContentType::BytesRead | ContentType::WindowSize | ContentType::SetBandwidth => {
            log::debug!("{} {:?} from peer", conn_id, packet.content_type());
            Ok(())
        }
        ContentType::AudioData
        | ContentType::VideoData
        | ContentType::Notify
        | ContentType::Amf3Notify
        | ContentType::FlvData => {
            log::debug!(
                "{} ignoring {} bytes of {:?}",
                conn_id,
                packet.payload.len(),
                packet.content_type()
            );
            Ok(())
        }
        other => {
            log::warn!("{} unhandled {:?} on channel {}", conn_id, other, packet.channel());
            Ok(())
        }
    }
}
