// Handshake
pub const RTMP_VERSION: u8 = 3;
pub const RTMP_PORT: u16 = 1935;
/// Size of C1/S1/C2/S2
pub const HANDSHAKE_SIZE: usize = 1536;
/// uptime + zero word in front of the random block
pub const HANDSHAKE_HEADER_SIZE: usize = 8;
pub const RANDOM_SIZE: usize = HANDSHAKE_SIZE - HANDSHAKE_HEADER_SIZE;

// Header layout
pub const MAX_CHANNELS: usize = 64;
pub const MAX_HEADER_SIZE: usize = 12;
pub const HEADSIZE_MASK: u8 = 0xc0;
pub const INDEX_MASK: u8 = 0x3f;
/// Body sizes travel in 24 bits, but anything above a u16 is treated as corruption
pub const MAX_BODY_SIZE: usize = 65535;

// Chunking
pub const VIDEO_CHUNK_SIZE: usize = 128;
pub const AUDIO_CHUNK_SIZE: usize = 64;
pub const DEFAULT_CHUNK_SIZE: usize = VIDEO_CHUNK_SIZE;
/// 1 byte header for channel 3, the continuation byte seen on the wire
pub const CONTINUATION_BYTE: u8 = 0xc3;
/// A read that produced no data
pub const EMPTY_PACKET: u8 = 0xff;

// Channels
pub const SYSTEM_CHANNEL: u8 = 2;
pub const COMMAND_CHANNEL: u8 = 3;
pub const AUDIO_CHANNEL: u8 = 4;
pub const VIDEO_CHANNEL: u8 = 8;

// Routing field of 12 byte headers
pub const FROM_CLIENT: u32 = 0;
pub const FROM_SERVER: u32 = 1;

/// Body size of a ping
pub const PING_MSG_SIZE: usize = 6;
pub const DEFAULT_WINDOW_SIZE: u32 = 2_500_000;

// connect() capabilities
pub const DEFAULT_AUDIO_SET: f64 = 0x0267 as f64;
pub const DEFAULT_VIDEO_SET: f64 = 0x007c as f64;
pub const VIDEO_FUNCTION_SEEK: f64 = 1.0;
pub const FLASH_VERSION: &str = "LNX 9,0,31,0";
