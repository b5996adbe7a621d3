use std::sync::OnceLock;
use std::time::Instant;

static STARTED: OnceLock<Instant> = OnceLock::new();

/// Milliseconds since the first call in this process.
///
/// Used as the handshake uptime field.
pub fn uptime() -> u32 {
    STARTED.get_or_init(Instant::now).elapsed().as_millis() as u32
}
