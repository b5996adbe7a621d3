mod state;
mod c0c1;
mod s0s1s2;

pub use state::*;
pub use c0c1::*;
pub use s0s1s2::*;

use crate::protocol::HANDSHAKE_SIZE;
use crate::Result;

/// Parse a client's C0+C1 and build the S0+S1+S2 reply
pub fn server_response(data: &[u8]) -> Result<S0S1S2> {
    let c0c1 = C0C1::parse(data)?;
    log::debug!("Client uptime is {}ms", c0c1.timestamp);
    Ok(S0S1S2::generate(&c0c1))
}

/// Check the client's C2 and return whatever followed it in the same read.
///
/// A bad echo is only logged; some clients send garbage here.
pub fn server_finish(data: &[u8], s0s1s2: &S0S1S2) -> Result<Vec<u8>> {
    let c2 = C2::parse(data)?;
    if let Err(e) = c2.validate(s0s1s2) {
        log::warn!("{}, continuing anyway", e);
    }
    Ok(data[HANDSHAKE_SIZE..].to_vec())
}

/// Parse the server reply and build our C2, with `payload` appended so
/// both go out in the same write
pub fn client_finish(data: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    let s0s1s2 = S0S1S2::parse(data)?;
    log::debug!("Server uptime is {}ms", s0s1s2.s1_timestamp);
    if s0s1s2.s2_random_echo.len() != s0s1s2.s1_random.len() {
        log::warn!("Server echo has the wrong size");
    }

    let mut out = C2::create_from_s1(&s0s1s2).encode();
    out.extend_from_slice(payload);
    Ok(out)
}
