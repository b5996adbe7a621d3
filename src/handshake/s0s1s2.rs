use crate::handshake::c0c1::C0C1;
use crate::protocol::{HANDSHAKE_SIZE, RANDOM_SIZE, RTMP_VERSION};
use crate::utils::{generate_random_bytes, uptime};
use crate::{Buffer, Error, Result};

/// Server reply: version, S1 with fresh filler, and S2 echoing C1
#[derive(Debug, Clone)]
pub struct S0S1S2 {
    pub version: u8,

    /// Server uptime
    pub s1_timestamp: u32,

    pub s1_zero: u32,

    pub s1_random: Vec<u8>,

    /// C1 timestamp as received
    pub s2_timestamp: u32,

    /// C1 zero word as received
    pub s2_timestamp2: u32,

    /// C1 filler as received
    pub s2_random_echo: Vec<u8>,
}

impl S0S1S2 {
    pub fn generate(c0c1: &C0C1) -> Self {
        S0S1S2 {
            version: RTMP_VERSION,
            s1_timestamp: uptime(),
            s1_zero: 0,
            s1_random: generate_random_bytes(RANDOM_SIZE),
            s2_timestamp: c0c1.timestamp,
            s2_timestamp2: c0c1.zero,
            s2_random_echo: c0c1.random_data.clone(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Buffer::with_size(1 + HANDSHAKE_SIZE * 2);
        buf.write_u8(self.version);

        buf.write_u32_be(self.s1_timestamp);
        buf.write_u32_be(self.s1_zero);
        buf.append(&self.s1_random);

        buf.write_u32_be(self.s2_timestamp);
        buf.write_u32_be(self.s2_timestamp2);
        buf.append(&self.s2_random_echo);
        buf.into_vec()
    }

    /// Parse S0+S1+S2 on the client side
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 1 + HANDSHAKE_SIZE * 2 {
            return Err(Error::handshake(format!(
                "S0+S1+S2 too short: {} bytes",
                data.len()
            )));
        }

        let version = data[0];
        if version != RTMP_VERSION {
            return Err(Error::handshake(format!(
                "Server answered with RTMP version {}",
                version
            )));
        }

        let mut buf = Buffer::from_slice(&data[1..1 + HANDSHAKE_SIZE * 2]);
        let s1_timestamp = buf.read_u32_be()?;
        let s1_zero = buf.read_u32_be()?;
        let s1_random = buf.read_bytes(RANDOM_SIZE)?;
        let s2_timestamp = buf.read_u32_be()?;
        let s2_timestamp2 = buf.read_u32_be()?;
        let s2_random_echo = buf.read_bytes(RANDOM_SIZE)?;

        Ok(S0S1S2 {
            version,
            s1_timestamp,
            s1_zero,
            s1_random,
            s2_timestamp,
            s2_timestamp2,
            s2_random_echo,
        })
    }
}

/// Final client packet, an echo of S1
#[derive(Debug, Clone)]
pub struct C2 {
    /// Server uptime from S1
    pub timestamp: u32,

    /// Our own time when sending
    pub timestamp2: u32,

    pub random_echo: Vec<u8>,
}

impl C2 {
    pub fn create_from_s1(s0s1s2: &S0S1S2) -> Self {
        C2 {
            timestamp: s0s1s2.s1_timestamp,
            timestamp2: uptime(),
            random_echo: s0s1s2.s1_random.clone(),
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HANDSHAKE_SIZE {
            return Err(Error::handshake(format!("C2 too short: {} bytes", data.len())));
        }

        let mut buf = Buffer::from_slice(&data[..HANDSHAKE_SIZE]);
        let timestamp = buf.read_u32_be()?;
        let timestamp2 = buf.read_u32_be()?;
        let random_echo = buf.read_bytes(RANDOM_SIZE)?;

        Ok(C2 {
            timestamp,
            timestamp2,
            random_echo,
        })
    }

    /// Check the echo against what we sent in S1
    pub fn validate(&self, s0s1s2: &S0S1S2) -> Result<()> {
        if self.timestamp != s0s1s2.s1_timestamp {
            return Err(Error::handshake("C2 timestamp mismatch"));
        }
        if self.random_echo != s0s1s2.s1_random {
            return Err(Error::handshake("C2 random echo mismatch"));
        }
        Ok(())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Buffer::with_size(HANDSHAKE_SIZE);
        buf.write_u32_be(self.timestamp);
        buf.write_u32_be(self.timestamp2);
        buf.append(&self.random_echo);
        buf.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_flow() {
        let c0c1 = C0C1::create_client();

        let s0s1s2 = S0S1S2::generate(&c0c1);
        let bytes = s0s1s2.encode();
        assert_eq!(bytes.len(), 3073);
        // S2 echoes C1 unchanged
        assert_eq!(&bytes[1537..], &c0c1.encode()[1..]);

        let parsed = S0S1S2::parse(&bytes).unwrap();
        let c2 = C2::create_from_s1(&parsed);
        assert_eq!(c2.encode().len(), HANDSHAKE_SIZE);

        C2::parse(&c2.encode()).unwrap().validate(&s0s1s2).unwrap();
    }

    #[test]
    fn test_bad_echo_detected() {
        let s0s1s2 = S0S1S2::generate(&C0C1::create_client());
        let mut c2 = C2::create_from_s1(&s0s1s2);
        c2.random_echo[0] ^= 0xff;
        assert!(c2.validate(&s0s1s2).is_err());
    }
}
