use crate::protocol::{HANDSHAKE_SIZE, RANDOM_SIZE, RTMP_VERSION};
use crate::utils::{generate_random_bytes, uptime};
use crate::{Buffer, Error, Result};

/// First client packet: version byte followed by the 1536 byte C1 block
#[derive(Debug, Clone)]
pub struct C0C1 {
    /// RTMP version (C0)
    pub version: u8,

    /// Sender uptime in milliseconds
    pub timestamp: u32,

    /// Always zero on send, not checked on receipt
    pub zero: u32,

    /// Filler the peer echoes back
    pub random_data: Vec<u8>,
}

impl C0C1 {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 1 + HANDSHAKE_SIZE {
            return Err(Error::handshake(format!(
                "C0+C1 too short: {} bytes, expected {}",
                data.len(),
                1 + HANDSHAKE_SIZE
            )));
        }

        let version = data[0];
        if version != RTMP_VERSION {
            return Err(Error::handshake(format!(
                "Unsupported RTMP version: {}, expected {}",
                version, RTMP_VERSION
            )));
        }

        let mut buffer = Buffer::from_slice(&data[1..1 + HANDSHAKE_SIZE]);
        let timestamp = buffer.read_u32_be()?;
        let zero = buffer.read_u32_be()?;
        let random_data = buffer.read_bytes(RANDOM_SIZE)?;

        Ok(C0C1 {
            version,
            timestamp,
            zero,
            random_data,
        })
    }

    pub fn create_client() -> Self {
        C0C1 {
            version: RTMP_VERSION,
            timestamp: uptime(),
            zero: 0,
            random_data: generate_random_bytes(RANDOM_SIZE),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Buffer::with_size(1 + HANDSHAKE_SIZE);
        buf.write_u8(self.version);
        buf.write_u32_be(self.timestamp);
        buf.write_u32_be(self.zero);
        buf.append(&self.random_data);
        buf.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c0c1_layout() {
        let c0c1 = C0C1::create_client();
        let bytes = c0c1.encode();

        assert_eq!(bytes.len(), 1537);
        assert_eq!(bytes[0], 0x03);
        assert_eq!(&bytes[5..9], &[0, 0, 0, 0]);
        assert_eq!(&bytes[9..], c0c1.random_data.as_slice());
    }

    #[test]
    fn test_parse() {
        let original = C0C1::create_client();
        let parsed = C0C1::parse(&original.encode()).unwrap();
        assert_eq!(parsed.timestamp, original.timestamp);
        assert_eq!(parsed.random_data, original.random_data);
    }

    #[test]
    fn test_parse_rejects_short_and_bad_version() {
        assert!(C0C1::parse(&[3u8; 100]).is_err());

        let mut bytes = C0C1::create_client().encode();
        bytes[0] = 6;
        assert!(C0C1::parse(&bytes).is_err());
    }
}
