use crate::amf::amf0::{markers, Amf0Value, Properties};
use crate::{Buffer, Error, Result};

pub struct Amf0Encoder {
    buffer: Buffer,
}

impl Amf0Encoder {
    pub fn new() -> Self {
        Amf0Encoder {
            buffer: Buffer::with_size(256),
        }
    }

    pub fn encode(&mut self, value: &Amf0Value) -> Result<()> {
        match value {
            Amf0Value::Number(n) => {
                self.buffer.write_u8(markers::NUMBER);
                self.buffer.write_f64_be(*n);
            }
            Amf0Value::Boolean(b) => {
                self.buffer.write_u8(markers::BOOLEAN);
                self.buffer.write_u8(u8::from(*b));
            }
            Amf0Value::String(s) => {
                // strings that do not fit a u16 length go out as long strings
                if s.len() > u16::MAX as usize {
                    return self.encode_long_string(s);
                }
                self.buffer.write_u8(markers::STRING);
                self.write_utf8(s)?;
            }
            Amf0Value::Object(props) => {
                self.buffer.write_u8(markers::OBJECT);
                self.write_properties(props)?;
            }
            Amf0Value::Null => self.buffer.write_u8(markers::NULL),
            Amf0Value::Undefined => self.buffer.write_u8(markers::UNDEFINED),
            Amf0Value::EcmaArray(props) => {
                self.buffer.write_u8(markers::ECMA_ARRAY);
                self.buffer.write_u32_be(props.len() as u32);
                self.write_properties(props)?;
            }
            Amf0Value::StrictArray(items) => {
                self.buffer.write_u8(markers::STRICT_ARRAY);
                self.buffer.write_u32_be(items.len() as u32);
                for item in items {
                    self.encode(item)?;
                }
            }
            Amf0Value::Date(timestamp, timezone) => {
                self.buffer.write_u8(markers::DATE);
                self.buffer.write_f64_be(*timestamp);
                self.buffer.write_i16_be(*timezone);
            }
            Amf0Value::LongString(s) => return self.encode_long_string(s),
        }
        Ok(())
    }

    /// Encode several values back to back
    pub fn encode_all<'a>(&mut self, values: impl IntoIterator<Item = &'a Amf0Value>) -> Result<()> {
        for value in values {
            self.encode(value)?;
        }
        Ok(())
    }

    fn encode_long_string(&mut self, value: &str) -> Result<()> {
        let len = u32::try_from(value.len())
            .map_err(|_| Error::amf_encode("long string exceeds 4GB"))?;
        self.buffer.write_u8(markers::LONG_STRING);
        self.buffer.write_u32_be(len);
        self.buffer.append(value.as_bytes());
        Ok(())
    }

    fn write_properties(&mut self, props: &Properties) -> Result<()> {
        for (key, value) in props {
            self.write_utf8(key)?;
            self.encode(value)?;
        }
        self.buffer.write_u16_be(0);
        self.buffer.write_u8(markers::OBJECT_END);
        Ok(())
    }

    /// u16 length prefixed string without a type marker
    fn write_utf8(&mut self, value: &str) -> Result<()> {
        let len = u16::try_from(value.len())
            .map_err(|_| Error::amf_encode(format!("string of {} bytes too long", value.len())))?;
        self.buffer.write_u16_be(len);
        self.buffer.append(value.as_bytes());
        Ok(())
    }

    pub fn into_buffer(self) -> Buffer {
        self.buffer
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        self.buffer.to_vec()
    }
}

impl Default for Amf0Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_string() {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&Amf0Value::string("_result")).unwrap();
        assert_eq!(
            encoder.get_bytes(),
            vec![0x02, 0x00, 0x07, b'_', b'r', b'e', b's', b'u', b'l', b't']
        );
    }

    #[test]
    fn test_encode_number_one() {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&Amf0Value::Number(1.0)).unwrap();
        assert_eq!(
            encoder.get_bytes(),
            vec![0x00, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_encode_object_preserves_order() {
        let mut encoder = Amf0Encoder::new();
        encoder
            .encode(&Amf0Value::object([
                ("b", Amf0Value::Null),
                ("a", Amf0Value::Boolean(true)),
            ]))
            .unwrap();
        assert_eq!(
            encoder.get_bytes(),
            vec![0x03, 0, 1, b'b', 0x05, 0, 1, b'a', 0x01, 0x01, 0, 0, 0x09]
        );
    }
}
