use crate::amf::amf0::{markers, Amf0Value, Properties};
use crate::{Buffer, Error, Result};

/// Deepest nesting of objects and arrays accepted in one value
pub const MAX_NESTING: usize = 64;

pub struct Amf0Decoder<'a> {
    buffer: &'a mut Buffer,
    depth: usize,
}

impl<'a> Amf0Decoder<'a> {
    pub fn new(buffer: &'a mut Buffer) -> Self {
        Amf0Decoder { buffer, depth: 0 }
    }

    /// Check if decoder has remaining data to decode
    pub fn has_remaining(&self) -> bool {
        self.buffer.remaining() > 0
    }

    pub fn decode(&mut self) -> Result<Amf0Value> {
        let marker = self.read(|b| b.read_u8())?;
        match marker {
            markers::NUMBER => Ok(Amf0Value::Number(self.read(|b| b.read_f64_be())?)),
            markers::BOOLEAN => Ok(Amf0Value::Boolean(self.read(|b| b.read_u8())? != 0)),
            markers::STRING => Ok(Amf0Value::String(self.read_utf8()?)),
            markers::OBJECT => Ok(Amf0Value::Object(self.nested(Self::read_properties)?)),
            markers::NULL => Ok(Amf0Value::Null),
            markers::UNDEFINED => Ok(Amf0Value::Undefined),
            markers::ECMA_ARRAY => {
                // the advertised count is unreliable, the end marker terminates
                let _count = self.read(|b| b.read_u32_be())?;
                Ok(Amf0Value::EcmaArray(self.nested(Self::read_properties)?))
            }
            markers::STRICT_ARRAY => {
                let count = self.read(|b| b.read_u32_be())? as usize;
                // each element takes at least one byte
                if count > self.buffer.remaining() {
                    return Err(Error::amf_decode(format!("strict array count {} too large", count)));
                }
                let items = self.nested(|d| {
                    let mut items = Vec::with_capacity(count);
                    for _ in 0..count {
                        items.push(d.decode()?);
                    }
                    Ok(items)
                })?;
                Ok(Amf0Value::StrictArray(items))
            }
            markers::DATE => {
                let timestamp = self.read(|b| b.read_f64_be())?;
                let timezone = self.read(|b| b.read_i16_be())?;
                Ok(Amf0Value::Date(timestamp, timezone))
            }
            markers::LONG_STRING => {
                let len = self.read(|b| b.read_u32_be())? as usize;
                Ok(Amf0Value::LongString(self.read_string(len)?))
            }
            _ => Err(Error::amf_decode(format!("Unknown AMF0 marker: 0x{:02x}", marker))),
        }
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(Error::amf_decode(format!("values nested deeper than {}", MAX_NESTING)));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn read<T>(&mut self, f: impl FnOnce(&mut Buffer) -> std::io::Result<T>) -> Result<T> {
        f(self.buffer).map_err(|e| Error::amf_decode(format!("truncated value: {}", e)))
    }

    fn read_utf8(&mut self) -> Result<String> {
        let len = self.read(|b| b.read_u16_be())? as usize;
        self.read_string(len)
    }

    fn read_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.read(|b| b.read_bytes(len))?;
        String::from_utf8(bytes)
            .map_err(|e| Error::amf_decode(format!("Invalid UTF-8 in string: {}", e)))
    }

    fn read_properties(&mut self) -> Result<Properties> {
        let mut props = Vec::new();
        loop {
            let name = self.read_utf8()?;
            if name.is_empty() {
                let end = self.read(|b| b.read_u8())?;
                if end != markers::OBJECT_END {
                    return Err(Error::amf_decode(format!("bad object end marker 0x{:02x}", end)));
                }
                return Ok(props);
            }
            let value = self.decode()?;
            props.push((name, value));
        }
    }
}
