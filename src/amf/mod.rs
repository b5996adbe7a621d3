mod amf0;
mod decoder;
mod encoder;

pub use amf0::*;
pub use decoder::*;
pub use encoder::*;
