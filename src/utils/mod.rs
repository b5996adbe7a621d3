mod buffer;
mod error;
mod random;
mod time;

pub use buffer::*;
pub use error::*;
pub use random::*;
pub use time::*;
