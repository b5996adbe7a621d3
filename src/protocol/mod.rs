mod channel;
mod command;
mod header;
mod packet;
pub mod constants;

pub use channel::*;
pub use command::*;
pub use header::*;
pub use packet::*;
pub use constants::*;
