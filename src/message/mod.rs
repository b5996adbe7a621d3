mod control;
mod queue;

pub use control::*;
pub use queue::*;
