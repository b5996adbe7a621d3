mod disk_stream;
mod file_type;
mod page;

pub use disk_stream::*;
pub use file_type::*;
pub use page::*;
