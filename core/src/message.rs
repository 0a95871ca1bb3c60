mod error;
mod send_mode;

pub use error::*;
pub use send_mode::*;
