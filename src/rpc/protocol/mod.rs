mod io;
mod types;

pub use io::{MAX_MESSAGE_BYTES, read_message, send_message};
pub use types::*;
