#![forbid(unsafe_code)]

pub mod decode;
pub mod model;
pub mod time;

pub use decode::{DecodeError, decode_text};
pub use time::Clock;
