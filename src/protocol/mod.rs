//! Protocol module - wire format, framing, and frame types.
//!
//! This module implements the STOMP text protocol:
//! - Command vocabulary and frame parsing
//! - Ordered headers
//! - Frame buffer for accumulating partial reads

mod frame;
mod frame_buffer;
mod headers;
mod wire_format;

pub use frame::Frame;
pub use frame_buffer::{FrameBuffer, DEFAULT_BUFFER_CAPACITY};
pub use headers::Headers;
pub use wire_format::{
    declared_content_length, decode_frame, find_header_separator, Command, CONTENT_LENGTH,
    DEFAULT_PORT, HEADER_SEPARATOR, MIN_FRAME_LEN, NEWLINE, NULL_BYTE,
};
