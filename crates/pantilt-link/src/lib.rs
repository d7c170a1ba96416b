//! Pan/Tilt Head Link
//!
//! Fire-and-forget text commands to a motorized pan/tilt head over an
//! established serial (or any byte-stream) connection. Commands are
//! single-letter opcodes followed by an optional integer and a `\r`
//! terminator. The head never acknowledges a command.

mod command;
mod decoder;
mod error;
mod link;

pub use command::MotionCommand;
pub use decoder::LineDecoder;
pub use error::LinkError;
pub use link::{LinkState, MotionLink};

/// Wire protocol constants
pub mod wire {
    /// Command terminator
    pub const TERMINATOR: u8 = b'\r';
    /// Pan to absolute degrees
    pub const PAN: char = 'p';
    /// Tilt to absolute degrees
    pub const TILT: char = 't';
    /// Settle / trigger marker
    pub const SETTLE: char = 'o';
    /// Longest line the head firmware buffers (terminator excluded)
    pub const MAX_LINE_LEN: usize = 63;
    /// Default baud rate of the head firmware
    pub const DEFAULT_BAUD_RATE: u32 = 9600;
}
