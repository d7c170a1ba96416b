//! Pan/Tilt Command Definitions

use crate::error::LinkError;
use crate::wire;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single motion command understood by the head firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionCommand {
    /// Pan to an absolute angle in degrees
    Pan(i32),
    /// Tilt to an absolute angle in degrees
    Tilt(i32),
    /// Settle marker, optionally tagged with the angle just reached
    Settle(Option<i32>),
}

impl MotionCommand {
    /// Get the opcode letter for this command
    pub fn opcode(&self) -> char {
        match self {
            MotionCommand::Pan(_) => wire::PAN,
            MotionCommand::Tilt(_) => wire::TILT,
            MotionCommand::Settle(_) => wire::SETTLE,
        }
    }

    /// Render the command as it goes on the wire, terminator included
    pub fn encode(&self) -> String {
        format!("{}\r", self)
    }

    /// Parse one command line with the terminator already stripped
    pub fn parse(line: &str) -> Result<Self, LinkError> {
        let line = line.trim_end_matches(wire::TERMINATOR as char);
        let mut chars = line.chars();
        let opcode = chars
            .next()
            .ok_or_else(|| LinkError::InvalidCommand(line.to_string()))?;
        let arg = chars.as_str();

        let parse_arg = |arg: &str| {
            arg.parse::<i32>()
                .map_err(|_| LinkError::InvalidCommand(line.to_string()))
        };

        match opcode {
            wire::PAN => Ok(MotionCommand::Pan(parse_arg(arg)?)),
            wire::TILT => Ok(MotionCommand::Tilt(parse_arg(arg)?)),
            wire::SETTLE if arg.is_empty() => Ok(MotionCommand::Settle(None)),
            wire::SETTLE => Ok(MotionCommand::Settle(Some(parse_arg(arg)?))),
            _ => Err(LinkError::InvalidCommand(line.to_string())),
        }
    }
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionCommand::Pan(deg) | MotionCommand::Tilt(deg) => {
                write!(f, "{}{}", self.opcode(), deg)
            }
            MotionCommand::Settle(Some(deg)) => write!(f, "{}{}", self.opcode(), deg),
            MotionCommand::Settle(None) => write!(f, "{}", self.opcode()),
        }
    }
}
