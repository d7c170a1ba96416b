//! CR-terminated line decoding, as performed by the head firmware

use crate::error::LinkError;
use crate::wire;
use crate::MotionCommand;

/// Accumulates raw bytes and yields complete command lines
#[derive(Debug)]
pub struct LineDecoder {
    buf: Vec<u8>,
    max_len: usize,
    /// Set while discarding the tail of an over-long line
    overflowed: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new(wire::MAX_LINE_LEN)
    }
}

impl LineDecoder {
    /// Create a decoder that rejects lines longer than `max_len` bytes
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_len),
            max_len,
            overflowed: false,
        }
    }

    /// Feed bytes and collect every line completed by them.
    ///
    /// An over-long line yields a single `LineTooLong` entry and its
    /// remaining bytes are dropped up to the next terminator.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Result<String, LinkError>> {
        let mut lines = Vec::new();
        for &b in bytes {
            if b == wire::TERMINATOR {
                if self.overflowed {
                    self.overflowed = false;
                } else {
                    lines.push(Ok(String::from_utf8_lossy(&self.buf).into_owned()));
                }
                self.buf.clear();
                continue;
            }
            if self.overflowed {
                continue;
            }
            if self.buf.len() == self.max_len {
                lines.push(Err(LinkError::LineTooLong(self.max_len)));
                self.buf.clear();
                self.overflowed = true;
                continue;
            }
            self.buf.push(b);
        }
        lines
    }

    /// Feed bytes and decode every completed line into a command
    pub fn feed_commands(&mut self, bytes: &[u8]) -> Vec<Result<MotionCommand, LinkError>> {
        self.feed(bytes)
            .into_iter()
            .map(|line| line.and_then(|l| MotionCommand::parse(&l)))
            .collect()
    }

    /// Bytes buffered for the line in progress
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_across_feeds() {
        let mut decoder = LineDecoder::default();
        assert!(decoder.feed(b"p3").is_empty());
        assert_eq!(decoder.pending(), 2);

        let lines = decoder.feed(b"0\rt0\ro");
        let lines: Vec<_> = lines.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["p30", "t0"]);
        assert_eq!(decoder.pending(), 1);
    }

    #[test]
    fn test_overlong_line_is_dropped() {
        let mut decoder = LineDecoder::new(4);
        let lines = decoder.feed(b"p123456\rp9\r");
        assert_eq!(lines.len(), 2);
        assert!(matches!(lines[0], Err(LinkError::LineTooLong(4))));
        assert_eq!(lines[1].as_ref().unwrap(), "p9");
    }

    #[test]
    fn test_feed_commands() {
        let mut decoder = LineDecoder::default();
        let cmds = decoder.feed_commands(b"p0\rt20\ro\rz\r");
        assert_eq!(cmds[0].as_ref().unwrap(), &MotionCommand::Pan(0));
        assert_eq!(cmds[1].as_ref().unwrap(), &MotionCommand::Tilt(20));
        assert_eq!(cmds[2].as_ref().unwrap(), &MotionCommand::Settle(None));
        assert!(cmds[3].is_err());
    }
}
