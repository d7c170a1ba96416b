//! Motion link over an established byte stream
//!
//! Writes are fire-and-forget: the head sends nothing back, so a successful
//! write only means the bytes left this process.

use crate::error::LinkError;
use crate::MotionCommand;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

/// Connection state of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
}

/// Sends motion commands to the pan/tilt head
pub struct MotionLink<W> {
    /// Byte stream to the head
    writer: W,
    /// Current connection state
    state: LinkState,
    /// Commands written since the link was created
    sent: usize,
}

impl MotionLink<SerialStream> {
    /// Open a serial port to the head
    ///
    /// # Arguments
    /// * `path` - Serial device path (e.g. "/dev/rfcomm0" or "COM5")
    /// * `baud_rate` - Baud rate configured in the head firmware
    pub fn open_serial(path: &str, baud_rate: u32) -> Result<Self, LinkError> {
        info!("Opening pan/tilt link on {} at {} baud", path, baud_rate);
        let stream = tokio_serial::new(path, baud_rate).open_native_async()?;
        Ok(Self::new(stream))
    }
}

impl<W: AsyncWrite + Unpin + Send> MotionLink<W> {
    /// Wrap an already connected stream
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            state: LinkState::Connected,
            sent: 0,
        }
    }

    /// Send a motion command
    pub async fn send(&mut self, command: &MotionCommand) -> Result<(), LinkError> {
        self.send_raw(&command.encode()).await
    }

    /// Send raw text; empty text is ignored
    pub async fn send_raw(&mut self, text: &str) -> Result<(), LinkError> {
        if self.state != LinkState::Connected {
            warn!("Dropping {:?}: pan/tilt head not connected", text);
            return Err(LinkError::NotConnected);
        }
        if text.is_empty() {
            return Ok(());
        }

        debug!("Sending {:?}", text);
        let result = async {
            self.writer.write_all(text.as_bytes()).await?;
            self.writer.flush().await
        }
        .await;

        if let Err(e) = result {
            warn!("Motion link write failed, marking disconnected: {}", e);
            self.state = LinkState::Disconnected;
            return Err(e.into());
        }
        self.sent += 1;
        Ok(())
    }

    /// Current connection state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Check if the link is connected
    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Number of messages written so far
    pub fn sent_count(&self) -> usize {
        self.sent
    }

    /// Stop sending; later writes are dropped
    pub async fn disconnect(&mut self) {
        if self.state == LinkState::Connected {
            info!("Disconnecting pan/tilt link");
            let _ = self.writer.shutdown().await;
            self.state = LinkState::Disconnected;
        }
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> W {
        self.writer
    }
}
