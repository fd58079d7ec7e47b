use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info};

use super::Transport;
use crate::error::TransportError;
use crate::wire::Frame;

/// How often a blocked read wakes up to notice `close`.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One UDP datagram per frame, talking to a firmware emulator.
pub struct EmulatorTransport {
    socket: UdpSocket,
    closed: AtomicBool,
}

impl EmulatorTransport {
    pub fn connect(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(("127.0.0.1", 0))?;
        socket.connect(addr)?;
        socket.set_read_timeout(Some(READ_POLL_INTERVAL))?;
        info!("Emulator: connected to {}", addr);
        Ok(Self {
            socket,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

impl Transport for EmulatorTransport {
    fn write_frame(&self, frame: &Frame) -> Result<usize, TransportError> {
        self.ensure_open()?;
        let written = self.socket.send(frame)?;
        debug!("Emulator write: {} bytes", written);
        Ok(written)
    }

    fn read_frame(&self, frame: &mut Frame) -> Result<usize, TransportError> {
        loop {
            self.ensure_open()?;
            match self.socket.recv(frame) {
                Ok(len) => {
                    self.ensure_open()?;
                    debug!("Emulator read: {} bytes", len);
                    return Ok(len);
                }
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    continue
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
