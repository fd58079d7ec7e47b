mod emulator;
mod usb;

pub use emulator::EmulatorTransport;
pub use usb::UsbTransport;

use std::sync::Arc;

use crate::error::TransportError;
use crate::wire::Frame;

/// A byte-duplex connection to one device that moves one fixed-size frame
/// per call.
///
/// Methods take `&self` so that an entropy acknowledgment can be written from
/// a second thread while the engine is blocked reading the next message.
/// Closing from another thread must make any in-flight read fail.
pub trait Transport: Send + Sync {
    fn write_frame(&self, frame: &Frame) -> Result<usize, TransportError>;
    fn read_frame(&self, frame: &mut Frame) -> Result<usize, TransportError>;
    fn close(&self) -> Result<(), TransportError>;
}

pub type TransportHandle = Arc<dyn Transport>;
