use thiserror::Error;

use crate::messages::MessageKind;

pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Caller supplied an argument that violates a precondition. Raised before
/// any connection is opened.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("addresses to generate should be greater than 0")]
    AddressNZero,
    #[error("use_passphrase must be provided")]
    UsePassphraseNil,
    #[error("remove_pin must be provided")]
    RemovePinNil,
    #[error("device type cannot be emulator")]
    DeviceTypeEmulator,
    #[error("word count must be 12 or 24, got {0}")]
    InvalidWordCount(u32),
    #[error("invalid button type for simulated press")]
    InvalidButtonKind,
    #[error("invalid device type {0:?}, valid options are USB or EMULATOR")]
    InvalidDeviceType(String),
    #[error("invalid emulator address {0:?}")]
    InvalidEmulatorAddress(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("device is not connected")]
    NotConnected,
    #[error("connection was closed")]
    Closed,
    #[error("no device found")]
    NoDevice,
    #[error("invalid frame header: {0:02x} {1:02x} {2:02x}")]
    InvalidHeader(u8, u8, u8),
    #[error("incomplete message: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
    #[error("message of {length} bytes exceeds the {limit} byte limit")]
    Oversized { length: usize, limit: usize },
    #[error("short write: expected {expected} bytes, wrote {written}")]
    ShortWrite { expected: usize, written: usize },
    #[error("device sent {0} consecutive control messages without a final answer")]
    ControlFlood(usize),
    #[error("entropy ack writer panicked")]
    WriterPanicked,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid argument: {0}")]
    Validation(#[from] ValidationError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    DeviceFailure(String),
    #[error("received unexpected message type: {0}")]
    UnexpectedResponse(MessageKind),
    #[error("failed to decode device response: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("entropy sink error: {0}")]
    Sink(#[source] std::io::Error),
    #[error("not enough bytes saved: current {actual}, required {expected}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("device returned an empty entropy chunk")]
    EmptyEntropy,
    #[error("entropy stream aborted after {received} bytes: {source}")]
    EntropyInterrupted {
        received: u32,
        #[source]
        source: Box<ProtocolError>,
    },
}

impl ProtocolError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ProtocolError::Transport(_))
    }
}
