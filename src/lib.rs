//! Headless Skywallet library: protocol engine, frame codec and transports.

pub mod config;
pub mod driver;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod firmware;
pub mod messages;
pub mod queue;
pub mod transport;
pub mod wire;

pub use config::EngineConfig;
pub use driver::{new_driver, DeviceDriver, DeviceInfo, DeviceType};
pub use engine::{AbortHandle, ButtonPressKind, Device};
pub use entropy::{EntropySink, EntropyTarget, FileSink, StdoutSink};
pub use error::{ProtocolError, Result, TransportError, ValidationError};
pub use messages::{LogicalMessage, MessageKind};
pub use transport::{Transport, TransportHandle};
pub use wire::{Frame, FRAME_SIZE};
