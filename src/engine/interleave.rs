//! Servicing of the control messages a device may send in place of an answer.

use std::thread;

use tracing::{debug, trace, warn};

use super::ButtonPressKind;
use crate::error::{ProtocolError, Result, TransportError};
use crate::messages::{builders, LogicalMessage, MessageKind};
use crate::transport::Transport;
use crate::wire;

/// Per-call snapshot of the engine settings the loop depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InterleaveConfig {
    /// Simulated press written after every ButtonAck, emulator only.
    pub button: Option<ButtonPressKind>,
    pub entropy_ack_size: usize,
    pub max_control_rounds: usize,
}

/// Send a ButtonAck (no reply is read) and, when configured, the simulated press.
pub(crate) fn acknowledge_button(transport: &dyn Transport, config: InterleaveConfig) -> Result<()> {
    wire::write_frames(transport, &builders::button_ack())?;
    if let Some(kind) = config.button {
        debug!(?kind, "simulating button press");
        wire::write_frames(transport, &builders::simulate_button_press(kind))?;
    }
    Ok(())
}

/// Answer an `EntropyRequest` and return the next message.
///
/// The ack is written from a scoped thread while this thread blocks on the
/// read. The writer is always joined before the read result is looked at; a
/// read error wins over a write error.
pub(crate) fn service_entropy_request(
    transport: &dyn Transport,
    ack_size: usize,
) -> Result<LogicalMessage> {
    let ack = builders::entropy_ack(ack_size);
    let next = thread::scope(|scope| -> std::result::Result<LogicalMessage, TransportError> {
        let writer = scope.spawn(|| wire::write_frames(transport, &ack));
        let read = wire::read_from(transport);
        let written = writer.join().map_err(|_| TransportError::WriterPanicked)?;
        let message = read?;
        if let Err(e) = &written {
            warn!("entropy ack write failed: {}", e);
        }
        written?;
        Ok(message)
    })?;
    Ok(next)
}

/// Run the interleave loop starting from `first` until a terminal message.
///
/// ButtonRequest and EntropyRequest are serviced in place, Failure becomes
/// `DeviceFailure`, anything else is returned unchanged. More than
/// `max_control_rounds` consecutive control messages abort the exchange.
pub(crate) fn drive(
    transport: &dyn Transport,
    first: LogicalMessage,
    config: InterleaveConfig,
) -> Result<LogicalMessage> {
    let mut message = first;
    let mut rounds = 0;
    loop {
        let kind = message.kind();
        match kind {
            MessageKind::ButtonRequest | MessageKind::EntropyRequest
                if rounds >= config.max_control_rounds =>
            {
                warn!(rounds, "device keeps sending control messages, giving up");
                return Err(TransportError::ControlFlood(rounds).into());
            }
            MessageKind::ButtonRequest => {
                trace!(rounds, "ButtonRequest");
                acknowledge_button(transport, config)?;
                message = wire::read_from(transport)?;
            }
            MessageKind::EntropyRequest => {
                trace!(rounds, "EntropyRequest");
                message = service_entropy_request(transport, config.entropy_ack_size)?;
            }
            MessageKind::Failure => {
                return Err(ProtocolError::DeviceFailure(builders::decode_failure(
                    &message,
                )?));
            }
            _ => return Ok(message),
        }
        rounds += 1;
    }
}
