//! Two-phase firmware update: erase, then upload with fingerprint confirmation.

use tracing::{debug, info, instrument, warn};

use crate::driver::DeviceType;
use crate::engine::{Device, Session};
use crate::error::{ProtocolError, Result, ValidationError};
use crate::messages::{builders, LogicalMessage, MessageKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Idle,
    Erasing,
    AwaitEraseResult,
    Uploading,
    AwaitButtonConfirm,
    Confirmed,
    Failed,
}

/// Drives one firmware update and remembers every state it passed through.
#[derive(Debug)]
pub struct Sequencer {
    state: UpdateState,
    history: Vec<UpdateState>,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            state: UpdateState::Idle,
            history: vec![UpdateState::Idle],
        }
    }

    pub fn state(&self) -> UpdateState {
        self.state
    }

    pub fn history(&self) -> &[UpdateState] {
        &self.history
    }

    fn advance(&mut self, next: UpdateState) {
        debug!(from = ?self.state, to = ?next, "firmware update");
        self.state = next;
        self.history.push(next);
    }

    /// Run the whole update on `device`. Only USB devices can be flashed.
    #[instrument(level = "info", skip_all, fields(len = payload.len()))]
    pub fn run(&mut self, device: &mut Device, payload: &[u8], hash: [u8; 32]) -> Result<()> {
        if device.device_type() != DeviceType::Usb {
            return Err(ValidationError::DeviceTypeEmulator.into());
        }
        let result = device
            .session()
            .and_then(|session| self.drive(&session, payload, hash));
        if result.is_err() {
            self.advance(UpdateState::Failed);
        }
        result
    }

    fn drive(&mut self, session: &Session<'_>, payload: &[u8], hash: [u8; 32]) -> Result<()> {
        self.advance(UpdateState::Erasing);
        let init = session.exchange(&builders::initialize())?;
        debug!(kind = %init.kind(), "initialized");

        info!("erasing firmware, new image is {} bytes", payload.len());
        let erase = session.exchange(&builders::firmware_erase(payload))?;
        self.advance(UpdateState::AwaitEraseResult);
        match erase.kind() {
            MessageKind::Success => {}
            MessageKind::Failure => return Err(device_failure(&erase)),
            other => return Err(ProtocolError::UnexpectedResponse(other)),
        }

        self.advance(UpdateState::Uploading);
        debug!("payload hash {}", hex::encode(hash));
        let upload = session.exchange(&builders::firmware_upload(payload, hash))?;
        match upload.kind() {
            MessageKind::ButtonRequest => {}
            MessageKind::Failure => return Err(device_failure(&upload)),
            other => return Err(ProtocolError::UnexpectedResponse(other)),
        }

        self.advance(UpdateState::AwaitButtonConfirm);
        info!("please confirm on the device that the fingerprints match");
        let confirm = session.exchange(&builders::button_ack())?;
        match confirm.kind() {
            MessageKind::Success => {
                self.advance(UpdateState::Confirmed);
                info!("firmware update confirmed");
                Ok(())
            }
            MessageKind::Failure => Err(device_failure(&confirm)),
            other => Err(ProtocolError::UnexpectedResponse(other)),
        }
    }
}

fn device_failure(reply: &LogicalMessage) -> ProtocolError {
    match builders::decode_failure(reply) {
        Ok(text) => {
            warn!("device rejected firmware step: {}", text);
            ProtocolError::DeviceFailure(text)
        }
        Err(e) => e,
    }
}
