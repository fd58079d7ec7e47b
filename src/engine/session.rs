use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::driver::DeviceDriver;
use crate::error::{Result, TransportError};
use crate::messages::LogicalMessage;
use crate::transport::{Transport, TransportHandle};
use crate::wire::{self, Frame};

type Live = Arc<Mutex<Option<TransportHandle>>>;

fn lock(live: &Live) -> MutexGuard<'_, Option<TransportHandle>> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The connection an engine holds, mirrored for its [`AbortHandle`]s.
#[derive(Default)]
pub(crate) struct Slot {
    handle: Option<TransportHandle>,
    live: Live,
}

impl Slot {
    pub(crate) fn get(&self) -> Option<&dyn Transport> {
        self.handle.as_deref()
    }

    pub(crate) fn is_some(&self) -> bool {
        self.handle.is_some()
    }

    pub(crate) fn take(&mut self) -> Option<TransportHandle> {
        *lock(&self.live) = None;
        self.handle.take()
    }

    fn set(&mut self, handle: TransportHandle) {
        *lock(&self.live) = Some(handle.clone());
        self.handle = Some(handle);
    }

    pub(crate) fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            live: self.live.clone(),
        }
    }
}

/// Closes the engine's current connection from another thread.
///
/// A read blocked on that connection fails with `TransportError::Closed`,
/// which ends the operation waiting on it.
#[derive(Clone)]
pub struct AbortHandle {
    live: Live,
}

impl AbortHandle {
    /// Returns whether a connection was open to close.
    pub fn abort(&self) -> std::result::Result<bool, TransportError> {
        let current = lock(&self.live).clone();
        match current {
            Some(handle) => {
                warn!("aborting the open device connection");
                handle.close()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Close and forget whatever handle `slot` holds.
pub(crate) fn release(slot: &mut Slot) {
    if let Some(handle) = slot.take() {
        if let Err(e) = handle.close() {
            warn!("closing device handle failed: {}", e);
        }
    }
}

/// Replace the handle held in `slot` with a freshly opened one.
pub(crate) fn reopen(driver: &dyn DeviceDriver, slot: &mut Slot) -> Result<()> {
    release(slot);
    slot.set(driver.open()?);
    debug!("device handle opened");
    Ok(())
}

/// The one open connection of an engine, closed when the guard is dropped.
pub(crate) struct Session<'a> {
    driver: &'a dyn DeviceDriver,
    slot: &'a mut Slot,
}

impl<'a> Session<'a> {
    pub(crate) fn open(driver: &'a dyn DeviceDriver, slot: &'a mut Slot) -> Result<Self> {
        reopen(driver, slot)?;
        Ok(Self { driver, slot })
    }

    pub(crate) fn transport(&self) -> Result<&dyn Transport> {
        Ok(self.slot.get().ok_or(TransportError::NotConnected)?)
    }

    /// Send one request and return the device's immediate answer.
    pub(crate) fn exchange(&self, frames: &[Frame]) -> Result<LogicalMessage> {
        let transport = self.transport()?;
        Ok(self.driver.send_exchange(transport, frames)?)
    }

    pub(crate) fn read(&self) -> Result<LogicalMessage> {
        Ok(wire::read_from(self.transport()?)?)
    }

    /// Close the connection before a follow-up operation opens its own.
    pub(crate) fn close(self) {}
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        release(self.slot);
    }
}
