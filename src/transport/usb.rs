use core::time::Duration;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use rusb::{Device, DeviceHandle, UsbContext};

use super::Transport;
use crate::error::TransportError;
use crate::wire::{Frame, FRAME_SIZE};

// libusb treats a zero timeout as "wait forever".
const NO_TIMEOUT: Duration = Duration::ZERO;
// Reads wait for the user indefinitely, waking this often to notice `close`.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Interrupt-endpoint transport for a physical device.
pub struct UsbTransport<T: UsbContext> {
    handle: DeviceHandle<T>,
    interface: u8,
    in_endpoint_address: u8,
    out_endpoint_address: u8,
    closed: AtomicBool,
}

impl<T: UsbContext> UsbTransport<T> {
    pub fn new(device: &Device<T>, interface_index: usize) -> Result<Self, rusb::Error> {
        let config_descriptor = device.active_config_descriptor()?;
        let handle = device.open()?;

        // Detaching the kernel driver is required to access HID devices on Mac OS and Linux.
        match handle.set_auto_detach_kernel_driver(true) {
            Err(rusb::Error::NotSupported) => Ok(()),
            x => x,
        }?;

        let interface = config_descriptor
            .interfaces()
            .nth(interface_index)
            .ok_or(rusb::Error::NotFound)?;
        handle.claim_interface(interface.number())?;

        let interface_descriptor = interface.descriptors().next().ok_or(rusb::Error::NotFound)?;
        let mut endpoint_descriptors = interface_descriptor.endpoint_descriptors();

        let in_endpoint = endpoint_descriptors.next().ok_or(rusb::Error::NotFound)?;
        if in_endpoint.direction() != rusb::Direction::In
            || in_endpoint.transfer_type() != rusb::TransferType::Interrupt
        {
            return Err(rusb::Error::InvalidParam);
        }

        let out_endpoint = endpoint_descriptors.next().ok_or(rusb::Error::NotFound)?;
        if out_endpoint.direction() != rusb::Direction::Out
            || out_endpoint.transfer_type() != rusb::TransferType::Interrupt
        {
            return Err(rusb::Error::InvalidParam);
        }

        info!(
            "USB: claimed interface {} (in 0x{:02x}, out 0x{:02x})",
            interface.number(),
            in_endpoint.address(),
            out_endpoint.address()
        );

        Ok(Self {
            handle,
            interface: interface.number(),
            in_endpoint_address: in_endpoint.address(),
            out_endpoint_address: out_endpoint.address(),
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

impl<T: UsbContext> Transport for UsbTransport<T> {
    fn write_frame(&self, frame: &Frame) -> Result<usize, TransportError> {
        self.ensure_open()?;
        let written = self
            .handle
            .write_interrupt(self.out_endpoint_address, frame, NO_TIMEOUT)?;
        debug!("USB write: {} bytes", written);
        Ok(written)
    }

    fn read_frame(&self, frame: &mut Frame) -> Result<usize, TransportError> {
        let len = loop {
            self.ensure_open()?;
            match self
                .handle
                .read_interrupt(self.in_endpoint_address, frame, READ_POLL_INTERVAL)
            {
                Ok(len) => break len,
                Err(rusb::Error::Timeout) => continue,
                Err(e) => return Err(e.into()),
            }
        };
        // A close from another thread while we were blocked invalidates the read.
        self.ensure_open()?;
        debug!("USB read: {} bytes", len);
        if len != FRAME_SIZE {
            warn!("USB read: short frame ({} of {} bytes)", len, FRAME_SIZE);
        }
        Ok(len)
    }

    fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        info!("USB: releasing interface {}", self.interface);
        self.handle.release_interface(self.interface)?;
        Ok(())
    }
}
