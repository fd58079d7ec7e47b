mod emulator;
mod usb;

pub use emulator::EmulatorDriver;
pub use usb::UsbDriver;

use core::fmt;

use log::error;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{ProtocolError, TransportError, ValidationError};
use crate::messages::LogicalMessage;
use crate::transport::{Transport, TransportHandle};
use crate::wire::{self, Frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceType {
    Usb,
    Emulator,
    Invalid,
}

impl DeviceType {
    /// Parse `"USB"` or `"EMULATOR"`; anything else is logged and mapped to `Invalid`.
    pub fn from_name(name: &str) -> DeviceType {
        match name {
            "USB" => DeviceType::Usb,
            "EMULATOR" => DeviceType::Emulator,
            other => {
                error!(
                    "device type {:?} not set, valid options are {} or {}",
                    other,
                    DeviceType::Usb,
                    DeviceType::Emulator
                );
                DeviceType::Invalid
            }
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceType::Usb => "USB",
            DeviceType::Emulator => "EMULATOR",
            DeviceType::Invalid => "INVALID",
        })
    }
}

/// User-friendly description of one attached device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub unique_id: String,
    pub name: String,
    pub vid: u16,
    pub pid: u16,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

impl DeviceInfo {
    pub fn new(
        unique_id: String,
        vid: u16,
        pid: u16,
        manufacturer: Option<String>,
        product: Option<String>,
        serial_number: Option<String>,
    ) -> Self {
        let name = match (&product, &manufacturer) {
            (Some(p), Some(m)) => format!("{} - {}", m, p),
            (Some(p), None) => p.clone(),
            (None, Some(m)) => m.clone(),
            (None, None) => format!("USB Device (VID: {:04x}, PID: {:04x})", vid, pid),
        };
        Self {
            unique_id,
            name,
            vid,
            pid,
            manufacturer,
            product,
            serial_number,
        }
    }
}

/// Selects and operates one kind of device (physical or emulated).
pub trait DeviceDriver: Send {
    fn device_type(&self) -> DeviceType;

    /// Open a fresh connection. Each call yields an independent handle.
    fn open(&self) -> Result<TransportHandle, TransportError>;

    fn enumerate(&self) -> Result<Vec<DeviceInfo>, TransportError>;

    /// Write every frame of one request, then read and reassemble one response.
    fn send_exchange(
        &self,
        handle: &dyn Transport,
        frames: &[Frame],
    ) -> Result<LogicalMessage, TransportError> {
        wire::write_frames(handle, frames)?;
        wire::read_from(handle)
    }

    /// Release driver-held resources such as the bus context.
    fn close(&mut self) {}
}

pub fn new_driver(config: &EngineConfig) -> Result<Box<dyn DeviceDriver>, ProtocolError> {
    match config.device_type {
        DeviceType::Usb => Ok(Box::new(UsbDriver::new(
            config.usb_vendor_id,
            config.usb_product_id,
        )?)),
        DeviceType::Emulator => Ok(Box::new(EmulatorDriver::new(&config.emulator_addr)?)),
        DeviceType::Invalid => {
            Err(ValidationError::InvalidDeviceType(DeviceType::Invalid.to_string()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_names() {
        assert_eq!(DeviceType::from_name("USB"), DeviceType::Usb);
        assert_eq!(DeviceType::from_name("EMULATOR"), DeviceType::Emulator);
        assert_eq!(DeviceType::from_name("usb"), DeviceType::Invalid);
        assert_eq!(DeviceType::Emulator.to_string(), "EMULATOR");
    }

    #[test]
    fn friendly_name_falls_back_to_ids() {
        let info = DeviceInfo::new("bus1_addr4".into(), 0x313a, 0x0001, None, None, None);
        assert_eq!(info.name, "USB Device (VID: 313a, PID: 0001)");
        let info = DeviceInfo::new(
            "x".into(),
            1,
            2,
            Some("SkycoinFoundation".into()),
            Some("Skywallet".into()),
            None,
        );
        assert_eq!(info.name, "SkycoinFoundation - Skywallet");
    }

    #[test]
    fn invalid_device_type_has_no_driver() {
        let config = EngineConfig {
            device_type: DeviceType::Invalid,
            ..EngineConfig::default()
        };
        assert!(matches!(
            new_driver(&config),
            Err(ProtocolError::Validation(ValidationError::InvalidDeviceType(_)))
        ));
    }
}
