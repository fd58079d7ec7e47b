use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rusb::{Context, Device, UsbContext};

use super::{DeviceDriver, DeviceInfo, DeviceType};
use crate::error::TransportError;
use crate::transport::{TransportHandle, UsbTransport};

const STRING_TIMEOUT: Duration = Duration::from_millis(100);

/// Driver for a physical device attached over USB.
pub struct UsbDriver {
    vendor_id: u16,
    product_id: u16,
    context: Option<Context>,
}

impl UsbDriver {
    pub fn new(vendor_id: u16, product_id: u16) -> Result<Self, TransportError> {
        Ok(Self {
            vendor_id,
            product_id,
            context: Some(Context::new()?),
        })
    }

    fn context(&self) -> Result<&Context, TransportError> {
        self.context.as_ref().ok_or(TransportError::Closed)
    }

    fn list_devices(&self) -> Result<Vec<Device<Context>>, TransportError> {
        let devices = self.context()?.devices()?;
        Ok(devices
            .iter()
            .filter(|device| match device.device_descriptor() {
                Ok(desc) => desc.vendor_id() == self.vendor_id && desc.product_id() == self.product_id,
                Err(e) => {
                    debug!("USB: skipping device without descriptor: {}", e);
                    false
                }
            })
            .collect())
    }

    fn describe(device: &Device<Context>) -> Result<DeviceInfo, TransportError> {
        let desc = device.device_descriptor()?;
        let unique_id = format!("bus{}_addr{}", device.bus_number(), device.address());

        let (manufacturer, product, serial_number) = match device.open() {
            Ok(handle) => {
                let lang = handle
                    .read_languages(STRING_TIMEOUT)
                    .ok()
                    .and_then(|langs| langs.first().copied());
                match lang {
                    Some(lang) => (
                        handle.read_manufacturer_string(lang, &desc, STRING_TIMEOUT).ok(),
                        handle.read_product_string(lang, &desc, STRING_TIMEOUT).ok(),
                        handle.read_serial_number_string(lang, &desc, STRING_TIMEOUT).ok(),
                    ),
                    None => (None, None, None),
                }
            }
            Err(e) => {
                warn!("USB: could not open {} to read strings: {}", unique_id, e);
                (None, None, None)
            }
        };

        Ok(DeviceInfo::new(
            unique_id,
            desc.vendor_id(),
            desc.product_id(),
            manufacturer,
            product,
            serial_number,
        ))
    }
}

impl DeviceDriver for UsbDriver {
    fn device_type(&self) -> DeviceType {
        DeviceType::Usb
    }

    fn open(&self) -> Result<TransportHandle, TransportError> {
        let devices = self.list_devices()?;
        let device = devices.first().ok_or(TransportError::NoDevice)?;
        info!(
            "USB: opening device at bus {} address {}",
            device.bus_number(),
            device.address()
        );
        let transport = UsbTransport::new(device, 0)?;
        Ok(Arc::new(transport))
    }

    fn enumerate(&self) -> Result<Vec<DeviceInfo>, TransportError> {
        self.list_devices()?.iter().map(Self::describe).collect()
    }

    fn close(&mut self) {
        if self.context.take().is_some() {
            info!("USB: context released");
        }
    }
}
