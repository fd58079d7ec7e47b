use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::driver::DeviceType;

pub const DEFAULT_EMULATOR_ADDR: &str = "127.0.0.1:21324";
pub const SKYWALLET_VENDOR_ID: u16 = 0x313a;
pub const SKYWALLET_PRODUCT_ID: u16 = 0x0001;

/// Settings for one protocol engine instance. Every field has a default so a
/// partial JSON file is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub device_type: DeviceType,
    pub emulator_addr: String,
    pub usb_vendor_id: u16,
    pub usb_product_id: u16,
    /// Bytes of host randomness sent for each unsolicited `EntropyRequest`.
    pub entropy_ack_size: usize,
    /// Consecutive Button/Entropy requests tolerated before the exchange is abandoned.
    pub max_control_rounds: usize,
    pub pin_matrix_ack_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device_type: DeviceType::Usb,
            emulator_addr: DEFAULT_EMULATOR_ADDR.to_owned(),
            usb_vendor_id: SKYWALLET_VENDOR_ID,
            usb_product_id: SKYWALLET_PRODUCT_ID,
            entropy_ack_size: 32,
            max_control_rounds: 64,
            pin_matrix_ack_delay_ms: 1000,
        }
    }
}

impl EngineConfig {
    pub fn for_device(device_type: DeviceType) -> Self {
        Self {
            device_type,
            ..Self::default()
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn pin_matrix_ack_delay(&self) -> Duration {
        Duration::from_millis(self.pin_matrix_ack_delay_ms)
    }
}
