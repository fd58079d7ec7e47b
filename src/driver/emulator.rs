use std::net::SocketAddr;
use std::sync::Arc;

use super::{DeviceDriver, DeviceInfo, DeviceType};
use crate::error::{TransportError, ValidationError};
use crate::transport::{EmulatorTransport, TransportHandle};

/// Driver for a firmware emulator listening on a local UDP port.
pub struct EmulatorDriver {
    addr: SocketAddr,
}

impl EmulatorDriver {
    pub fn new(addr: &str) -> Result<Self, ValidationError> {
        let addr = addr
            .parse()
            .map_err(|_| ValidationError::InvalidEmulatorAddress(addr.to_owned()))?;
        Ok(Self { addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl DeviceDriver for EmulatorDriver {
    fn device_type(&self) -> DeviceType {
        DeviceType::Emulator
    }

    fn open(&self) -> Result<TransportHandle, TransportError> {
        Ok(Arc::new(EmulatorTransport::connect(self.addr)?))
    }

    fn enumerate(&self) -> Result<Vec<DeviceInfo>, TransportError> {
        Ok(vec![DeviceInfo::new(
            format!("emulator_{}", self.addr),
            0,
            0,
            Some("SkycoinFoundation".to_owned()),
            Some("Skywallet emulator".to_owned()),
            None,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_address() {
        assert_eq!(
            EmulatorDriver::new("localhost").err(),
            Some(ValidationError::InvalidEmulatorAddress("localhost".into()))
        );
        assert_eq!(
            EmulatorDriver::new("127.0.0.1:21324").unwrap().addr().port(),
            21324
        );
    }
}
