//! Serialized access to one `Device` from many async callers.
//!
//! A dedicated blocking worker owns the engine; callers talk to it through a
//! cloneable [`DeviceQueueHandle`] and get their answer back on a oneshot.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::engine::Device;
use crate::messages::{Features, LogicalMessage};

const QUEUE_CHANNEL_SIZE: usize = 100;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Arbitrary engine call executed on the worker thread.
pub type DeviceOp = Box<dyn FnOnce(&mut Device) -> crate::Result<LogicalMessage> + Send>;

/// Commands that can be sent to the device worker
pub enum DeviceCmd {
    GetFeatures {
        respond_to: oneshot::Sender<crate::Result<Features>>,
        enqueued_at: Instant,
    },
    Connected {
        respond_to: oneshot::Sender<bool>,
        enqueued_at: Instant,
    },
    Run {
        op: DeviceOp,
        respond_to: oneshot::Sender<crate::Result<LogicalMessage>>,
        enqueued_at: Instant,
    },
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

impl DeviceCmd {
    fn enqueued_at(&self) -> Option<Instant> {
        match self {
            DeviceCmd::GetFeatures { enqueued_at, .. }
            | DeviceCmd::Connected { enqueued_at, .. }
            | DeviceCmd::Run { enqueued_at, .. } => Some(*enqueued_at),
            DeviceCmd::Shutdown { .. } => None,
        }
    }

    fn operation_name(&self) -> &'static str {
        match self {
            DeviceCmd::GetFeatures { .. } => "get_features",
            DeviceCmd::Connected { .. } => "connected",
            DeviceCmd::Run { .. } => "run",
            DeviceCmd::Shutdown { .. } => "shutdown",
        }
    }
}

/// Owns the engine and processes commands one at a time.
pub struct DeviceWorker {
    device_id: String,
    device: Device,
    cmd_rx: mpsc::Receiver<DeviceCmd>,
}

impl DeviceWorker {
    fn new(device_id: String, device: Device, cmd_rx: mpsc::Receiver<DeviceCmd>) -> Self {
        Self {
            device_id,
            device,
            cmd_rx,
        }
    }

    /// Blocking loop; ends on `Shutdown` or when every handle is dropped.
    fn run(mut self) {
        info!("device worker starting for {}", self.device_id);

        while let Some(cmd) = self.cmd_rx.blocking_recv() {
            if let Some(enqueued_at) = cmd.enqueued_at() {
                debug!(
                    "processing {} (queue wait {:?}, depth {})",
                    cmd.operation_name(),
                    enqueued_at.elapsed(),
                    self.cmd_rx.len()
                );
            }
            if !self.process_command(cmd) {
                break;
            }
        }

        self.device.close();
        info!("device worker shutting down for {}", self.device_id);
    }

    /// Returns `false` once the worker should stop.
    fn process_command(&mut self, cmd: DeviceCmd) -> bool {
        match cmd {
            DeviceCmd::GetFeatures { respond_to, .. } => {
                let result = self.device.features();
                if let Err(e) = &result {
                    error!("get_features failed: {}", e);
                }
                let _ = respond_to.send(result);
            }
            DeviceCmd::Connected { respond_to, .. } => {
                let _ = respond_to.send(self.handle_connected());
            }
            DeviceCmd::Run { op, respond_to, .. } => {
                let result = op(&mut self.device);
                if let Err(e) = &result {
                    error!("queued operation failed: {}", e);
                }
                let _ = respond_to.send(result);
            }
            DeviceCmd::Shutdown { respond_to } => {
                let _ = respond_to.send(());
                return false;
            }
        }
        true
    }

    fn handle_connected(&mut self) -> bool {
        if let Err(e) = self.device.connect() {
            warn!("liveness probe could not connect: {}", e);
            return false;
        }
        let alive = self.device.connected();
        if let Err(e) = self.device.disconnect() {
            warn!("closing after liveness probe: {}", e);
        }
        alive
    }
}

/// Handle for communicating with a device worker
#[derive(Clone, Debug)]
pub struct DeviceQueueHandle {
    device_id: String,
    cmd_tx: mpsc::Sender<DeviceCmd>,
}

impl DeviceQueueHandle {
    pub fn new(device_id: String, cmd_tx: mpsc::Sender<DeviceCmd>) -> Self {
        Self { device_id, cmd_tx }
    }

    async fn request<T>(&self, cmd: DeviceCmd, rx: oneshot::Receiver<T>) -> Result<T> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| anyhow!("device worker unavailable"))?;
        rx.await.map_err(|_| anyhow!("device worker channel closed"))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_features(&self) -> Result<Features> {
        let (tx, rx) = oneshot::channel();
        let cmd = DeviceCmd::GetFeatures {
            respond_to: tx,
            enqueued_at: Instant::now(),
        };
        Ok(self.request(cmd, rx).await??)
    }

    /// Open a connection, run the liveness probe, and close again.
    #[instrument(level = "debug", skip(self))]
    pub async fn connected(&self) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        let cmd = DeviceCmd::Connected {
            respond_to: tx,
            enqueued_at: Instant::now(),
        };
        self.request(cmd, rx).await
    }

    /// Run any engine operation on the worker, e.g. `|d| d.wipe()`.
    #[instrument(level = "debug", skip(self, op))]
    pub async fn run<F>(&self, op: F) -> Result<LogicalMessage>
    where
        F: FnOnce(&mut Device) -> crate::Result<LogicalMessage> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let cmd = DeviceCmd::Run {
            op: Box::new(op),
            respond_to: tx,
            enqueued_at: Instant::now(),
        };
        Ok(self.request(cmd, rx).await??)
    }

    /// Shutdown the device worker
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let cmd = DeviceCmd::Shutdown { respond_to: tx };
        timeout(SHUTDOWN_TIMEOUT, self.request(cmd, rx))
            .await
            .map_err(|_| anyhow!("shutdown timed out"))?
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

/// Factory for creating device workers and handles
pub struct DeviceQueueFactory;

impl DeviceQueueFactory {
    /// Move `device` onto a blocking worker thread and return a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_worker(device_id: String, device: Device) -> DeviceQueueHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(QUEUE_CHANNEL_SIZE);
        let worker = DeviceWorker::new(device_id.clone(), device, cmd_rx);
        tokio::task::spawn_blocking(move || worker.run());
        DeviceQueueHandle::new(device_id, cmd_tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DeviceType;

    #[test]
    fn shutdown_stops_the_worker() {
        tokio_test::block_on(async {
            let device = Device::new(DeviceType::Emulator).unwrap();
            let handle = DeviceQueueFactory::spawn_worker("emulator".into(), device);
            let other = handle.clone();

            handle.shutdown().await.unwrap();
            assert!(other.shutdown().await.is_err());
        });
    }
}
