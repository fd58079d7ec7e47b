//! The protocol engine: one connection per operation, control-message
//! interleaving, and the public operation catalog.

pub(crate) mod interleave;
mod session;

pub use session::AbortHandle;
pub(crate) use session::Session;

use std::thread;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, instrument, warn};

use crate::config::EngineConfig;
use crate::driver::{new_driver, DeviceDriver, DeviceInfo, DeviceType};
use crate::entropy::{self, EntropySink, EntropyTarget};
use crate::error::{ProtocolError, Result, TransportError, ValidationError};
use crate::firmware::Sequencer;
use crate::messages::{
    builders, Features, LogicalMessage, MessageKind, TransactionInput, TransactionOutput,
};
use crate::wire::{self, Frame};
use interleave::InterleaveConfig;
use session::Slot;

/// Button the emulator presses on its own after each ButtonAck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ButtonPressKind {
    Left = 0,
    Right = 1,
    Both = 2,
    None = 3,
}

/// Host-side handle on one hardware wallet.
///
/// Calls must be serialized by the caller; `queue::DeviceQueueFactory` does
/// that for async hosts.
pub struct Device {
    driver: Box<dyn DeviceDriver>,
    conn: Slot,
    config: EngineConfig,
    auto_press: Option<ButtonPressKind>,
}

impl Device {
    pub fn new(device_type: DeviceType) -> Result<Self> {
        Self::with_config(EngineConfig::for_device(device_type))
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        let driver = new_driver(&config)?;
        Ok(Self::with_driver(driver, config))
    }

    pub fn with_driver(driver: Box<dyn DeviceDriver>, config: EngineConfig) -> Self {
        Self {
            driver,
            conn: Slot::default(),
            config,
            auto_press: None,
        }
    }

    pub fn device_type(&self) -> DeviceType {
        self.driver.device_type()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Open a connection, closing any connection held before.
    pub fn connect(&mut self) -> Result<()> {
        session::reopen(&*self.driver, &mut self.conn)
    }

    pub fn disconnect(&mut self) -> Result<()> {
        let handle = self.conn.take().ok_or(TransportError::NotConnected)?;
        Ok(handle.close()?)
    }

    /// A handle that can close this engine's connection from another thread.
    ///
    /// It stays valid across operations and always targets the connection
    /// open at the time `abort` is called.
    pub fn abort_handle(&self) -> AbortHandle {
        self.conn.abort_handle()
    }

    pub(crate) fn session(&mut self) -> Result<Session<'_>> {
        Session::open(&*self.driver, &mut self.conn)
    }

    pub(crate) fn interleave_config(&self) -> InterleaveConfig {
        InterleaveConfig {
            button: self.auto_press,
            entropy_ack_size: self.config.entropy_ack_size,
            max_control_rounds: self.config.max_control_rounds,
        }
    }

    fn exchange(&mut self, frames: Vec<Frame>) -> Result<LogicalMessage> {
        self.session()?.exchange(&frames)
    }

    /// Exchange `frames`; a ButtonRequest answer is finished by a fresh `button_ack`.
    fn exchange_confirmed(&mut self, frames: Vec<Frame>) -> Result<LogicalMessage> {
        let session = self.session()?;
        let reply = session.exchange(&frames)?;
        if !reply.is(MessageKind::ButtonRequest) {
            return Ok(reply);
        }
        session.close();
        debug!("device asked for confirmation");
        self.button_ack()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn address_gen(
        &mut self,
        address_n: u32,
        start_index: u32,
        confirm_address: bool,
    ) -> Result<LogicalMessage> {
        if address_n == 0 {
            return Err(ValidationError::AddressNZero.into());
        }
        self.exchange(builders::address_gen(address_n, start_index, confirm_address))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn apply_settings(
        &mut self,
        use_passphrase: Option<bool>,
        label: &str,
        language: &str,
    ) -> Result<LogicalMessage> {
        let use_passphrase = use_passphrase.ok_or(ValidationError::UsePassphraseNil)?;
        self.exchange(builders::apply_settings(use_passphrase, label, language))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn backup(&mut self) -> Result<LogicalMessage> {
        self.exchange_confirmed(builders::backup())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn cancel(&mut self) -> Result<LogicalMessage> {
        self.exchange(builders::cancel())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn check_message_signature(
        &mut self,
        message: &str,
        signature: &str,
        address: &str,
    ) -> Result<LogicalMessage> {
        self.exchange(builders::check_message_signature(message, signature, address))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn change_pin(&mut self, remove_pin: Option<bool>) -> Result<LogicalMessage> {
        let remove_pin = remove_pin.ok_or(ValidationError::RemovePinNil)?;
        self.exchange_confirmed(builders::change_pin(remove_pin))
    }

    /// Probe the already open connection with a Ping.
    ///
    /// Leading EntropyRequests are answered; the result is whether the final
    /// answer is Success. Never fails: any error reads as `false`.
    #[instrument(level = "debug", skip(self))]
    pub fn connected(&self) -> bool {
        let Some(transport) = self.conn.get() else {
            debug!("no open connection to probe");
            return false;
        };
        let probe = || -> Result<bool> {
            wire::write_frames(transport, &builders::connected())?;
            let mut reply = wire::read_from(transport)?;
            let mut rounds = 0;
            while reply.is(MessageKind::EntropyRequest) {
                if rounds >= self.config.max_control_rounds {
                    return Err(TransportError::ControlFlood(rounds).into());
                }
                reply = interleave::service_entropy_request(transport, self.config.entropy_ack_size)?;
                rounds += 1;
            }
            Ok(reply.is(MessageKind::Success))
        };
        match probe() {
            Ok(alive) => alive,
            Err(e) => {
                debug!("liveness probe failed: {}", e);
                false
            }
        }
    }

    /// Whether the driver can see at least one device.
    pub fn available(&self) -> bool {
        match self.driver.enumerate() {
            Ok(infos) => !infos.is_empty(),
            Err(e) => {
                error!("enumerating devices failed: {}", e);
                false
            }
        }
    }

    /// Erase the firmware and upload `payload`, which must hash to `hash`.
    #[instrument(level = "info", skip(self, payload, hash), fields(len = payload.len()))]
    pub fn firmware_upload(&mut self, payload: &[u8], hash: [u8; 32]) -> Result<()> {
        Sequencer::new().run(self, payload, hash)
    }

    /// `firmware_upload` with the SHA-256 of `payload` computed here.
    pub fn firmware_update(&mut self, payload: &[u8]) -> Result<()> {
        let hash: [u8; 32] = Sha256::digest(payload).into();
        info!("firmware hash {}", hex::encode(hash));
        self.firmware_upload(payload, hash)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn get_features(&mut self) -> Result<LogicalMessage> {
        self.exchange(builders::get_features())
    }

    /// Decoded `Features`, with a Failure answer turned into an error.
    pub fn features(&mut self) -> Result<Features> {
        let reply = self.get_features()?.into_result()?;
        builders::decode_features(&reply)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn generate_mnemonic(
        &mut self,
        word_count: u32,
        use_passphrase: bool,
    ) -> Result<LogicalMessage> {
        check_word_count(word_count)?;
        self.exchange_confirmed(builders::generate_mnemonic(word_count, use_passphrase))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn recovery(
        &mut self,
        word_count: u32,
        use_passphrase: bool,
        dry_run: bool,
    ) -> Result<LogicalMessage> {
        check_word_count(word_count)?;
        self.exchange_confirmed(builders::recovery(word_count, use_passphrase, dry_run))
    }

    #[instrument(level = "debug", skip_all)]
    pub fn set_mnemonic(&mut self, mnemonic: &str) -> Result<LogicalMessage> {
        self.exchange_confirmed(builders::set_mnemonic(mnemonic))
    }

    #[instrument(level = "debug", skip_all, fields(inputs = inputs.len(), outputs = outputs.len()))]
    pub fn transaction_sign(
        &mut self,
        inputs: &[TransactionInput],
        outputs: &[TransactionOutput],
    ) -> Result<LogicalMessage> {
        self.exchange(builders::transaction_sign(inputs, outputs))
    }

    #[instrument(level = "debug", skip(self, message))]
    pub fn sign_message(&mut self, address_index: u32, message: &str) -> Result<LogicalMessage> {
        self.exchange_confirmed(builders::sign_message(address_index, message))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn wipe(&mut self) -> Result<LogicalMessage> {
        self.exchange_confirmed(builders::wipe())
    }

    /// Send the PIN positions typed on the matrix, after the configured settle delay.
    #[instrument(level = "debug", skip_all)]
    pub fn pin_matrix_ack(&mut self, pin: &str) -> Result<LogicalMessage> {
        thread::sleep(self.config.pin_matrix_ack_delay());
        self.exchange(builders::pin_matrix_ack(pin))
    }

    #[instrument(level = "debug", skip_all)]
    pub fn word_ack(&mut self, word: &str) -> Result<LogicalMessage> {
        self.exchange(builders::word_ack(word))
    }

    #[instrument(level = "debug", skip_all)]
    pub fn passphrase_ack(&mut self, passphrase: &str) -> Result<LogicalMessage> {
        self.exchange(builders::passphrase_ack(passphrase))
    }

    /// Acknowledge a pending ButtonRequest on a fresh connection and follow
    /// the device until it gives a final answer.
    #[instrument(level = "debug", skip(self))]
    pub fn button_ack(&mut self) -> Result<LogicalMessage> {
        let config = self.interleave_config();
        let session = self.session()?;
        let transport = session.transport()?;
        interleave::acknowledge_button(transport, config)?;
        let reply = session.read()?;
        interleave::drive(transport, reply, config)
    }

    /// Enable or disable the emulator's automatic button press.
    ///
    /// Only an emulator engine records the setting; on any other device
    /// type this is a no-op.
    pub fn set_auto_press_button(&mut self, enabled: bool, kind: ButtonPressKind) -> Result<()> {
        if self.device_type() != DeviceType::Emulator {
            return Ok(());
        }
        if !enabled {
            self.auto_press = None;
            return Ok(());
        }
        if kind == ButtonPressKind::None {
            return Err(ValidationError::InvalidButtonKind.into());
        }
        self.auto_press = Some(kind);
        Ok(())
    }

    pub fn auto_press_button(&self) -> Option<ButtonPressKind> {
        self.auto_press
    }

    /// Drop any open connection and release the driver's bus context.
    pub fn close(&mut self) {
        session::release(&mut self.conn);
        self.driver.close();
    }

    pub fn usb_info(&mut self) -> Result<Vec<DeviceInfo>> {
        if self.device_type() == DeviceType::Usb {
            self.connect()?;
            self.disconnect()?;
        }
        Ok(self.driver.enumerate()?)
    }

    /// Stream `total` bytes of device entropy into `sink`, one connection for the whole run.
    pub fn stream_entropy<F>(&mut self, total: u32, sink: &mut dyn EntropySink, builder: F) -> Result<()>
    where
        F: Fn(u32) -> Vec<Frame>,
    {
        entropy::stream(self, total, sink, builder)
    }

    /// Save `total` bytes of device entropy to `target` (`"-"` for stdout).
    #[instrument(level = "info", skip(self, builder))]
    pub fn save_device_entropy<F>(&mut self, target: &str, total: u32, builder: F) -> Result<()>
    where
        F: Fn(u32) -> Vec<Frame>,
    {
        let target = EntropyTarget::parse(target);
        if let EntropyTarget::File(path) = &target {
            info!("saving entropy to {}", path.display());
        }
        let mut sink = target.open().map_err(ProtocolError::Sink)?;
        let result = self.stream_entropy(total, sink.as_mut(), builder);
        if let Err(e) = &result {
            warn!("entropy stream failed: {}", e);
        }
        result
    }
}

fn check_word_count(word_count: u32) -> Result<()> {
    match word_count {
        12 | 24 => Ok(()),
        other => Err(ValidationError::InvalidWordCount(other).into()),
    }
}
