pub mod builders;
mod macros;
mod protos;

pub use protos::*;

use core::fmt;
use macros::wire_messages;

use crate::error::{ProtocolError, Result};

/// A protobuf payload type that has a fixed kind tag on the wire.
pub trait WireMessage: prost::Message + Default {
    const KIND: MessageKind;
}

wire_messages!(
    // Core device messages
    Initialize = 0,
    Ping = 1,
    Success = 2,
    Failure = 3,
    GetFeatures = 55,
    Features = 17,

    // Device management
    ChangePin = 4,
    WipeDevice = 5,
    ApplySettings = 25,
    BackupDevice = 34,

    // Firmware and bootloader
    FirmwareErase = 6,
    FirmwareUpload = 7,

    // Entropy and random
    GetEntropy = 9,
    Entropy = 10,
    EntropyRequest = 35,
    EntropyAck = 36,

    // Recovery and setup
    RecoveryDevice = 45,
    WordRequest = 46,
    WordAck = 47,
    SetMnemonic = 113,
    GenerateMnemonic = 119,

    // PIN and passphrase
    PinMatrixRequest = 18,
    PinMatrixAck = 19,
    PassphraseRequest = 41,
    PassphraseAck = 42,

    // User interaction
    ButtonRequest = 26,
    ButtonAck = 27,
    Cancel = 20,

    // Skycoin-specific messages
    SkycoinAddress = 114,
    ResponseSkycoinAddress = 115,
    SkycoinCheckMessageSignature = 116,
    SkycoinSignMessage = 117,
    ResponseSkycoinSignMessage = 118,
    TransactionSign = 120,
    ResponseTransactionSign = 121,

    // Emulator debug link
    DebugLinkDecision = 100,
);

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Unknown(id) => write!(f, "Unknown({id})"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl From<u16> for MessageKind {
    fn from(value: u16) -> Self {
        MessageKind::from_u16(value)
    }
}

/// One reassembled protocol message: a kind tag plus its raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalMessage {
    kind: MessageKind,
    payload: Vec<u8>,
}

impl LogicalMessage {
    pub fn new(kind: MessageKind, payload: Vec<u8>) -> Self {
        Self { kind, payload }
    }

    /// Encode a typed payload under its own kind tag.
    pub fn from_proto<M: WireMessage>(msg: &M) -> Self {
        Self::new(M::KIND, msg.encode_to_vec())
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn is(&self, kind: MessageKind) -> bool {
        self.kind == kind
    }

    /// Decode the payload as `M`, refusing if the kind tags disagree.
    pub fn decode<M: WireMessage>(&self) -> Result<M> {
        if self.kind != M::KIND {
            return Err(ProtocolError::UnexpectedResponse(self.kind));
        }
        Ok(M::decode(self.payload.as_slice())?)
    }

    /// Turn a `Failure` answer into `DeviceFailure`, passing everything else through.
    pub fn into_result(self) -> Result<Self> {
        if self.kind == MessageKind::Failure {
            return Err(ProtocolError::DeviceFailure(builders::decode_failure(&self)?));
        }
        Ok(self)
    }
}
