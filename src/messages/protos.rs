//! Protobuf payloads exchanged with the device (proto2 wire format).

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Initialize {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Ping {
    #[prost(string, optional, tag = "1")]
    pub message: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(bool, optional, tag = "2")]
    pub button_protection: ::core::option::Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Success {
    #[prost(string, optional, tag = "1")]
    pub message: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Failure {
    #[prost(int32, optional, tag = "1")]
    pub code: ::core::option::Option<i32>,
    #[prost(string, optional, tag = "2")]
    pub message: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChangePin {
    #[prost(bool, optional, tag = "1")]
    pub remove: ::core::option::Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WipeDevice {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FirmwareErase {
    #[prost(uint32, optional, tag = "1")]
    pub length: ::core::option::Option<u32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FirmwareUpload {
    #[prost(bytes = "vec", required, tag = "1")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub hash: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetEntropy {
    #[prost(uint32, required, tag = "1")]
    pub size: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Entropy {
    #[prost(bytes = "vec", required, tag = "1")]
    pub entropy: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Features {
    #[prost(string, optional, tag = "1")]
    pub vendor: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(uint32, optional, tag = "2")]
    pub major_version: ::core::option::Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub minor_version: ::core::option::Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    pub patch_version: ::core::option::Option<u32>,
    #[prost(bool, optional, tag = "5")]
    pub bootloader_mode: ::core::option::Option<bool>,
    #[prost(string, optional, tag = "6")]
    pub device_id: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(bool, optional, tag = "7")]
    pub pin_protection: ::core::option::Option<bool>,
    #[prost(bool, optional, tag = "8")]
    pub passphrase_protection: ::core::option::Option<bool>,
    #[prost(string, optional, tag = "9")]
    pub language: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "10")]
    pub label: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(bool, optional, tag = "12")]
    pub initialized: ::core::option::Option<bool>,
    #[prost(bytes = "vec", optional, tag = "13")]
    pub revision: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    #[prost(bool, optional, tag = "18")]
    pub needs_backup: ::core::option::Option<bool>,
    #[prost(string, optional, tag = "20")]
    pub model: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "21")]
    pub fw_version_head: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PinMatrixRequest {
    #[prost(int32, optional, tag = "1")]
    pub r#type: ::core::option::Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PinMatrixAck {
    #[prost(string, required, tag = "1")]
    pub pin: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Cancel {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApplySettings {
    #[prost(string, optional, tag = "1")]
    pub language: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "2")]
    pub label: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(bool, optional, tag = "3")]
    pub use_passphrase: ::core::option::Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ButtonRequest {
    #[prost(int32, optional, tag = "1")]
    pub code: ::core::option::Option<i32>,
    #[prost(string, optional, tag = "2")]
    pub data: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ButtonAck {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BackupDevice {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EntropyRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EntropyAck {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub entropy: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PassphraseRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PassphraseAck {
    #[prost(string, required, tag = "1")]
    pub passphrase: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RecoveryDevice {
    #[prost(uint32, optional, tag = "1")]
    pub word_count: ::core::option::Option<u32>,
    #[prost(bool, optional, tag = "2")]
    pub passphrase_protection: ::core::option::Option<bool>,
    #[prost(bool, optional, tag = "3")]
    pub dry_run: ::core::option::Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WordRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WordAck {
    #[prost(string, required, tag = "1")]
    pub word: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetFeatures {}

/// Emulator-only: tells the firmware which physical button to pretend was pressed.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DebugLinkDecision {
    #[prost(int32, optional, tag = "1")]
    pub button: ::core::option::Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetMnemonic {
    #[prost(string, required, tag = "1")]
    pub mnemonic: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SkycoinAddress {
    #[prost(uint32, required, tag = "1")]
    pub address_n: u32,
    #[prost(uint32, optional, tag = "2")]
    pub start_index: ::core::option::Option<u32>,
    #[prost(bool, optional, tag = "3")]
    pub confirm_address: ::core::option::Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResponseSkycoinAddress {
    #[prost(string, repeated, tag = "1")]
    pub addresses: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SkycoinCheckMessageSignature {
    #[prost(string, required, tag = "1")]
    pub address: ::prost::alloc::string::String,
    #[prost(string, required, tag = "2")]
    pub message: ::prost::alloc::string::String,
    #[prost(string, required, tag = "3")]
    pub signature: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SkycoinSignMessage {
    #[prost(uint32, required, tag = "1")]
    pub address_n: u32,
    #[prost(string, required, tag = "2")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResponseSkycoinSignMessage {
    #[prost(string, required, tag = "1")]
    pub signed_message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GenerateMnemonic {
    #[prost(uint32, optional, tag = "1")]
    pub word_count: ::core::option::Option<u32>,
    #[prost(bool, optional, tag = "2")]
    pub passphrase_protection: ::core::option::Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionInput {
    #[prost(uint32, optional, tag = "1")]
    pub address_n: ::core::option::Option<u32>,
    #[prost(string, required, tag = "2")]
    pub hash_in: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionOutput {
    #[prost(uint32, optional, tag = "1")]
    pub address_index: ::core::option::Option<u32>,
    #[prost(string, required, tag = "2")]
    pub address: ::prost::alloc::string::String,
    #[prost(uint64, required, tag = "3")]
    pub coin: u64,
    #[prost(uint64, required, tag = "4")]
    pub hour: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionSign {
    #[prost(uint32, required, tag = "1")]
    pub nb_in: u32,
    #[prost(message, repeated, tag = "2")]
    pub transaction_in: ::prost::alloc::vec::Vec<TransactionInput>,
    #[prost(uint32, required, tag = "3")]
    pub nb_out: u32,
    #[prost(message, repeated, tag = "4")]
    pub transaction_out: ::prost::alloc::vec::Vec<TransactionOutput>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResponseTransactionSign {
    #[prost(string, repeated, tag = "1")]
    pub signatures: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
