//! Request builders (typed arguments → wire frames) and response decoders.

use rand::RngCore;

use super::{protos, LogicalMessage, WireMessage};
use crate::engine::ButtonPressKind;
use crate::error::Result;
use crate::wire::{self, Frame};

fn frames<M: WireMessage>(msg: &M) -> Vec<Frame> {
    wire::encode(M::KIND, &msg.encode_to_vec())
}

pub fn initialize() -> Vec<Frame> {
    frames(&protos::Initialize {})
}

/// Liveness probe used by `Device::connected`.
pub fn connected() -> Vec<Frame> {
    frames(&protos::Ping {
        message: Some("ping".to_owned()),
        button_protection: Some(false),
    })
}

pub fn address_gen(address_n: u32, start_index: u32, confirm_address: bool) -> Vec<Frame> {
    frames(&protos::SkycoinAddress {
        address_n,
        start_index: Some(start_index),
        confirm_address: Some(confirm_address),
    })
}

pub fn apply_settings(use_passphrase: bool, label: &str, language: &str) -> Vec<Frame> {
    frames(&protos::ApplySettings {
        language: (!language.is_empty()).then(|| language.to_owned()),
        label: (!label.is_empty()).then(|| label.to_owned()),
        use_passphrase: Some(use_passphrase),
    })
}

pub fn backup() -> Vec<Frame> {
    frames(&protos::BackupDevice {})
}

pub fn cancel() -> Vec<Frame> {
    frames(&protos::Cancel {})
}

pub fn check_message_signature(message: &str, signature: &str, address: &str) -> Vec<Frame> {
    frames(&protos::SkycoinCheckMessageSignature {
        address: address.to_owned(),
        message: message.to_owned(),
        signature: signature.to_owned(),
    })
}

pub fn change_pin(remove_pin: bool) -> Vec<Frame> {
    frames(&protos::ChangePin {
        remove: Some(remove_pin),
    })
}

/// EntropyAck carrying `size` fresh random bytes from the host RNG.
pub fn entropy_ack(size: usize) -> Vec<Frame> {
    let mut entropy = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut entropy);
    frames(&protos::EntropyAck {
        entropy: Some(entropy),
    })
}

pub fn firmware_erase(payload: &[u8]) -> Vec<Frame> {
    frames(&protos::FirmwareErase {
        length: Some(payload.len() as u32),
    })
}

pub fn firmware_upload(payload: &[u8], hash: [u8; 32]) -> Vec<Frame> {
    frames(&protos::FirmwareUpload {
        payload: payload.to_vec(),
        hash: Some(hash.to_vec()),
    })
}

pub fn get_entropy(size: u32) -> Vec<Frame> {
    frames(&protos::GetEntropy { size })
}

pub fn get_features() -> Vec<Frame> {
    frames(&protos::GetFeatures {})
}

pub fn generate_mnemonic(word_count: u32, use_passphrase: bool) -> Vec<Frame> {
    frames(&protos::GenerateMnemonic {
        word_count: Some(word_count),
        passphrase_protection: Some(use_passphrase),
    })
}

pub fn recovery(word_count: u32, use_passphrase: bool, dry_run: bool) -> Vec<Frame> {
    frames(&protos::RecoveryDevice {
        word_count: Some(word_count),
        passphrase_protection: Some(use_passphrase),
        dry_run: Some(dry_run),
    })
}

pub fn set_mnemonic(mnemonic: &str) -> Vec<Frame> {
    frames(&protos::SetMnemonic {
        mnemonic: mnemonic.to_owned(),
    })
}

pub fn transaction_sign(
    inputs: &[protos::TransactionInput],
    outputs: &[protos::TransactionOutput],
) -> Vec<Frame> {
    frames(&protos::TransactionSign {
        nb_in: inputs.len() as u32,
        transaction_in: inputs.to_vec(),
        nb_out: outputs.len() as u32,
        transaction_out: outputs.to_vec(),
    })
}

pub fn sign_message(address_index: u32, message: &str) -> Vec<Frame> {
    frames(&protos::SkycoinSignMessage {
        address_n: address_index,
        message: message.to_owned(),
    })
}

pub fn wipe() -> Vec<Frame> {
    frames(&protos::WipeDevice {})
}

pub fn pin_matrix_ack(pin: &str) -> Vec<Frame> {
    frames(&protos::PinMatrixAck {
        pin: pin.to_owned(),
    })
}

pub fn word_ack(word: &str) -> Vec<Frame> {
    frames(&protos::WordAck {
        word: word.to_owned(),
    })
}

pub fn passphrase_ack(passphrase: &str) -> Vec<Frame> {
    frames(&protos::PassphraseAck {
        passphrase: passphrase.to_owned(),
    })
}

pub fn button_ack() -> Vec<Frame> {
    frames(&protos::ButtonAck {})
}

pub fn simulate_button_press(kind: ButtonPressKind) -> Vec<Frame> {
    frames(&protos::DebugLinkDecision {
        button: Some(kind as i32),
    })
}

/// Human-readable reason carried by a `Failure` message.
pub fn decode_failure(msg: &LogicalMessage) -> Result<String> {
    let failure = msg.decode::<protos::Failure>()?;
    Ok(failure.message.unwrap_or_default())
}

pub fn decode_entropy(msg: &LogicalMessage) -> Result<Vec<u8>> {
    Ok(msg.decode::<protos::Entropy>()?.entropy)
}

pub fn decode_features(msg: &LogicalMessage) -> Result<protos::Features> {
    msg.decode::<protos::Features>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageKind;

    #[test]
    fn entropy_ack_carries_requested_size() {
        let frames = entropy_ack(32);
        let msgs = wire::decode_frames(&frames).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].kind(), MessageKind::EntropyAck);
        let ack = msgs[0].decode::<protos::EntropyAck>().unwrap();
        assert_eq!(ack.entropy.map(|e| e.len()), Some(32));
    }

    #[test]
    fn empty_label_is_left_unset() {
        let msgs = wire::decode_frames(&apply_settings(true, "", "english")).unwrap();
        let settings = msgs[0].decode::<protos::ApplySettings>().unwrap();
        assert_eq!(settings.label, None);
        assert_eq!(settings.language.as_deref(), Some("english"));
        assert_eq!(settings.use_passphrase, Some(true));
    }

    #[test]
    fn large_firmware_spans_many_frames() {
        let payload = vec![0xAB; 1000];
        let frames = firmware_upload(&payload, [7; 32]);
        assert!(frames.len() > 10);
        let msgs = wire::decode_frames(&frames).unwrap();
        let upload = msgs[0].decode::<protos::FirmwareUpload>().unwrap();
        assert_eq!(upload.payload, payload);
        assert_eq!(upload.hash, Some(vec![7; 32]));
    }
}
