mod common;

use common::Script;
use sha2::{Digest, Sha256};
use skywallet::firmware::{Sequencer, UpdateState};
use skywallet::messages::{Failure, Features, FirmwareErase, FirmwareUpload, Success};
use skywallet::{DeviceType, MessageKind, ProtocolError, ValidationError};

fn features() -> Features {
    Features {
        vendor: Some("Skycoin Foundation".into()),
        bootloader_mode: Some(true),
        ..Default::default()
    }
}

fn failure(text: &str) -> Failure {
    Failure {
        code: Some(1),
        message: Some(text.to_owned()),
    }
}

fn ok() -> Success {
    Success { message: None }
}

#[test]
fn erase_failure_prevents_any_upload() {
    let script = Script::new();
    script.reply(&features()).reply(&failure("bad length"));
    let mut device = script.device(DeviceType::Usb);

    let err = device.firmware_upload(&[0u8; 128], [0; 32]).unwrap_err();
    assert!(matches!(err, ProtocolError::DeviceFailure(ref text) if text == "bad length"));
    assert_eq!(
        script.written_kinds(),
        vec![MessageKind::Initialize, MessageKind::FirmwareErase]
    );
    assert!(!device.is_open());
}

#[test]
fn successful_update_walks_every_state() {
    let payload = vec![0x5A; 700];
    let hash = [3u8; 32];
    let script = Script::new();
    script
        .reply(&features())
        .reply(&ok())
        .reply_kind(MessageKind::ButtonRequest)
        .reply(&ok());
    let mut device = script.device(DeviceType::Usb);

    let mut sequencer = Sequencer::new();
    sequencer.run(&mut device, &payload, hash).unwrap();

    assert_eq!(sequencer.state(), UpdateState::Confirmed);
    assert_eq!(
        sequencer.history(),
        &[
            UpdateState::Idle,
            UpdateState::Erasing,
            UpdateState::AwaitEraseResult,
            UpdateState::Uploading,
            UpdateState::AwaitButtonConfirm,
            UpdateState::Confirmed,
        ]
    );

    let written = script.written();
    let kinds: Vec<_> = written.iter().map(|m| m.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            MessageKind::Initialize,
            MessageKind::FirmwareErase,
            MessageKind::FirmwareUpload,
            MessageKind::ButtonAck,
        ]
    );
    let erase = written[1].decode::<FirmwareErase>().unwrap();
    assert_eq!(erase.length, Some(700));
    let upload = written[2].decode::<FirmwareUpload>().unwrap();
    assert_eq!(upload.payload, payload);
    assert_eq!(upload.hash, Some(hash.to_vec()));
    assert_eq!(script.opens(), 1);
}

#[test]
fn firmware_update_hashes_the_payload() {
    let payload = b"skywallet firmware image".to_vec();
    let script = Script::new();
    script
        .reply(&features())
        .reply(&ok())
        .reply_kind(MessageKind::ButtonRequest)
        .reply(&ok());
    let mut device = script.device(DeviceType::Usb);

    device.firmware_update(&payload).unwrap();

    let upload = script.written()[2].decode::<FirmwareUpload>().unwrap();
    assert_eq!(upload.hash, Some(Sha256::digest(&payload).to_vec()));
}

#[test]
fn emulator_cannot_be_flashed() {
    let script = Script::new();
    let mut device = script.device(DeviceType::Emulator);

    let err = device.firmware_upload(&[1, 2, 3], [0; 32]).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Validation(ValidationError::DeviceTypeEmulator)
    ));
    assert!(script.events().is_empty());
}

#[test]
fn upload_failure_reports_its_own_reason() {
    let script = Script::new();
    script
        .reply(&features())
        .reply(&Success {
            message: Some("Firmware erased".into()),
        })
        .reply(&failure("fingerprint mismatch"));
    let mut device = script.device(DeviceType::Usb);

    let mut sequencer = Sequencer::new();
    let err = sequencer.run(&mut device, &[9; 64], [0; 32]).unwrap_err();
    assert!(matches!(err, ProtocolError::DeviceFailure(ref text) if text == "fingerprint mismatch"));
    assert_eq!(sequencer.state(), UpdateState::Failed);
    assert!(!sequencer.history().contains(&UpdateState::AwaitButtonConfirm));
}

#[test]
fn rejected_confirmation_fails_the_update() {
    let script = Script::new();
    script
        .reply(&features())
        .reply(&ok())
        .reply_kind(MessageKind::ButtonRequest)
        .reply(&failure("Firmware update cancelled"));
    let mut device = script.device(DeviceType::Usb);

    let mut sequencer = Sequencer::new();
    let err = sequencer.run(&mut device, &[9; 64], [0; 32]).unwrap_err();
    assert!(
        matches!(err, ProtocolError::DeviceFailure(ref text) if text == "Firmware update cancelled")
    );
    assert_eq!(sequencer.state(), UpdateState::Failed);
}

#[test]
fn unexpected_erase_reply_is_reported() {
    let script = Script::new();
    script
        .reply(&features())
        .reply_kind(MessageKind::ButtonRequest);
    let mut device = script.device(DeviceType::Usb);

    let err = device.firmware_upload(&[0; 16], [0; 32]).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::UnexpectedResponse(MessageKind::ButtonRequest)
    ));
    assert_eq!(
        script.written_kinds(),
        vec![MessageKind::Initialize, MessageKind::FirmwareErase]
    );
}
