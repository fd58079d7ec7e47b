mod common;

use common::{Event, Script};
use skywallet::messages::{Features, Success};
use skywallet::queue::DeviceQueueFactory;
use skywallet::{DeviceType, MessageKind, ProtocolError};

#[tokio::test]
async fn queued_calls_run_in_order_on_one_worker() {
    let script = Script::new();
    script
        .reply(&Features {
            label: Some("my wallet".into()),
            initialized: Some(true),
            ..Default::default()
        })
        .reply_kind(MessageKind::ButtonRequest)
        .reply(&Success {
            message: Some("Device wiped".into()),
        });
    let handle = DeviceQueueFactory::spawn_worker("emu".into(), script.device(DeviceType::Usb));

    let features = handle.get_features().await.unwrap();
    assert_eq!(features.label.as_deref(), Some("my wallet"));

    let reply = handle.run(|device| device.wipe()).await.unwrap();
    assert_eq!(reply.kind(), MessageKind::Success);

    assert_eq!(
        script.written_kinds(),
        vec![
            MessageKind::GetFeatures,
            MessageKind::WipeDevice,
            MessageKind::ButtonAck
        ]
    );
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn connected_check_opens_and_closes() {
    let script = Script::new();
    script
        .reply_kind(MessageKind::EntropyRequest)
        .reply(&Success { message: None });
    let handle = DeviceQueueFactory::spawn_worker("usb".into(), script.device(DeviceType::Usb));

    assert!(handle.connected().await.unwrap());
    assert_eq!(script.events().first(), Some(&Event::Open(1)));
    assert_eq!(script.events().last(), Some(&Event::Close(1)));
    assert_eq!(handle.device_id(), "usb");
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn engine_errors_come_back_typed() {
    let script = Script::new();
    let handle = DeviceQueueFactory::spawn_worker("usb".into(), script.device(DeviceType::Usb));

    let err = handle
        .run(|device| device.address_gen(0, 0, false))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProtocolError>(),
        Some(ProtocolError::Validation(_))
    ));
    assert!(script.events().is_empty());

    handle.shutdown().await.unwrap();
    assert!(handle.get_features().await.is_err(), "worker is gone");
}
