#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use skywallet::messages::WireMessage;
use skywallet::wire::{self, Frame, FRAME_SIZE};
use skywallet::{
    Device, DeviceDriver, DeviceInfo, DeviceType, EngineConfig, LogicalMessage, MessageKind,
    Transport, TransportError, TransportHandle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(usize),
    Close(usize),
    /// First frame of a message written on connection `.0`.
    Write(usize, MessageKind),
}

#[derive(Default)]
struct State {
    replies: VecDeque<Frame>,
    written: Vec<Frame>,
    events: Vec<Event>,
    opens: usize,
    /// Reads on an exhausted script wait for `close` instead of failing.
    hang_when_empty: bool,
    /// Writes of a message of this kind are reported as zero bytes written.
    refuse_writes_of: Option<MessageKind>,
    refusing: bool,
}

/// Scripted device shared between a test and the driver it hands to the engine.
#[derive(Clone, Default)]
pub struct Script {
    state: Arc<Mutex<State>>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply the device will send, in order.
    pub fn reply<M: WireMessage>(&self, msg: &M) -> &Self {
        self.reply_message(LogicalMessage::from_proto(msg))
    }

    pub fn reply_kind(&self, kind: MessageKind) -> &Self {
        self.reply_message(LogicalMessage::new(kind, Vec::new()))
    }

    pub fn reply_message(&self, msg: LogicalMessage) -> &Self {
        let frames = wire::encode(msg.kind(), msg.payload());
        self.state.lock().unwrap().replies.extend(frames);
        self
    }

    /// Once the queued replies run out, block reads until the connection is closed.
    pub fn hang_when_empty(&self) -> &Self {
        self.state.lock().unwrap().hang_when_empty = true;
        self
    }

    /// Fail every frame of any message of `kind` the engine writes.
    pub fn refuse_writes_of(&self, kind: MessageKind) -> &Self {
        self.state.lock().unwrap().refuse_writes_of = Some(kind);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub fn pending_reply_frames(&self) -> usize {
        self.state.lock().unwrap().replies.len()
    }

    /// Every message the engine wrote, across all connections.
    pub fn written(&self) -> Vec<LogicalMessage> {
        let frames = self.state.lock().unwrap().written.clone();
        wire::decode_frames(&frames).unwrap()
    }

    pub fn written_kinds(&self) -> Vec<MessageKind> {
        self.written().iter().map(LogicalMessage::kind).collect()
    }

    pub fn driver(&self, device_type: DeviceType) -> Box<dyn DeviceDriver> {
        Box::new(ScriptedDriver {
            device_type,
            state: self.state.clone(),
        })
    }

    pub fn device(&self, device_type: DeviceType) -> Device {
        let config = EngineConfig {
            device_type,
            pin_matrix_ack_delay_ms: 0,
            ..EngineConfig::default()
        };
        Device::with_driver(self.driver(device_type), config)
    }

    pub fn device_with(&self, config: EngineConfig) -> Device {
        Device::with_driver(self.driver(config.device_type), config)
    }
}

struct ScriptedDriver {
    device_type: DeviceType,
    state: Arc<Mutex<State>>,
}

impl DeviceDriver for ScriptedDriver {
    fn device_type(&self) -> DeviceType {
        self.device_type
    }

    fn open(&self) -> Result<TransportHandle, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.opens += 1;
        let id = state.opens;
        state.events.push(Event::Open(id));
        Ok(Arc::new(ScriptedTransport {
            id,
            state: self.state.clone(),
            closed: AtomicBool::new(false),
        }))
    }

    fn enumerate(&self) -> Result<Vec<DeviceInfo>, TransportError> {
        Ok(vec![DeviceInfo::new(
            "scripted".into(),
            0x313a,
            0x0001,
            None,
            Some("Skywallet".into()),
            None,
        )])
    }
}

struct ScriptedTransport {
    id: usize,
    state: Arc<Mutex<State>>,
    closed: AtomicBool,
}

impl Transport for ScriptedTransport {
    fn write_frame(&self, frame: &Frame) -> Result<usize, TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        let mut state = self.state.lock().unwrap();
        if frame[1] == b'#' && frame[2] == b'#' {
            let kind = MessageKind::from_u16(u16::from_be_bytes([frame[3], frame[4]]));
            state.refusing = state.refuse_writes_of == Some(kind);
            if !state.refusing {
                state.events.push(Event::Write(self.id, kind));
            }
        }
        if state.refusing {
            return Ok(0);
        }
        state.written.push(*frame);
        Ok(FRAME_SIZE)
    }

    fn read_frame(&self, frame: &mut Frame) -> Result<usize, TransportError> {
        loop {
            if self.closed.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            let mut state = self.state.lock().unwrap();
            if let Some(next) = state.replies.pop_front() {
                *frame = next;
                return Ok(FRAME_SIZE);
            }
            if !state.hang_when_empty {
                return Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "script exhausted",
                )));
            }
            drop(state);
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn close(&self) -> Result<(), TransportError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.lock().unwrap().events.push(Event::Close(self.id));
        }
        Ok(())
    }
}
