//! Frame codec: splits a logical message into fixed-size frames and
//! reassembles responses read one frame at a time.
//!
//! First frame:        `?` `#` `#` kind(u16 BE) length(u32 BE) data...
//! Continuation frame: `?` data...

use log::debug;

use crate::error::TransportError;
use crate::messages::{LogicalMessage, MessageKind};
use crate::transport::Transport;

pub const FRAME_SIZE: usize = 64;
const HEADER_SIZE: usize = 9;
const FIRST_CHUNK: usize = FRAME_SIZE - HEADER_SIZE;
const CONT_CHUNK: usize = FRAME_SIZE - 1;
/// Largest payload a header may announce; anything above is rejected unread.
pub const MAX_MESSAGE_LEN: usize = 2 * 1024 * 1024;
const MARKER: u8 = b'?';
const MAGIC: u8 = b'#';

pub type Frame = [u8; FRAME_SIZE];

/// Split `payload` into the frame sequence for one message of `kind`.
pub fn encode(kind: MessageKind, payload: &[u8]) -> Vec<Frame> {
    let mut frames = Vec::with_capacity(1 + payload.len().saturating_sub(FIRST_CHUNK) / CONT_CHUNK + 1);

    let mut first = [0u8; FRAME_SIZE];
    first[0] = MARKER;
    first[1] = MAGIC;
    first[2] = MAGIC;
    first[3..5].copy_from_slice(&kind.as_u16().to_be_bytes());
    first[5..9].copy_from_slice(&(payload.len() as u32).to_be_bytes());
    let first_chunk = payload.len().min(FIRST_CHUNK);
    first[HEADER_SIZE..HEADER_SIZE + first_chunk].copy_from_slice(&payload[..first_chunk]);
    frames.push(first);

    for chunk in payload[first_chunk..].chunks(CONT_CHUNK) {
        let mut cont = [0u8; FRAME_SIZE];
        cont[0] = MARKER;
        cont[1..1 + chunk.len()].copy_from_slice(chunk);
        frames.push(cont);
    }

    frames
}

/// Write every frame, failing on the first short or failed write.
pub fn write_frames(transport: &dyn Transport, frames: &[Frame]) -> Result<(), TransportError> {
    for (i, frame) in frames.iter().enumerate() {
        let written = transport.write_frame(frame)?;
        if written != FRAME_SIZE {
            return Err(TransportError::ShortWrite {
                expected: FRAME_SIZE,
                written,
            });
        }
        debug!("wire: wrote frame {}/{}", i + 1, frames.len());
    }
    Ok(())
}

fn parse_header(frame: &Frame) -> Result<(MessageKind, usize), TransportError> {
    if frame[0] != MARKER || frame[1] != MAGIC || frame[2] != MAGIC {
        return Err(TransportError::InvalidHeader(frame[0], frame[1], frame[2]));
    }
    let kind = u16::from_be_bytes([frame[3], frame[4]]);
    let length = u32::from_be_bytes([frame[5], frame[6], frame[7], frame[8]]) as usize;
    if length > MAX_MESSAGE_LEN {
        return Err(TransportError::Oversized {
            length,
            limit: MAX_MESSAGE_LEN,
        });
    }
    Ok((MessageKind::from_u16(kind), length))
}

/// Block until one complete message has been read from `transport`.
pub fn read_from(transport: &dyn Transport) -> Result<LogicalMessage, TransportError> {
    let mut frame = [0u8; FRAME_SIZE];
    read_exact_frame(transport, &mut frame)?;
    let (kind, length) = parse_header(&frame)?;
    debug!("wire: reading {} ({} bytes)", kind, length);

    let mut payload = Vec::with_capacity(length);
    let first_chunk = length.min(FIRST_CHUNK);
    payload.extend_from_slice(&frame[HEADER_SIZE..HEADER_SIZE + first_chunk]);

    while payload.len() < length {
        frame.fill(0);
        read_exact_frame(transport, &mut frame)?;
        if frame[0] != MARKER {
            return Err(TransportError::InvalidHeader(frame[0], frame[1], frame[2]));
        }
        let take = (length - payload.len()).min(CONT_CHUNK);
        payload.extend_from_slice(&frame[1..1 + take]);
    }

    Ok(LogicalMessage::new(kind, payload))
}

fn read_exact_frame(transport: &dyn Transport, frame: &mut Frame) -> Result<(), TransportError> {
    let got = transport.read_frame(frame)?;
    if got != FRAME_SIZE {
        return Err(TransportError::Truncated {
            expected: FRAME_SIZE,
            got,
        });
    }
    Ok(())
}

/// Reassemble every message contained in an already-captured frame sequence.
pub fn decode_frames(frames: &[Frame]) -> Result<Vec<LogicalMessage>, TransportError> {
    let mut out = Vec::new();
    let mut iter = frames.iter();
    while let Some(first) = iter.next() {
        let (kind, length) = parse_header(first)?;
        let mut payload = Vec::with_capacity(length);
        payload.extend_from_slice(&first[HEADER_SIZE..HEADER_SIZE + length.min(FIRST_CHUNK)]);
        while payload.len() < length {
            let cont = iter.next().ok_or(TransportError::Truncated {
                expected: length,
                got: payload.len(),
            })?;
            let take = (length - payload.len()).min(CONT_CHUNK);
            payload.extend_from_slice(&cont[1..1 + take]);
        }
        out.push(LogicalMessage::new(kind, payload));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Loopback {
        frames: Mutex<VecDeque<Frame>>,
    }

    impl Transport for Loopback {
        fn write_frame(&self, frame: &Frame) -> Result<usize, TransportError> {
            self.frames.lock().unwrap().push_back(*frame);
            Ok(FRAME_SIZE)
        }

        fn read_frame(&self, frame: &mut Frame) -> Result<usize, TransportError> {
            let next = self
                .frames
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(TransportError::Closed)?;
            *frame = next;
            Ok(FRAME_SIZE)
        }

        fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[test]
    fn header_layout() {
        let frames = encode(MessageKind::ButtonAck, &[]);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..9], &[b'?', b'#', b'#', 0, 27, 0, 0, 0, 0]);
    }

    #[test]
    fn payload_boundaries() {
        assert_eq!(encode(MessageKind::Success, &[1; 55]).len(), 1);
        assert_eq!(encode(MessageKind::Success, &[1; 56]).len(), 2);
        assert_eq!(encode(MessageKind::Success, &[1; 55 + 63]).len(), 2);
        assert_eq!(encode(MessageKind::Success, &[1; 55 + 64]).len(), 3);
    }

    #[test]
    fn read_reassembles_multi_frame_message() {
        let payload: Vec<u8> = (0..200u8).collect();
        let link = Loopback {
            frames: Mutex::new(VecDeque::new()),
        };
        write_frames(&link, &encode(MessageKind::Entropy, &payload)).unwrap();
        let msg = read_from(&link).unwrap();
        assert_eq!(msg.kind(), MessageKind::Entropy);
        assert_eq!(msg.payload(), payload.as_slice());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut frame = [0u8; FRAME_SIZE];
        frame[0] = b'?';
        frame[1] = b'x';
        let link = Loopback {
            frames: Mutex::new(VecDeque::from(vec![frame])),
        };
        assert!(matches!(
            read_from(&link),
            Err(TransportError::InvalidHeader(b'?', b'x', 0))
        ));
    }

    #[test]
    fn announced_length_is_bounded() {
        let mut frame = encode(MessageKind::Entropy, &[])[0];
        frame[5..9].copy_from_slice(&u32::MAX.to_be_bytes());
        let link = Loopback {
            frames: Mutex::new(VecDeque::from(vec![frame])),
        };
        assert!(matches!(
            read_from(&link),
            Err(TransportError::Oversized { length, limit: MAX_MESSAGE_LEN }) if length == u32::MAX as usize
        ));
        assert!(matches!(
            decode_frames(&[frame]),
            Err(TransportError::Oversized { .. })
        ));
    }

    #[test]
    fn decode_frames_splits_back_to_back_messages() {
        let mut frames = encode(MessageKind::ButtonAck, &[]);
        frames.extend(encode(MessageKind::EntropyAck, &[9; 100]));
        let msgs = decode_frames(&frames).unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].kind(), MessageKind::ButtonAck);
        assert_eq!(msgs[1].payload().len(), 100);
    }
}
