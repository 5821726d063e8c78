//! Wire framing: a big-endian `u32` payload length followed by a
//! MessagePack map of that many bytes.
//!
//! [`FrameCodec`] only splits the byte stream into payloads so the
//! engine can classify each one with [`decode_frame`]. [`MessageCodec`]
//! layers typed decoding on top for peers that only speak known
//! messages.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::protocol::{MAX_PAYLOAD_SIZE, Message, RawEnvelope};

const HEADER_LEN: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("payload too large: {0} bytes (max {MAX_PAYLOAD_SIZE})")]
    PayloadTooLarge(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("MessagePack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("MessagePack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

fn check_len(len: usize) -> Result<usize, CodecError> {
    if len > MAX_PAYLOAD_SIZE {
        Err(CodecError::PayloadTooLarge(len))
    } else {
        Ok(len)
    }
}

/// Splits a byte stream into raw payloads; encodes [`Message`]s.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Payload length once its header has been consumed.
    awaiting: Option<usize>,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, CodecError> {
        let len = match self.awaiting {
            Some(len) => len,
            None if src.len() < HEADER_LEN => return Ok(None),
            None => {
                let len = check_len(src.get_u32() as usize)?;
                self.awaiting = Some(len);
                len
            }
        };
        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }
        self.awaiting = None;
        Ok(Some(src.split_to(len)))
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), CodecError> {
        let payload = rmp_serde::to_vec_named(&item)?;
        let len = check_len(payload.len())?;
        dst.reserve(HEADER_LEN + len);
        dst.put_u32(len as u32);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}

/// [`FrameCodec`] plus strict decoding: any frame that is not a known
/// [`Message`] is an error.
///
/// Used by the client, which never needs the unknown-type fallback.
#[derive(Debug, Default)]
pub struct MessageCodec {
    frames: FrameCodec,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, CodecError> {
        match self.frames.decode(src)? {
            Some(payload) => Ok(Some(rmp_serde::from_slice(&payload)?)),
            None => Ok(None),
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), CodecError> {
        self.frames.encode(item, dst)
    }
}

/// What a raw payload turned out to be.
#[derive(Debug)]
pub enum Decoded {
    Message(Message),
    /// A well-formed map with a `type` this engine does not know. The
    /// envelope keeps the id for the error response.
    UnknownType(RawEnvelope),
    /// Not even `{type, id}` could be read, or a known type carried a
    /// body that does not decode (an out-of-range rotation, say).
    Malformed(rmp_serde::decode::Error),
}

/// Classify one payload: a known message, else an envelope with an
/// unknown tag, else malformed.
pub fn decode_frame(payload: &[u8]) -> Decoded {
    let err = match rmp_serde::from_slice::<Message>(payload) {
        Ok(msg) => return Decoded::Message(msg),
        Err(e) => e,
    };
    match rmp_serde::from_slice::<RawEnvelope>(payload) {
        Ok(envelope) if !envelope.is_known_type() => Decoded::UnknownType(envelope),
        _ => Decoded::Malformed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decor::config::DecorConfig;
    use crate::decor::edge::Size;
    use crate::ipc::protocol::{PROTOCOL_VERSION, Role};

    fn encoded(msgs: &[Message]) -> BytesMut {
        let mut codec = MessageCodec::new();
        let mut buf = BytesMut::new();
        for msg in msgs {
            codec.encode(msg.clone(), &mut buf).unwrap();
        }
        buf
    }

    #[test]
    fn hello_survives_the_wire() {
        let hello = Message::Hello {
            id: 0,
            version: PROTOCOL_VERSION,
            role: Role::Platform,
        };
        let mut buf = encoded(std::slice::from_ref(&hello));
        assert_eq!(MessageCodec::new().decode(&mut buf).unwrap(), Some(hello));
        assert!(buf.is_empty());
    }

    #[test]
    fn waits_for_header_and_payload() {
        let mut codec = MessageCodec::new();
        assert!(codec.decode(&mut BytesMut::new()).unwrap().is_none());
        assert!(codec.decode(&mut BytesMut::from(&[0u8, 0][..])).unwrap().is_none());

        let msg = Message::ConfigurationChanged {
            id: 1,
            config: DecorConfig {
                radius: 20,
                privacy_dot: true,
                ..DecorConfig::default()
            },
        };
        let mut rest = encoded(std::slice::from_ref(&msg));
        let mut buf = rest.split_to(rest.len() / 2);

        let mut codec = MessageCodec::new();
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&rest);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(msg));
    }

    #[test]
    fn back_to_back_frames_split_cleanly() {
        let msgs = [Message::Start { id: 1 }, Message::GetSnapshot { id: 2 }];
        let mut buf = encoded(&msgs);
        let mut frames = FrameCodec::new();
        let first = frames.decode(&mut buf).unwrap().unwrap();
        let second = frames.decode(&mut buf).unwrap().unwrap();
        assert!(matches!(decode_frame(&first), Decoded::Message(Message::Start { id: 1 })));
        assert!(matches!(
            decode_frame(&second),
            Decoded::Message(Message::GetSnapshot { id: 2 })
        ));
    }

    #[test]
    fn oversized_length_rejected_before_payload_arrives() {
        let mut buf = BytesMut::new();
        buf.put_u32((MAX_PAYLOAD_SIZE + 1) as u32);
        let err = FrameCodec::new().decode(&mut buf).unwrap_err();
        assert!(matches!(err, CodecError::PayloadTooLarge(_)));
    }

    #[test]
    fn header_is_big_endian_payload_length() {
        let buf = encoded(&[Message::Start { id: 0 }]);
        let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        assert_eq!(buf.len() - HEADER_LEN, len);
    }

    #[test]
    fn unknown_type_keeps_id() {
        #[derive(serde::Serialize)]
        struct Unknown {
            #[serde(rename = "type")]
            msg_type: &'static str,
            id: u32,
        }
        let payload = rmp_serde::to_vec_named(&Unknown {
            msg_type: "frobnicate",
            id: 42,
        })
        .unwrap();
        match decode_frame(&payload) {
            Decoded::UnknownType(envelope) => assert_eq!(envelope.id, 42),
            other => panic!("expected unknown type, got {other:?}"),
        }
    }

    #[test]
    fn known_type_with_bad_body_is_malformed() {
        #[derive(serde::Serialize)]
        struct Display {
            rotation: u16,
            unique_id: &'static str,
            natural_size: Size,
        }
        #[derive(serde::Serialize)]
        struct DisplayChanged {
            #[serde(rename = "type")]
            msg_type: &'static str,
            id: u32,
            display: Display,
        }
        let payload_with = |rotation| {
            rmp_serde::to_vec_named(&DisplayChanged {
                msg_type: "display_changed",
                id: 7,
                display: Display {
                    rotation,
                    unique_id: "d0",
                    natural_size: Size::new(100, 200),
                },
            })
            .unwrap()
        };
        assert!(matches!(
            decode_frame(&payload_with(90)),
            Decoded::Message(Message::DisplayChanged { id: 7, .. })
        ));
        assert!(matches!(decode_frame(&payload_with(45)), Decoded::Malformed(_)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            decode_frame(&[0xc1, 0xff, 0x00]),
            Decoded::Malformed(_)
        ));
    }
}
