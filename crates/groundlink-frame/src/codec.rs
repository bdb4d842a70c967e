use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use groundlink_registry::{Registry, RegistryError, Update, Value};
use prost::Message;

use crate::error::{FrameError, Result};
use crate::message::{VarMsg, WireValue};

/// Frame header: one length byte.
pub const HEADER_SIZE: usize = 1;

/// Largest payload a one-byte length prefix can describe.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Largest frame on the wire (header + payload).
pub const MAX_FRAME: usize = HEADER_SIZE + MAX_PAYLOAD;

/// Serialize an update's tag and value into a protobuf payload.
///
/// # Panics
///
/// Panics if the update carries a value whose kind differs from its
/// definition. Updates built through [`Update::bind`] never do; reaching this
/// means the registry and the codec disagree about the variable.
pub fn encode_payload(update: &Update) -> Result<Vec<u8>> {
    let tag = i32::try_from(update.tag()).map_err(|_| FrameError::UnknownTag(update.tag().into()))?;

    let value = update.value().map(|value| {
        assert_eq!(
            value.kind(),
            update.definition().kind,
            "value kind diverged from definition of '{}'",
            update.definition().path()
        );
        match value {
            Value::Int(v) => WireValue::IntValue(v),
            Value::Float(v) => WireValue::FloatValue(v as f32),
            Value::Bool(v) => WireValue::BoolValue(v),
        }
    });

    Ok(VarMsg {
        tag: Some(tag),
        value,
    }
    .encode_to_vec())
}

/// Prepend the length byte to `payload`.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────────────────┐
/// │ Length (1B)│ Payload (Length B)   │
/// └────────────┴──────────────────────┘
/// ```
pub fn frame_payload(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::EncodingTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(payload.len() as u8);
    dst.put_slice(payload);
    Ok(())
}

/// Encode one update as a complete frame.
pub fn encode_update(update: &Update) -> Result<Bytes> {
    let payload = encode_payload(update)?;
    let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    frame_payload(&payload, &mut frame)?;
    Ok(frame.freeze())
}

/// Decode one frame payload (without its length byte).
pub fn decode_payload(payload: &[u8], registry: &Registry) -> Result<Update> {
    let msg = VarMsg::decode(payload)?;
    let tag = i64::from(msg.tag.ok_or(FrameError::MissingTag)?);
    let definition = registry
        .lookup_by_tag(tag)
        .map_err(|_| FrameError::UnknownTag(tag))?;

    let value = msg.value.map(|value| match value {
        WireValue::IntValue(v) => Value::Int(v),
        WireValue::FloatValue(v) => Value::Float(f64::from(v)),
        WireValue::BoolValue(v) => Value::Bool(v),
    });

    Update::bind(Arc::clone(definition), value).map_err(|err| match err {
        RegistryError::TypeMismatch {
            expected, found, ..
        } => FrameError::TypeMismatch {
            path: definition.path(),
            expected,
            found,
        },
        other => FrameError::Registry(other),
    })
}

/// Iterator over the coalesced frames of one buffer.
///
/// A bad payload only costs its own frame. A frame whose declared length runs
/// past the end of the buffer ends iteration; the trailing bytes are
/// discarded.
pub struct FrameDecoder<'a> {
    buf: &'a [u8],
    registry: &'a Registry,
    done: bool,
}

impl<'a> FrameDecoder<'a> {
    pub fn new(buf: &'a [u8], registry: &'a Registry) -> Self {
        Self {
            buf,
            registry,
            done: false,
        }
    }
}

impl Iterator for FrameDecoder<'_> {
    type Item = Result<Update>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.buf.is_empty() {
            return None;
        }

        let declared = self.buf[0] as usize;
        let remaining = self.buf.len() - HEADER_SIZE;
        if declared > remaining {
            self.done = true;
            return Some(Err(FrameError::Framing {
                declared,
                remaining,
            }));
        }

        let payload = &self.buf[HEADER_SIZE..HEADER_SIZE + declared];
        self.buf = &self.buf[HEADER_SIZE + declared..];
        Some(decode_payload(payload, self.registry))
    }
}

/// Decode every frame in `buf`, in order.
pub fn decode_frames(buf: &[u8], registry: &Registry) -> Vec<Result<Update>> {
    FrameDecoder::new(buf, registry).collect()
}

/// Packets produced from a batch, plus the frames that could not be sent.
#[derive(Debug, Default)]
pub struct Coalesced {
    pub packets: Vec<Bytes>,
    pub errors: Vec<FrameError>,
}

/// Greedily pack whole frames, left to right, into packets of at most `mtu`
/// bytes. A frame larger than `mtu` is dropped and reported.
pub fn pack_frames(frames: impl IntoIterator<Item = Bytes>, mtu: usize) -> Coalesced {
    let mut out = Coalesced::default();
    let mut packet = BytesMut::new();

    for frame in frames {
        if frame.len() > mtu {
            out.errors.push(FrameError::ExceedsMtu {
                size: frame.len(),
                mtu,
            });
            continue;
        }
        if packet.len() + frame.len() > mtu {
            out.packets.push(packet.split().freeze());
        }
        packet.extend_from_slice(&frame);
    }
    if !packet.is_empty() {
        out.packets.push(packet.freeze());
    }
    out
}

/// Encode each update and pack the frames into `mtu`-sized packets.
pub fn coalesce(updates: &[Update], mtu: usize) -> Coalesced {
    let mut errors = Vec::new();
    let frames: Vec<Bytes> = updates
        .iter()
        .filter_map(|update| match encode_update(update) {
            Ok(frame) => Some(frame),
            Err(err) => {
                errors.push(err);
                None
            }
        })
        .collect();

    let mut out = pack_frames(frames, mtu);
    errors.append(&mut out.errors);
    out.errors = errors;
    out
}
