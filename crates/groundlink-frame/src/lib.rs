//! Length-prefixed framing for control updates.
//!
//! Every update travels as one frame:
//! - A 1-byte payload length (0..=255)
//! - A protobuf [`VarMsg`] payload carrying the tag and an optional value
//!
//! Frames are packed whole into packets no larger than a link's MTU, and a
//! packet may carry several frames back to back.

pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use codec::{
    coalesce, decode_frames, decode_payload, encode_payload, encode_update, frame_payload,
    pack_frames, Coalesced, FrameDecoder, HEADER_SIZE, MAX_FRAME, MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use message::{VarMsg, WireValue};
pub use reader::StreamReader;
pub use writer::PacketWriter;
