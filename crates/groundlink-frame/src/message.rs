//! Protobuf payload of one frame.
//!
//! ```text
//! message VarMsg {
//!   required int32 tag = 1;
//!   oneof value {
//!     int32 int_value = 2;
//!     float float_value = 3;
//!     bool bool_value = 4;
//!   }
//! }
//! ```
//!
//! A message without `value` is a query. prost does not enforce `required`,
//! so `tag` is carried as an optional field and a message without it is
//! rejected by the decoder.

/// One variable on the wire.
#[derive(Clone, PartialEq, prost::Message)]
pub struct VarMsg {
    #[prost(int32, optional, tag = "1")]
    pub tag: Option<i32>,
    #[prost(oneof = "WireValue", tags = "2, 3, 4")]
    pub value: Option<WireValue>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum WireValue {
    #[prost(int32, tag = "2")]
    IntValue(i32),
    #[prost(float, tag = "3")]
    FloatValue(f32),
    #[prost(bool, tag = "4")]
    BoolValue(bool),
}
