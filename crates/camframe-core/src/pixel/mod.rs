//! RGB565 pixel decoding.
//!
//! Each sample packs `[top 5 | mid 6 | low 5]` bits. Decoding widens the
//! 5-bit fields with `<< 3` and the 6-bit field with `<< 2` (low bits zero).
//! The channel mapping and the wire byte order are explicit parameters of
//! `PixelDecoder`.

pub mod decode;
pub mod encode;
pub mod repair;

pub use decode::{ByteOrder, ChannelOrder, DecodedImage, PixelDecoder, unpack_rgb565};
pub use encode::{encode_rgb565, test_pattern};
pub use repair::repair_zero_samples;
