use super::decode::{ByteOrder, ChannelOrder};

/// Pack an 8-bit RGB triple into RGB565, rounding to the nearest level.
///
/// Inverse of `unpack_rgb565` for the same channel order.
///
/// # Examples
/// ```
/// use camframe_core::{ChannelOrder, encode_rgb565};
///
/// assert_eq!(encode_rgb565([248, 0, 0], ChannelOrder::Rgb), 0xF800);
/// assert_eq!(encode_rgb565([248, 0, 0], ChannelOrder::Bgr), 0x001F);
/// ```
pub fn encode_rgb565(rgb: [u8; 3], order: ChannelOrder) -> u16 {
    let [red, green, blue] = rgb;
    let (top, low) = match order {
        ChannelOrder::Rgb => (red, blue),
        ChannelOrder::Bgr => (blue, red),
    };
    (quantize(top, 3, 0x1F) << 11) | (quantize(green, 2, 0x3F) << 5) | quantize(low, 3, 0x1F)
}

fn quantize(value: u8, shift: u32, max: u16) -> u16 {
    let rounded = (u16::from(value) + (1 << (shift - 1))) >> shift;
    rounded.min(max)
}

/// Reference colors, left to right, used by the calibration pattern.
pub const TEST_PATTERN_BARS: [[u8; 3]; 4] = [[248, 0, 0], [0, 252, 0], [0, 0, 248], [248, 252, 248]];

/// Payload of vertical red/green/blue/white bars.
///
/// Decoding it with the right channel order shows red on the left; a blue
/// left bar means the 5-bit fields are swapped.
pub fn test_pattern(width: u32, height: u32, order: ChannelOrder, byte_order: ByteOrder) -> Vec<u8> {
    let width_px = width as usize;
    let mut row = Vec::with_capacity(width_px * 2);
    for x in 0..width_px {
        let bar = (x * TEST_PATTERN_BARS.len() / width_px.max(1)).min(TEST_PATTERN_BARS.len() - 1);
        row.extend_from_slice(&byte_order.bytes(encode_rgb565(TEST_PATTERN_BARS[bar], order)));
    }
    row.repeat(height as usize)
}
