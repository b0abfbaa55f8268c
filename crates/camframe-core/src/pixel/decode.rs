use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::repair::repair_zero_samples;
use crate::assembler::Frame;

/// Which output channel receives the top 5-bit field of a sample.
///
/// The sender packs `[top 5 | mid 6 | low 5]`. `Rgb` reads the top field as
/// red and the low field as blue; `Bgr` swaps them. The correct value depends
/// on how the sensor is configured and must be calibrated against a known
/// reference color (see `synth` test pattern).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

impl FromStr for ChannelOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "rgb" => Ok(ChannelOrder::Rgb),
            "bgr" => Ok(ChannelOrder::Bgr),
            other => Err(format!("unknown channel order '{other}'")),
        }
    }
}

impl fmt::Display for ChannelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelOrder::Rgb => f.write_str("rgb"),
            ChannelOrder::Bgr => f.write_str("bgr"),
        }
    }
}

/// Order of the two wire bytes making up one 16-bit sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// High byte first; what the camera sends.
    #[default]
    Big,
    Little,
}

impl ByteOrder {
    pub fn sample(self, pair: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Big => u16::from_be_bytes(pair),
            ByteOrder::Little => u16::from_le_bytes(pair),
        }
    }

    pub fn bytes(self, sample: u16) -> [u8; 2] {
        match self {
            ByteOrder::Big => sample.to_be_bytes(),
            ByteOrder::Little => sample.to_le_bytes(),
        }
    }
}

impl FromStr for ByteOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "big" | "be" | "big-endian" => Ok(ByteOrder::Big),
            "little" | "le" | "little-endian" => Ok(ByteOrder::Little),
            other => Err(format!("unknown byte order '{other}'")),
        }
    }
}

/// Expand one packed sample into an 8-bit RGB triple.
///
/// # Examples
/// ```
/// use camframe_core::{ChannelOrder, unpack_rgb565};
///
/// assert_eq!(unpack_rgb565(0xF800, ChannelOrder::Rgb), [248, 0, 0]);
/// assert_eq!(unpack_rgb565(0xF800, ChannelOrder::Bgr), [0, 0, 248]);
/// ```
pub fn unpack_rgb565(sample: u16, order: ChannelOrder) -> [u8; 3] {
    let top = ((sample >> 11) & 0x1F) as u8;
    let mid = ((sample >> 5) & 0x3F) as u8;
    let low = (sample & 0x1F) as u8;
    let (top, mid, low) = (top << 3, mid << 2, low << 3);
    match order {
        ChannelOrder::Rgb => [top, mid, low],
        ChannelOrder::Bgr => [low, mid, top],
    }
}

/// Dense 8-bit RGB image, row-major, three bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl DecodedImage {
    /// Wrap raw RGB bytes; `None` when the length does not match the geometry.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * 3;
        (data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        let rgb = self.data.get(offset..offset + 3)?;
        Some([rgb[0], rgb[1], rgb[2]])
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Flip left-to-right; the camera module is mounted mirrored.
    pub fn mirror_horizontal(&mut self) {
        let row_len = self.width as usize * 3;
        if row_len == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(row_len) {
            let width = self.width as usize;
            for x in 0..width / 2 {
                let left = x * 3;
                let right = (width - 1 - x) * 3;
                for channel in 0..3 {
                    row.swap(left + channel, right + channel);
                }
            }
        }
    }
}

/// Converts validated RGB565 payloads into `DecodedImage`s.
///
/// All conventions live here so call sites never repeat the bit arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelDecoder {
    pub channel_order: ChannelOrder,
    pub byte_order: ByteOrder,
    /// Zero-sample count above which isolated zeros are interpolated.
    pub repair_zero_threshold: Option<usize>,
}

impl Default for PixelDecoder {
    fn default() -> Self {
        Self {
            channel_order: ChannelOrder::default(),
            byte_order: ByteOrder::default(),
            repair_zero_threshold: Some(super::repair::DEFAULT_REPAIR_THRESHOLD),
        }
    }
}

impl PixelDecoder {
    pub fn decode(&self, frame: &Frame) -> DecodedImage {
        let header = frame.header();
        self.decode_payload(header.width, header.height, frame.payload())
    }

    /// Decode a raw payload of exactly `width * height * 2` bytes.
    ///
    /// # Panics
    /// Panics on a length mismatch: payloads are length-checked by the
    /// assembler, so a mismatch here is a bug in the caller.
    pub fn decode_payload(&self, width: u32, height: u32, payload: &[u8]) -> DecodedImage {
        let pixels = width as usize * height as usize;
        assert_eq!(
            payload.len(),
            pixels * 2,
            "payload length does not match {width}x{height} RGB565"
        );

        let mut samples: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| self.byte_order.sample([pair[0], pair[1]]))
            .collect();

        if let Some(threshold) = self.repair_zero_threshold {
            let repaired = repair_zero_samples(&mut samples, threshold);
            if repaired > 0 {
                tracing::warn!(repaired, threshold, "interpolated zero samples");
            }
        }

        let mut data = Vec::with_capacity(pixels * 3);
        for sample in samples {
            data.extend_from_slice(&unpack_rgb565(sample, self.channel_order));
        }
        DecodedImage {
            width,
            height,
            data,
        }
    }
}
