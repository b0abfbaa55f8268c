use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::HeaderError;
use super::layout;
use super::reader::HeaderReader;
use crate::protocol::category::Category;

/// Geometry and options declared by an `IMG_START` header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    pub category: Category,
    pub checksum_enabled: bool,
}

impl FrameHeader {
    /// Header for a packed RGB565 frame.
    pub fn rgb565(width: u32, height: u32, category: Category, checksum_enabled: bool) -> Self {
        Self {
            width,
            height,
            bits_per_pixel: layout::SUPPORTED_BITS_PER_PIXEL,
            category,
            checksum_enabled,
        }
    }

    /// Exact payload length implied by the declared geometry.
    pub fn payload_len(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * u64::from(self.bits_per_pixel / 8)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Formats the header line without its terminator, the way the sender writes it.
impl fmt::Display for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IMG_START,{},{},{},{},{}",
            self.width,
            self.height,
            self.bits_per_pixel,
            self.category.code(),
            u8::from(self.checksum_enabled)
        )
    }
}

/// Parse one header line (terminator optional) into a `FrameHeader`.
///
/// # Examples
/// ```
/// use camframe_core::{Category, parse_header};
///
/// let header = parse_header(b"IMG_START,320,240,16,2,1\r\n")?;
/// assert_eq!(header.category, Category::VisibleLight);
/// assert_eq!(header.payload_len(), 153_600);
/// # Ok::<(), camframe_core::HeaderError>(())
/// ```
pub fn parse_header(line: &[u8]) -> Result<FrameHeader, HeaderError> {
    let reader = HeaderReader::new(line)?;
    if reader.read_field(layout::TAG_FIELD)?.as_bytes() != layout::START_TAG {
        return Err(HeaderError::MissingTag);
    }
    reader.require_fields(layout::REQUIRED_FIELDS)?;

    let width: u32 = reader.read_number(layout::WIDTH_FIELD)?;
    let height: u32 = reader.read_number(layout::HEIGHT_FIELD)?;
    if width == 0 {
        return Err(HeaderError::ZeroDimension { name: "width" });
    }
    if height == 0 {
        return Err(HeaderError::ZeroDimension { name: "height" });
    }

    let bits_per_pixel: u32 = reader.read_number(layout::BPP_FIELD)?;
    if bits_per_pixel != layout::SUPPORTED_BITS_PER_PIXEL {
        return Err(HeaderError::UnsupportedBitsPerPixel {
            bpp: bits_per_pixel,
        });
    }

    let category = Category::from_code(reader.read_number(layout::CATEGORY_FIELD)?);
    let checksum_enabled = reader.read_optional_flag(layout::CHECKSUM_FLAG_FIELD)?;

    Ok(FrameHeader {
        width,
        height,
        bits_per_pixel,
        category,
        checksum_enabled,
    })
}

#[cfg(test)]
mod tests {
    use super::{FrameHeader, parse_header};
    use crate::protocol::category::Category;
    use crate::protocol::frame::error::HeaderError;

    #[test]
    fn parse_full_header() {
        let header = parse_header(b"IMG_START,320,240,16,2,1\r\n").unwrap();
        assert_eq!(header.width, 320);
        assert_eq!(header.height, 240);
        assert_eq!(header.bits_per_pixel, 16);
        assert_eq!(header.category, Category::VisibleLight);
        assert!(header.checksum_enabled);
        assert_eq!(header.payload_len(), 153_600);
    }

    #[test]
    fn parse_is_idempotent() {
        let line = b"IMG_START,160,120,16,3,0";
        assert_eq!(parse_header(line).unwrap(), parse_header(line).unwrap());
    }

    #[test]
    fn missing_checksum_flag_disables_checksum() {
        let header = parse_header(b"IMG_START,320,240,16,1\n").unwrap();
        assert!(!header.checksum_enabled);
        assert_eq!(header.category, Category::NoLight);
    }

    #[test]
    fn unknown_category_is_kept() {
        let header = parse_header(b"IMG_START,2,2,16,42,1").unwrap();
        assert_eq!(header.category, Category::Unknown(42));

        let header = parse_header(b"IMG_START,2,2,16,70000,1").unwrap();
        assert_eq!(header.category.to_string(), "unknown mode 70000");
    }

    #[test]
    fn rejects_wrong_tag() {
        let err = parse_header(b"IMG_STOP,320,240,16,2,1").unwrap_err();
        assert_eq!(err, HeaderError::MissingTag);
    }

    #[test]
    fn rejects_missing_category() {
        let err = parse_header(b"IMG_START,320,240,16").unwrap_err();
        assert!(matches!(err, HeaderError::MissingField { name: "category", .. }));
    }

    #[test]
    fn rejects_non_numeric_width() {
        let err = parse_header(b"IMG_START,abc,240,16,2,1").unwrap_err();
        assert!(matches!(err, HeaderError::InvalidField { name: "width", .. }));
    }

    #[test]
    fn rejects_zero_height() {
        let err = parse_header(b"IMG_START,320,0,16,2,1").unwrap_err();
        assert_eq!(err, HeaderError::ZeroDimension { name: "height" });
    }

    #[test]
    fn rejects_other_bit_depths() {
        let err = parse_header(b"IMG_START,320,240,24,2,1").unwrap_err();
        assert_eq!(err, HeaderError::UnsupportedBitsPerPixel { bpp: 24 });
    }

    #[test]
    fn display_matches_wire_line() {
        let header = FrameHeader::rgb565(320, 240, Category::Infrared, true);
        assert_eq!(header.to_string(), "IMG_START,320,240,16,3,1");
        assert_eq!(parse_header(header.to_string().as_bytes()).unwrap(), header);
    }
}
