use super::layout;
use super::parser::FrameHeader;
use crate::checksum::ChecksumConvention;

/// Serialize a frame exactly as the camera firmware emits it.
///
/// The trailer is written only when the header enables checksums.
///
/// # Examples
/// ```
/// use camframe_core::{Category, ChecksumConvention, FrameHeader, write_frame};
///
/// let header = FrameHeader::rgb565(1, 1, Category::NoLight, false);
/// let bytes = write_frame(&header, &[0xf8, 0x00], ChecksumConvention::Reflected);
/// assert!(bytes.starts_with(b"IMG_START,1,1,16,1,0\r\n"));
/// assert!(bytes.ends_with(b"\r\nIMAGE_END\r\n"));
/// ```
pub fn write_frame(header: &FrameHeader, payload: &[u8], convention: ChecksumConvention) -> Vec<u8> {
    let line = header.to_string();
    let trailer = if header.checksum_enabled {
        layout::CHECKSUM_LEN
    } else {
        0
    };
    let mut out = Vec::with_capacity(
        line.len() + payload.len() + trailer + layout::END_MARKER.len() + 3 * layout::LINE_TERMINATOR.len(),
    );
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(layout::LINE_TERMINATOR);
    out.extend_from_slice(payload);
    if header.checksum_enabled {
        out.extend_from_slice(&convention.checksum(payload).to_be_bytes());
    }
    out.extend_from_slice(layout::LINE_TERMINATOR);
    out.extend_from_slice(layout::END_MARKER);
    out.extend_from_slice(layout::LINE_TERMINATOR);
    out
}
