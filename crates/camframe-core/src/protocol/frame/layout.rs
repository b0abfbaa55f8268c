/// Start-of-frame tag opening every header line.
pub const START_TAG: &[u8; 9] = b"IMG_START";
/// End-of-frame marker following the payload (and trailer, if any).
pub const END_MARKER: &[u8; 9] = b"IMAGE_END";

pub const FIELD_SEPARATOR: char = ',';
pub const LINE_FEED: u8 = b'\n';
pub const CARRIAGE_RETURN: u8 = b'\r';
/// Terminator written by the sender; readers also accept a bare `\n`.
pub const LINE_TERMINATOR: &[u8; 2] = b"\r\n";

pub const TAG_FIELD: usize = 0;
pub const WIDTH_FIELD: usize = 1;
pub const HEIGHT_FIELD: usize = 2;
pub const BPP_FIELD: usize = 3;
pub const CATEGORY_FIELD: usize = 4;
pub const CHECKSUM_FLAG_FIELD: usize = 5;
pub const REQUIRED_FIELDS: usize = 5;

/// Packed RGB 5-6-5 is the only payload format the sender produces.
pub const SUPPORTED_BITS_PER_PIXEL: u32 = 16;
pub const CHECKSUM_LEN: usize = 4;

/// Bytes after a start tag searched for the header line terminator.
pub const HEADER_LOOKAHEAD: usize = 100;
