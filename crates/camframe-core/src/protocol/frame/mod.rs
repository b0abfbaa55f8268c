//! `IMG_START` frame protocol.
//!
//! Wire layout, as emitted by the camera firmware:
//!
//! ```text
//! IMG_START,<width>,<height>,<bpp>,<category>[,<checksum flag>]\r\n
//! <width * height * 2 bytes of packed RGB565 samples>
//! [<4-byte big-endian CRC-32 of the payload>]
//! \r\nIMAGE_END\r\n
//! ```
//!
//! Only the header line is textual; it is parsed here. Locating the header
//! inside a binary stream, slicing the payload and validating the trailer is
//! the job of the assembler.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod writer;

pub use parser::{FrameHeader, parse_header};
pub use writer::write_frame;
