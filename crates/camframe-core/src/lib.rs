//! camframe core library: receive and decode camera frames from a byte stream.
//!
//! A camera module streams uncompressed RGB565 frames over a serial link.
//! Each frame is an ASCII `IMG_START` header line, a binary payload, an
//! optional big-endian CRC-32 trailer and an `IMAGE_END` marker. This crate
//! turns such a stream into validated frames and decoded images:
//! byte sources feed the assembler, which drives the header protocol
//! (layout/reader/parser) and the checksum engine; completed frames go
//! through the pixel decoder. All I/O is isolated in `source` modules.
//!
//! Invariants:
//! - Only frames whose payload length and checksum were validated leave the
//!   assembler; everything else is a resync event, never a stream failure.
//! - Output is independent of how the input stream is split into chunks.
//! - Checksum convention, channel order and byte order are explicit values.
//!
//! # Examples
//! ```
//! use camframe_core::{
//!     CaptureConfig, CaptureSession, Category, ChecksumConvention, FrameHeader, write_frame,
//! };
//!
//! let header = FrameHeader::rgb565(2, 1, Category::VisibleLight, true);
//! let bytes = write_frame(&header, &[0xf8, 0x00, 0x00, 0x1f], ChecksumConvention::Reflected);
//!
//! let mut session = CaptureSession::new(&CaptureConfig::default());
//! let frames = session.push(&bytes);
//! assert_eq!(frames[0].image.pixel(0, 0), Some([248, 0, 0]));
//! ```

use serde::{Deserialize, Serialize};

mod assembler;
mod capture;
mod checksum;
mod config;
mod inspect;
mod naming;
mod pixel;
mod protocol;
mod source;

pub use assembler::{AssemblerConfig, AssemblerState, AssemblerStats, Frame, FrameAssembler};
pub use capture::{
    CaptureControl, CaptureError, CaptureSession, CapturedFrame, DecodedFile, SessionSummary,
    SinkError, StopReason, decode_file, run_capture,
};
pub use checksum::{ChecksumConvention, Crc32, Crc32Params, Digest};
pub use config::{CaptureConfig, ConfigError};
pub use inspect::{ChecksumCheck, ComputedChecksum, InspectError, InspectReport, inspect_bytes, inspect_file};
pub use naming::{artifact_file_name, compact_timestamp};
pub use pixel::{
    ByteOrder, ChannelOrder, DecodedImage, PixelDecoder, encode_rgb565, repair_zero_samples,
    test_pattern, unpack_rgb565,
};
pub use protocol::category::Category;
pub use protocol::frame::error::HeaderError;
pub use protocol::frame::{FrameHeader, parse_header, write_frame};
pub use source::{ByteSource, FileSource, MemorySource, SourceError, SourceRead};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the clock cannot be formatted.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use camframe_core::ToolInfo;
///
/// let tool = ToolInfo::current();
/// assert_eq!(tool.name, "camframe");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

impl ToolInfo {
    pub fn current() -> Self {
        Self {
            name: "camframe".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Input file metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided by the caller.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}
