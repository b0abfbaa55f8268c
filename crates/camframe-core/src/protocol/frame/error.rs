use thiserror::Error;

/// Errors returned while parsing or validating a frame header line.
///
/// Header errors never abort a stream: the assembler logs them, skips the
/// offending start tag and keeps scanning.
///
/// # Examples
/// ```
/// use camframe_core::HeaderError;
///
/// let err = HeaderError::UnsupportedBitsPerPixel { bpp: 24 };
/// assert!(err.to_string().contains("unsupported bits per pixel"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("header is not ASCII text")]
    NotAscii,
    #[error("header does not start with IMG_START")]
    MissingTag,
    #[error("missing header field '{name}' (index {index})")]
    MissingField { name: &'static str, index: usize },
    #[error("invalid header field '{name}': {value:?}")]
    InvalidField { name: &'static str, value: String },
    #[error("header dimension '{name}' must be positive")]
    ZeroDimension { name: &'static str },
    #[error("unsupported bits per pixel: {bpp} (expected 16)")]
    UnsupportedBitsPerPixel { bpp: u32 },
    #[error("declared payload of {declared} bytes exceeds limit of {limit}")]
    PayloadTooLarge { declared: u64, limit: u64 },
    #[error("no line terminator within {window} bytes of IMG_START")]
    UnterminatedHeader { window: usize },
}
