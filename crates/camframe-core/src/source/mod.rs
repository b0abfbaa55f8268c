//! Byte sources feeding the assembler.
//!
//! A source hands out whatever bytes are currently available. It reports
//! `Idle` when a bounded wait expired without data and `Closed` once no more
//! bytes will ever arrive. Sources release their underlying handle on drop.

mod file;
mod memory;

pub use file::FileSource;
pub use memory::MemorySource;

use thiserror::Error;

/// Outcome of one bounded read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRead {
    /// `n` bytes were written to the front of the buffer.
    Data(usize),
    /// Nothing arrived within the read timeout.
    Idle,
    /// End of stream.
    Closed,
}

pub trait ByteSource {
    /// Read up to `buf.len()` bytes, waiting at most the source's timeout.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<SourceRead, SourceError>;

    /// Human-readable name used in logs.
    fn describe(&self) -> String;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<SourceRead, SourceError> {
        (**self).read_available(buf)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("device error: {0}")]
    Device(String),
}
