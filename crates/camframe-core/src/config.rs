use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assembler::AssemblerConfig;
use crate::checksum::ChecksumConvention;
use crate::pixel::{ByteOrder, ChannelOrder, PixelDecoder};
use crate::pixel::repair::DEFAULT_REPAIR_THRESHOLD;
use crate::protocol::frame::layout;

/// Every tunable of a capture run in one place.
///
/// Missing JSON fields fall back to the defaults, which reproduce the
/// camera firmware's conventions.
///
/// # Examples
/// ```
/// use camframe_core::{CaptureConfig, ChecksumConvention};
///
/// let config: CaptureConfig = serde_json::from_str(r#"{ "checksum": "unreflected" }"#)?;
/// assert_eq!(config.checksum, ChecksumConvention::Unreflected);
/// assert_eq!(config.header_lookahead, 100);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub checksum: ChecksumConvention,
    pub channel_order: ChannelOrder,
    pub byte_order: ByteOrder,
    pub header_lookahead: usize,
    pub max_idle_buffer: usize,
    pub idle_tail: usize,
    pub max_end_scan: usize,
    pub max_payload_bytes: u64,
    /// `null` disables zero-sample repair.
    pub repair_zero_threshold: Option<usize>,
    pub mirror: bool,
    pub read_timeout_ms: u64,
    pub idle_sleep_ms: u64,
    pub heartbeat_secs: u64,
    pub progress_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let assembler = AssemblerConfig::default();
        Self {
            checksum: assembler.checksum,
            channel_order: ChannelOrder::default(),
            byte_order: ByteOrder::default(),
            header_lookahead: layout::HEADER_LOOKAHEAD,
            max_idle_buffer: assembler.max_idle_buffer,
            idle_tail: assembler.idle_tail,
            max_end_scan: assembler.max_end_scan,
            max_payload_bytes: assembler.max_payload_bytes,
            repair_zero_threshold: Some(DEFAULT_REPAIR_THRESHOLD),
            mirror: false,
            read_timeout_ms: 100,
            idle_sleep_ms: 1,
            heartbeat_secs: 5,
            progress_interval_ms: 1000,
        }
    }
}

impl CaptureConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn assembler(&self) -> AssemblerConfig {
        AssemblerConfig {
            checksum: self.checksum,
            header_lookahead: self.header_lookahead,
            max_idle_buffer: self.max_idle_buffer,
            idle_tail: self.idle_tail,
            max_end_scan: self.max_end_scan,
            max_payload_bytes: self.max_payload_bytes,
        }
    }

    pub fn decoder(&self) -> PixelDecoder {
        PixelDecoder {
            channel_order: self.channel_order,
            byte_order: self.byte_order,
            repair_zero_threshold: self.repair_zero_threshold,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
