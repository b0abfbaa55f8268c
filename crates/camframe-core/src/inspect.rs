//! Structural diagnostics for captured `.dat` files.
//!
//! Unlike the assembler, inspection never discards anything: it locates the
//! first header, measures the data segment up to the end marker and reports
//! every mismatch it sees, including which checksum convention (if any)
//! reproduces the trailer.

use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::assembler::{AssemblerStats, FrameAssembler};
use crate::checksum::ChecksumConvention;
use crate::config::CaptureConfig;
use crate::protocol::frame::reader::HeaderReader;
use crate::protocol::frame::{FrameHeader, layout, parse_header};
use crate::protocol::scan::find_subslice;
use crate::{DEFAULT_GENERATED_AT, InputInfo, REPORT_VERSION, ToolInfo};

/// Bytes shown from the start of the data segment (and the file tail).
pub const HEX_PREVIEW_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Diagnostic report for one capture file.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 timestamp of the inspection.
    pub generated_at: String,
    pub input: InputInfo,

    /// Offset of the first `IMG_START` tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_offset: Option<u64>,
    /// Header line without its terminator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<FrameHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_offset: Option<u64>,
    /// Offset of the line terminator preceding `IMAGE_END`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_offset: Option<u64>,
    /// Bytes between header and footer (payload plus any trailer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_bytes: Option<u64>,
    /// `data_bytes - expected_bytes`, trailer included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_delta: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<ChecksumCheck>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_head_hex: Option<String>,
    /// Last bytes of the file, shown when no footer was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail_hex: Option<String>,

    /// Result of running the assembler over the whole file.
    pub assembly: AssemblerStats,
}

/// Trailer comparison under every known convention.
#[derive(Debug, Clone, Serialize)]
pub struct ChecksumCheck {
    pub received: String,
    pub computed: Vec<ComputedChecksum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_convention: Option<ChecksumConvention>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComputedChecksum {
    pub convention: ChecksumConvention,
    pub value: String,
    pub matches: bool,
}

/// Inspect a file on disk, stamping the report with the current time.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
///
/// use camframe_core::{CaptureConfig, inspect_file};
///
/// let report = inspect_file(Path::new("IMG_0001.DAT"), &CaptureConfig::default())?;
/// println!("{}", serde_json::to_string_pretty(&report)?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn inspect_file(path: &Path, config: &CaptureConfig) -> Result<InspectReport, InspectError> {
    let bytes = fs::read(path)?;
    let mut report = inspect_bytes(&path.display().to_string(), &bytes, config);
    report.generated_at = now_rfc3339();
    Ok(report)
}

/// Inspect an in-memory capture. `generated_at` is left at its default.
pub fn inspect_bytes(label: &str, bytes: &[u8], config: &CaptureConfig) -> InspectReport {
    let mut report = InspectReport {
        report_version: REPORT_VERSION,
        tool: ToolInfo::current(),
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: label.to_string(),
            bytes: bytes.len() as u64,
        },
        header_offset: None,
        header_text: None,
        header_fields: Vec::new(),
        header: None,
        header_error: None,
        data_offset: None,
        footer_offset: None,
        data_bytes: None,
        expected_bytes: None,
        size_delta: None,
        checksum: None,
        payload_head_hex: None,
        tail_hex: None,
        assembly: assemble_all(bytes, config),
    };

    let Some(start) = find_subslice(bytes, layout::START_TAG) else {
        report.tail_hex = Some(hex_groups(&bytes[..bytes.len().min(HEX_PREVIEW_LEN)]));
        return report;
    };
    report.header_offset = Some(start as u64);

    let Some(line_end) = bytes[start..]
        .iter()
        .position(|&byte| byte == layout::LINE_FEED)
        .map(|offset| start + offset)
    else {
        report.header_error = Some("header line is not terminated".to_string());
        report.tail_hex = Some(tail_hex(bytes));
        return report;
    };

    let line = &bytes[start..line_end];
    let line = line.strip_suffix(&[layout::CARRIAGE_RETURN]).unwrap_or(line);
    if let Ok(reader) = HeaderReader::new(line) {
        report.header_fields = reader.fields().iter().map(|field| field.to_string()).collect();
    }
    report.header_text = Some(String::from_utf8_lossy(line).into_owned());

    let header = match parse_header(line) {
        Ok(header) => Some(header),
        Err(err) => {
            report.header_error = Some(err.to_string());
            None
        }
    };
    report.header = header;

    let data_start = line_end + 1;
    report.data_offset = Some(data_start as u64);
    let expected = header.map(|header| header.payload_len());
    report.expected_bytes = expected;

    match find_footer(bytes, data_start, expected) {
        Some(footer) => {
            report.footer_offset = Some(footer as u64);
            report.data_bytes = Some((footer - data_start) as u64);
        }
        None => {
            report.data_bytes = Some((bytes.len() - data_start) as u64);
            report.tail_hex = Some(tail_hex(bytes));
        }
    }
    if let (Some(data), Some(expected)) = (report.data_bytes, expected) {
        report.size_delta = Some(data as i64 - expected as i64);
    }

    let head_end = bytes.len().min(data_start + HEX_PREVIEW_LEN);
    if head_end > data_start {
        report.payload_head_hex = Some(hex_groups(&bytes[data_start..head_end]));
    }

    if let Some(header) = header.filter(|header| header.checksum_enabled) {
        report.checksum = check_trailer(bytes, data_start, header.payload_len());
    }

    report
}

/// Locate the terminator before `IMAGE_END`, preferring one after the payload.
fn find_footer(bytes: &[u8], data_start: usize, expected: Option<u64>) -> Option<usize> {
    let after_payload = expected
        .and_then(|len| usize::try_from(len).ok())
        .map(|len| data_start.saturating_add(len))
        .filter(|&from| from <= bytes.len());

    let marker = after_payload
        .and_then(|from| find_subslice(&bytes[from..], layout::END_MARKER).map(|i| from + i))
        .or_else(|| find_subslice(&bytes[data_start..], layout::END_MARKER).map(|i| data_start + i))?;

    let before = &bytes[data_start..marker];
    let terminator = if before.ends_with(layout::LINE_TERMINATOR) {
        layout::LINE_TERMINATOR.len()
    } else if before.ends_with(&[layout::LINE_FEED]) {
        1
    } else {
        0
    };
    Some(marker - terminator)
}

fn check_trailer(bytes: &[u8], data_start: usize, payload_len: u64) -> Option<ChecksumCheck> {
    let payload_len = usize::try_from(payload_len).ok()?;
    let payload_end = data_start.checked_add(payload_len)?;
    let payload = bytes.get(data_start..payload_end)?;
    let trailer = bytes.get(payload_end..payload_end + layout::CHECKSUM_LEN)?;
    let received = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);

    let computed: Vec<ComputedChecksum> = ChecksumConvention::ALL
        .iter()
        .map(|&convention| {
            let value = convention.checksum(payload);
            ComputedChecksum {
                convention,
                value: format!("{value:#010x}"),
                matches: value == received,
            }
        })
        .collect();
    let matching_convention = computed
        .iter()
        .find(|check| check.matches)
        .map(|check| check.convention);

    Some(ChecksumCheck {
        received: format!("{received:#010x}"),
        computed,
        matching_convention,
    })
}

fn assemble_all(bytes: &[u8], config: &CaptureConfig) -> AssemblerStats {
    let mut assembler = FrameAssembler::new(config.assembler());
    assembler.push(bytes);
    assembler.stats().clone()
}

fn tail_hex(bytes: &[u8]) -> String {
    hex_groups(&bytes[bytes.len().saturating_sub(HEX_PREVIEW_LEN)..])
}

/// Lowercase hex in two-byte groups: `f800 001f`.
fn hex_groups(bytes: &[u8]) -> String {
    bytes
        .chunks(2)
        .map(|pair| pair.iter().map(|byte| format!("{byte:02x}")).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| DEFAULT_GENERATED_AT.to_string())
}
