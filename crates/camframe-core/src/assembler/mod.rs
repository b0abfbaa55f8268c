//! Stateful frame assembly over a chunked byte stream.
//!
//! The assembler accepts bytes in chunks of any size (single bytes,
//! fragments, multi-frame bursts) and re-evaluates its state machine after
//! every chunk:
//!
//! ```text
//! AwaitingHeader -> AwaitingPayload -> [AwaitingChecksum] -> AwaitingEnd -> AwaitingHeader
//! ```
//!
//! Any malformed header, checksum mismatch or missing end marker drops the
//! frame in progress and returns to `AwaitingHeader`; the stream itself is
//! never considered broken. Only completed frames leave the assembler.

mod stats;

pub use stats::AssemblerStats;

use serde::{Deserialize, Serialize};

use crate::checksum::{ChecksumConvention, Crc32};
use crate::protocol::frame::error::HeaderError;
use crate::protocol::frame::{FrameHeader, layout, parse_header};
use crate::protocol::scan::find_subslice;

/// Tunables of the assembler. Defaults follow the camera firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    pub checksum: ChecksumConvention,
    /// Bytes after `IMG_START` searched for the header terminator.
    pub header_lookahead: usize,
    /// Buffer size without a start tag at which old bytes are dropped.
    pub max_idle_buffer: usize,
    /// Bytes kept from the tail when the idle buffer is trimmed.
    pub idle_tail: usize,
    /// Bytes buffered while waiting for `IMAGE_END` before giving up.
    pub max_end_scan: usize,
    /// Largest payload a header may declare.
    pub max_payload_bytes: u64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            checksum: ChecksumConvention::default(),
            header_lookahead: layout::HEADER_LOOKAHEAD,
            max_idle_buffer: 1000,
            idle_tail: 100,
            max_end_scan: 4096,
            max_payload_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Observable phase of the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblerState {
    AwaitingHeader,
    AwaitingPayload,
    AwaitingChecksum,
    AwaitingEnd,
}

/// A validated frame: header plus a payload of exactly the declared length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    payload: Vec<u8>,
    checksum: Option<u32>,
}

impl Frame {
    /// Pair a header with its payload; `None` when the length does not match.
    pub fn new(header: FrameHeader, payload: Vec<u8>) -> Option<Self> {
        if payload.len() as u64 != header.payload_len() {
            return None;
        }
        Some(Self {
            header,
            payload,
            checksum: None,
        })
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Trailer value, when the frame carried one and it matched.
    pub fn checksum(&self) -> Option<u32> {
        self.checksum
    }
}

#[derive(Debug)]
enum State {
    AwaitingHeader,
    AwaitingPayload {
        header: FrameHeader,
        len: usize,
    },
    AwaitingChecksum {
        header: FrameHeader,
        payload: Vec<u8>,
    },
    AwaitingEnd {
        header: FrameHeader,
        payload: Vec<u8>,
        checksum: Option<u32>,
    },
}

enum Step {
    Continue,
    NeedMore,
    Emit(Frame),
}

/// Byte-stream scanner turning chunks into validated frames.
///
/// Each instance owns its buffer, configuration and counters; independent
/// instances never share state.
///
/// # Examples
/// ```
/// use camframe_core::{
///     AssemblerConfig, Category, ChecksumConvention, FrameAssembler, FrameHeader, write_frame,
/// };
///
/// let header = FrameHeader::rgb565(2, 1, Category::VisibleLight, true);
/// let bytes = write_frame(&header, &[0xf8, 0, 0, 0x1f], ChecksumConvention::Reflected);
///
/// let mut assembler = FrameAssembler::new(AssemblerConfig::default());
/// let (first, rest) = bytes.split_at(7);
/// assert!(assembler.push(first).is_empty());
/// let frames = assembler.push(rest);
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames[0].header(), &header);
/// ```
#[derive(Debug)]
pub struct FrameAssembler {
    config: AssemblerConfig,
    crc: Crc32,
    buffer: Vec<u8>,
    state: State,
    stats: AssemblerStats,
}

impl FrameAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self {
            crc: Crc32::new(config.checksum),
            config,
            buffer: Vec::with_capacity(64 * 1024),
            state: State::AwaitingHeader,
            stats: AssemblerStats::default(),
        }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn stats(&self) -> &AssemblerStats {
        &self.stats
    }

    pub fn state(&self) -> AssemblerState {
        match self.state {
            State::AwaitingHeader => AssemblerState::AwaitingHeader,
            State::AwaitingPayload { .. } => AssemblerState::AwaitingPayload,
            State::AwaitingChecksum { .. } => AssemblerState::AwaitingChecksum,
            State::AwaitingEnd { .. } => AssemblerState::AwaitingEnd,
        }
    }

    /// Bytes received but not yet consumed by a state.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append a chunk and return every frame it completes, in stream order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.stats.bytes_received += chunk.len() as u64;
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        loop {
            match self.step() {
                Step::Continue => {}
                Step::NeedMore => break,
                Step::Emit(frame) => {
                    self.stats.record_frame(frame.header.category);
                    frames.push(frame);
                }
            }
        }
        frames
    }

    /// Drop any frame in progress and buffered bytes.
    pub fn reset(&mut self) {
        self.stats.bytes_discarded += self.buffer.len() as u64;
        self.buffer.clear();
        self.state = State::AwaitingHeader;
    }

    fn step(&mut self) -> Step {
        match std::mem::replace(&mut self.state, State::AwaitingHeader) {
            State::AwaitingHeader => self.scan_header(),
            State::AwaitingPayload { header, len } => self.take_payload(header, len),
            State::AwaitingChecksum { header, payload } => self.check_trailer(header, payload),
            State::AwaitingEnd {
                header,
                payload,
                checksum,
            } => self.scan_end(header, payload, checksum),
        }
    }

    fn scan_header(&mut self) -> Step {
        let Some(start) = find_subslice(&self.buffer, layout::START_TAG) else {
            self.trim_idle_buffer();
            return Step::NeedMore;
        };
        if start > 0 {
            self.discard_front(start);
        }

        let lookahead = self.config.header_lookahead.max(layout::START_TAG.len());
        let window_end = self.buffer.len().min(lookahead);
        let terminator = self.buffer[layout::START_TAG.len()..window_end]
            .iter()
            .position(|&byte| byte == layout::LINE_FEED)
            .map(|offset| offset + layout::START_TAG.len());

        let Some(line_end) = terminator else {
            if self.buffer.len() < lookahead {
                return Step::NeedMore;
            }
            self.reject_header(HeaderError::UnterminatedHeader { window: lookahead });
            return Step::Continue;
        };

        match parse_header(&self.buffer[..line_end]).and_then(|header| self.validate(header)) {
            Ok((header, len)) => {
                self.buffer.drain(..=line_end);
                tracing::debug!(
                    width = header.width,
                    height = header.height,
                    category = %header.category,
                    checksum = header.checksum_enabled,
                    "frame header"
                );
                self.state = State::AwaitingPayload { header, len };
            }
            Err(err) => self.reject_header(err),
        }
        Step::Continue
    }

    fn validate(&self, header: FrameHeader) -> Result<(FrameHeader, usize), HeaderError> {
        let declared = header.payload_len();
        if declared > self.config.max_payload_bytes {
            return Err(HeaderError::PayloadTooLarge {
                declared,
                limit: self.config.max_payload_bytes,
            });
        }
        let len = usize::try_from(declared).map_err(|_| HeaderError::PayloadTooLarge {
            declared,
            limit: self.config.max_payload_bytes,
        })?;
        Ok((header, len))
    }

    /// Skip past the offending tag only; a valid header may follow inside it.
    fn reject_header(&mut self, err: HeaderError) {
        tracing::warn!(reason = %err, "discarding malformed frame header");
        self.stats.headers_rejected += 1;
        self.discard_front(layout::START_TAG.len());
    }

    fn take_payload(&mut self, header: FrameHeader, len: usize) -> Step {
        if self.buffer.len() < len {
            self.state = State::AwaitingPayload { header, len };
            return Step::NeedMore;
        }

        // Hand the payload prefix over without copying it; only the
        // (usually short) remainder is moved into a fresh buffer.
        let rest = self.buffer.split_off(len);
        let payload = std::mem::replace(&mut self.buffer, rest);

        self.state = if header.checksum_enabled {
            State::AwaitingChecksum { header, payload }
        } else {
            State::AwaitingEnd {
                header,
                payload,
                checksum: None,
            }
        };
        Step::Continue
    }

    fn check_trailer(&mut self, header: FrameHeader, payload: Vec<u8>) -> Step {
        let Some(trailer) = self.buffer.get(..layout::CHECKSUM_LEN) else {
            self.state = State::AwaitingChecksum { header, payload };
            return Step::NeedMore;
        };
        let received = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        self.buffer.drain(..layout::CHECKSUM_LEN);

        let computed = self.crc.checksum(&payload);
        if computed != received {
            tracing::warn!(
                expected = %format!("{received:#010x}"),
                actual = %format!("{computed:#010x}"),
                convention = %self.config.checksum,
                "checksum mismatch, dropping frame"
            );
            self.stats.checksum_failures += 1;
            self.stats.bytes_discarded += payload.len() as u64;
            return Step::Continue;
        }

        self.state = State::AwaitingEnd {
            header,
            payload,
            checksum: Some(received),
        };
        Step::Continue
    }

    /// The marker must end within `max_end_scan + 1` bytes of the payload,
    /// however the stream was chunked; a later frame's marker never counts.
    fn scan_end(&mut self, header: FrameHeader, payload: Vec<u8>, checksum: Option<u32>) -> Step {
        let window = self.buffer.len().min(self.config.max_end_scan + 1);
        match find_subslice(&self.buffer[..window], layout::END_MARKER) {
            Some(index) => {
                self.buffer.drain(..index + layout::END_MARKER.len());
                Step::Emit(Frame {
                    header,
                    payload,
                    checksum,
                })
            }
            None if self.buffer.len() > self.config.max_end_scan => {
                tracing::warn!(
                    buffered = self.buffer.len(),
                    "no end marker after payload, dropping frame"
                );
                self.stats.end_markers_missing += 1;
                self.stats.bytes_discarded += payload.len() as u64;
                Step::Continue
            }
            None => {
                self.state = State::AwaitingEnd {
                    header,
                    payload,
                    checksum,
                };
                Step::NeedMore
            }
        }
    }

    fn trim_idle_buffer(&mut self) {
        if self.buffer.len() <= self.config.max_idle_buffer {
            return;
        }
        let keep = self.config.idle_tail.max(layout::START_TAG.len() - 1);
        let drop = self.buffer.len().saturating_sub(keep);
        self.discard_front(drop);
    }

    fn discard_front(&mut self, count: usize) {
        let count = count.min(self.buffer.len());
        self.buffer.drain(..count);
        self.stats.bytes_discarded += count as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::{AssemblerConfig, AssemblerState, Frame, FrameAssembler};
    use crate::checksum::ChecksumConvention;
    use crate::protocol::category::Category;
    use crate::protocol::frame::{FrameHeader, write_frame};

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 251) as u8 | 1).collect()
    }

    fn frame_bytes(header: &FrameHeader) -> Vec<u8> {
        write_frame(
            header,
            &payload(header.payload_len() as usize),
            ChecksumConvention::Reflected,
        )
    }

    fn assembler() -> FrameAssembler {
        FrameAssembler::new(AssemblerConfig::default())
    }

    #[test]
    fn assembles_frame_with_checksum() {
        let header = FrameHeader::rgb565(4, 3, Category::Infrared, true);
        let mut assembler = assembler();
        let frames = assembler.push(&frame_bytes(&header));

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].header(), &header);
        assert_eq!(frames[0].payload(), payload(24).as_slice());
        assert!(frames[0].checksum().is_some());
        assert_eq!(assembler.state(), AssemblerState::AwaitingHeader);
        assert_eq!(assembler.stats().frames_completed, 1);
    }

    #[test]
    fn walks_through_every_state() {
        let header = FrameHeader::rgb565(2, 2, Category::NoLight, true);
        let bytes = frame_bytes(&header);
        let header_len = header.to_string().len() + 2;
        let mut assembler = assembler();

        assert!(assembler.push(&bytes[..header_len]).is_empty());
        assert_eq!(assembler.state(), AssemblerState::AwaitingPayload);
        assert!(assembler.push(&bytes[header_len..header_len + 8]).is_empty());
        assert_eq!(assembler.state(), AssemblerState::AwaitingChecksum);
        assert!(assembler.push(&bytes[header_len + 8..header_len + 12]).is_empty());
        assert_eq!(assembler.state(), AssemblerState::AwaitingEnd);
        assert_eq!(assembler.push(&bytes[header_len + 12..]).len(), 1);
        assert_eq!(assembler.state(), AssemblerState::AwaitingHeader);
    }

    #[test]
    fn skips_garbage_before_header() {
        let header = FrameHeader::rgb565(2, 2, Category::VisibleLight, false);
        let mut stream = b"boot log\r\nMode: Visible Light\r\n".to_vec();
        stream.extend_from_slice(&frame_bytes(&header));

        let frames = assembler().push(&stream);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].checksum().is_none());
    }

    #[test]
    fn accepts_bare_line_feed() {
        let mut stream = b"IMG_START,1,1,16,2\n".to_vec();
        stream.extend_from_slice(&[0x12, 0x34]);
        stream.extend_from_slice(b"\nIMAGE_END\n");

        let frames = assembler().push(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), &[0x12, 0x34]);
    }

    #[test]
    fn checksum_mismatch_drops_frame_and_resyncs() {
        let header = FrameHeader::rgb565(2, 2, Category::NoLight, true);
        let mut corrupted = frame_bytes(&header);
        let header_len = header.to_string().len() + 2;
        corrupted[header_len + 3] ^= 0x40;
        let good = frame_bytes(&FrameHeader::rgb565(2, 2, Category::Infrared, true));

        let mut assembler = assembler();
        let mut stream = corrupted;
        stream.extend_from_slice(&good);
        let frames = assembler.push(&stream);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].header().category, Category::Infrared);
        assert_eq!(assembler.stats().checksum_failures, 1);
        assert_eq!(assembler.stats().frames_completed, 1);
    }

    #[test]
    fn wrong_convention_rejects_every_frame() {
        let header = FrameHeader::rgb565(2, 2, Category::NoLight, true);
        let mut assembler = FrameAssembler::new(AssemblerConfig {
            checksum: ChecksumConvention::Unreflected,
            ..AssemblerConfig::default()
        });
        assert!(assembler.push(&frame_bytes(&header)).is_empty());
        assert_eq!(assembler.stats().checksum_failures, 1);
    }

    #[test]
    fn malformed_header_is_skipped() {
        let good = frame_bytes(&FrameHeader::rgb565(1, 1, Category::NoLight, false));
        let mut stream = b"IMG_START,abc,240,16,2,1\r\n".to_vec();
        stream.extend_from_slice(&good);

        let mut assembler = assembler();
        let frames = assembler.push(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(assembler.stats().headers_rejected, 1);
    }

    #[test]
    fn header_split_across_reads_waits_for_terminator() {
        let mut assembler = assembler();
        assert!(assembler.push(b"noiseIMG_START,1,1,").is_empty());
        assert_eq!(assembler.buffered(), b"IMG_START,1,1,".len());
        assert_eq!(assembler.state(), AssemblerState::AwaitingHeader);

        let mut rest = b"16,3,0\r\n".to_vec();
        rest.extend_from_slice(&[0xAB, 0xCD]);
        rest.extend_from_slice(b"\r\nIMAGE_END\r\n");
        let frames = assembler.push(&rest);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].header().category, Category::Infrared);
    }

    #[test]
    fn unterminated_header_is_abandoned_after_lookahead() {
        let mut stream = b"IMG_START,".to_vec();
        stream.extend_from_slice(&[b'9'; 120]);
        let mut assembler = assembler();
        assert!(assembler.push(&stream).is_empty());
        assert_eq!(assembler.stats().headers_rejected, 1);

        let good = frame_bytes(&FrameHeader::rgb565(1, 1, Category::NoLight, false));
        assert_eq!(assembler.push(&good).len(), 1);
    }

    #[test]
    fn oversized_declaration_is_rejected() {
        let mut assembler = FrameAssembler::new(AssemblerConfig {
            max_payload_bytes: 100,
            ..AssemblerConfig::default()
        });
        assert!(assembler.push(b"IMG_START,320,240,16,2,1\r\n").is_empty());
        assert_eq!(assembler.stats().headers_rejected, 1);
        assert_eq!(assembler.state(), AssemblerState::AwaitingHeader);
    }

    #[test]
    fn idle_buffer_is_trimmed_to_tail() {
        let mut assembler = assembler();
        assembler.push(&[0x55; 1500]);
        assert_eq!(assembler.buffered(), 100);
        assert_eq!(assembler.stats().bytes_discarded, 1400);
    }

    #[test]
    fn short_payload_never_completes() {
        let mut assembler = assembler();
        assembler.push(b"IMG_START,320,240,16,2,1\r\n");
        assembler.push(&vec![0x11; 153_599]);
        assert_eq!(assembler.state(), AssemblerState::AwaitingPayload);
        assembler.push(&[]);
        assert_eq!(assembler.state(), AssemblerState::AwaitingPayload);
    }

    #[test]
    fn missing_end_marker_gives_up_after_bound() {
        let mut assembler = FrameAssembler::new(AssemblerConfig {
            max_end_scan: 64,
            ..AssemblerConfig::default()
        });
        let mut stream = b"IMG_START,1,1,16,1,0\r\n\x01\x02".to_vec();
        stream.extend_from_slice(&[0u8; 65]);
        assert!(assembler.push(&stream).is_empty());
        assert_eq!(assembler.stats().end_markers_missing, 1);
        assert_eq!(assembler.state(), AssemblerState::AwaitingHeader);
    }

    #[test]
    fn burst_of_frames_in_one_chunk() {
        let mut stream = Vec::new();
        for code in 1..=3 {
            stream.extend_from_slice(&frame_bytes(&FrameHeader::rgb565(
                3,
                2,
                Category::from_code(code),
                code % 2 == 1,
            )));
        }
        let frames = assembler().push(&stream);
        let categories: Vec<_> = frames.iter().map(|f| f.header().category.code()).collect();
        assert_eq!(categories, vec![1, 2, 3]);
    }

    #[test]
    fn reset_discards_frame_in_progress() {
        let mut assembler = assembler();
        assembler.push(b"IMG_START,2,2,16,1,0\r\n\x01\x02");
        assembler.reset();
        assert_eq!(assembler.state(), AssemblerState::AwaitingHeader);
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn frame_new_checks_length() {
        let header = FrameHeader::rgb565(2, 2, Category::NoLight, false);
        assert!(Frame::new(header, vec![0; 7]).is_none());
        assert!(Frame::new(header, vec![0; 8]).is_some());
    }
}
