//! Capture driver: pulls bytes from a source and emits decoded frames.
//!
//! The loop is single-threaded. Each iteration checks for cancellation,
//! performs one bounded read, advances the assembler and hands completed
//! frames to the caller. Idle periods produce a heartbeat log line and a
//! short sleep; progress is logged at a fixed interval whether or not data
//! arrives. Cancellation is observed between reads, never mid-frame.

mod session;

pub use session::{CaptureSession, CapturedFrame};

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::assembler::AssemblerStats;
use crate::config::CaptureConfig;
use crate::source::{ByteSource, FileSource, SourceError, SourceRead};

const READ_CHUNK: usize = 64 * 1024;

/// Error returned by a frame sink.
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("failed to store frame {sequence}: {source}")]
    Sink {
        sequence: u64,
        #[source]
        source: SinkError,
    },
}

/// Why a capture loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndOfStream,
    Cancelled,
    FrameLimit,
}

/// Outcome of one capture run.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub source: String,
    pub stop_reason: StopReason,
    pub frames: u64,
    pub elapsed_ms: u64,
    pub stats: AssemblerStats,
}

/// Cooperative stop signal shared with signal handlers.
#[derive(Debug, Clone, Default)]
pub struct CaptureControl {
    stop: Arc<AtomicBool>,
    max_frames: Option<u64>,
}

impl CaptureControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Flag to set from another thread to end the loop.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn limit_reached(&self, frames: u64) -> bool {
        self.max_frames.is_some_and(|max| frames >= max)
    }
}

/// Drive `source` until it closes, a stop is requested or the frame limit is hit.
///
/// `on_frame` sees frames in stream order; an error from it aborts the run.
/// Resync events never end the loop, only source and sink failures do.
pub fn run_capture<S, F>(
    source: &mut S,
    session: &mut CaptureSession,
    config: &CaptureConfig,
    control: &CaptureControl,
    mut on_frame: F,
) -> Result<SessionSummary, CaptureError>
where
    S: ByteSource + ?Sized,
    F: FnMut(CapturedFrame) -> Result<(), SinkError>,
{
    let description = source.describe();
    tracing::info!(source = %description, "capture started");

    let started = Instant::now();
    let mut last_data = started;
    let mut last_heartbeat = started;
    let mut last_progress = started;
    let mut buf = vec![0u8; READ_CHUNK];

    let stop_reason = 'capture: loop {
        if control.stop_requested() {
            break StopReason::Cancelled;
        }

        match source.read_available(&mut buf)? {
            SourceRead::Data(n) if n > 0 => {
                last_data = Instant::now();
                for frame in session.push(&buf[..n]) {
                    let sequence = frame.sequence;
                    on_frame(frame).map_err(|source| CaptureError::Sink { sequence, source })?;
                    if control.limit_reached(session.frames()) {
                        break 'capture StopReason::FrameLimit;
                    }
                }
            }
            SourceRead::Data(_) | SourceRead::Idle => {
                let now = Instant::now();
                if now.duration_since(last_data) >= config.heartbeat()
                    && now.duration_since(last_heartbeat) >= config.heartbeat()
                {
                    tracing::info!(
                        idle_secs = now.duration_since(last_data).as_secs(),
                        state = ?session.state(),
                        "waiting for data"
                    );
                    last_heartbeat = now;
                }
                thread::sleep(config.idle_sleep());
            }
            SourceRead::Closed => break StopReason::EndOfStream,
        }

        if last_progress.elapsed() >= config.progress_interval() {
            let stats = session.stats();
            tracing::debug!(
                bytes = stats.bytes_received,
                frames = stats.frames_completed,
                dropped = stats.frames_dropped(),
                state = ?session.state(),
                "capture progress"
            );
            last_progress = Instant::now();
        }
    };

    let summary = SessionSummary {
        source: description,
        stop_reason,
        frames: session.frames(),
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        stats: session.stats().clone(),
    };
    tracing::info!(
        frames = summary.frames,
        checksum_failures = summary.stats.checksum_failures,
        headers_rejected = summary.stats.headers_rejected,
        reason = ?summary.stop_reason,
        "capture finished"
    );
    Ok(summary)
}

/// Every frame of a captured file plus the run summary.
#[derive(Debug)]
pub struct DecodedFile {
    pub frames: Vec<CapturedFrame>,
    pub summary: SessionSummary,
}

/// Decode all frames stored in a `.dat` capture.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
///
/// use camframe_core::{CaptureConfig, decode_file};
///
/// let decoded = decode_file(Path::new("IMG_0001.DAT"), &CaptureConfig::default())?;
/// println!("{} frames", decoded.frames.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn decode_file(path: &Path, config: &CaptureConfig) -> Result<DecodedFile, CaptureError> {
    let mut source = FileSource::open(path)?;
    let mut session = CaptureSession::new(config);
    let mut frames = Vec::new();
    let summary = run_capture(
        &mut source,
        &mut session,
        config,
        &CaptureControl::new(),
        |frame| {
            frames.push(frame);
            Ok(())
        },
    )?;
    Ok(DecodedFile { frames, summary })
}
