use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::Context;
use camframe_core::{
    ByteOrder, CaptureConfig, CaptureControl, CaptureSession, Category, ChannelOrder,
    ChecksumConvention, FrameHeader, SessionSummary, artifact_file_name, decode_file,
    inspect_file, run_capture, test_pattern, write_frame,
};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

mod output;
mod serial;

use output::ImageFormat;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CAMFRAME_BUILD_COMMIT"),
    " ",
    env!("CAMFRAME_BUILD_DATE"),
    ")\ncommit: ",
    env!("CAMFRAME_BUILD_COMMIT_FULL"),
);

/// Batch pattern used when a directory is given to `decode`.
const BATCH_PATTERN: &str = "IMG_*.DAT";

#[derive(Parser, Debug)]
#[command(name = "camframe")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Receive, decode and diagnose RGB565 camera frames (IMG_START protocol).",
    long_about = None,
    after_help = "Examples:\n  camframe listen -o captures\n  camframe decode IMG_0001.DAT -o out\n  camframe decode 'sdcard/IMG_*.DAT' --format jpg\n  camframe inspect IMG_0001.DAT --stdout --pretty"
)]
struct Cli {
    /// Log debug details (overrides RUST_LOG)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode every frame of captured .dat files into images.
    #[command(
        after_help = "INPUT may be a file, a glob pattern, or a directory (scanned for IMG_*.DAT)."
    )]
    Decode {
        /// Capture file, glob pattern or directory
        input: PathBuf,

        /// Directory receiving the images
        #[arg(short = 'o', long, default_value = ".")]
        out_dir: PathBuf,

        /// Image encoding
        #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
        format: ImageFormat,

        #[command(flatten)]
        capture: CaptureArgs,
    },
    /// Write a JSON diagnostic report describing a capture file.
    Inspect {
        /// Capture file to inspect
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        capture: CaptureArgs,
    },
    /// Capture frames from a serial port and save each one as an image.
    Listen {
        /// Serial port name (auto-selected when omitted)
        #[arg(long)]
        port: Option<String>,

        /// Baud rate
        #[arg(long, default_value_t = serial::DEFAULT_BAUD)]
        baud: u32,

        /// Directory receiving the images
        #[arg(short = 'o', long, default_value = "captures")]
        out_dir: PathBuf,

        /// Stop after this many frames
        #[arg(long)]
        max_frames: Option<u64>,

        /// Image encoding
        #[arg(long, value_enum, default_value_t = ImageFormat::Jpg)]
        format: ImageFormat,

        #[command(flatten)]
        capture: CaptureArgs,
    },
    /// List available serial ports.
    Ports,
    /// Write a color-bar test frame, for checking the channel order.
    Synth {
        /// Output .dat path
        output: PathBuf,

        #[arg(long, default_value_t = 320)]
        width: u32,

        #[arg(long, default_value_t = 240)]
        height: u32,

        /// Category code written to the header
        #[arg(long, default_value_t = 2)]
        category: u32,

        /// Omit the checksum trailer
        #[arg(long)]
        no_checksum: bool,

        /// Checksum convention for the trailer
        #[arg(long, default_value_t = ChecksumConvention::Reflected)]
        checksum: ChecksumConvention,

        /// Channel order used to pack the bars
        #[arg(long, default_value_t = ChannelOrder::Rgb)]
        channel_order: ChannelOrder,
    },
}

/// Options shared by every command that runs the assembler.
#[derive(Args, Debug, Clone, Default)]
struct CaptureArgs {
    /// JSON file with capture settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Checksum convention (reflected | unreflected)
    #[arg(long)]
    checksum: Option<ChecksumConvention>,

    /// Channel receiving the top 5-bit field (rgb | bgr)
    #[arg(long)]
    channel_order: Option<ChannelOrder>,

    /// Sample byte order (big | little)
    #[arg(long)]
    byte_order: Option<ByteOrder>,

    /// Flip frames horizontally
    #[arg(long)]
    mirror: bool,

    /// Disable zero-sample interpolation
    #[arg(long)]
    no_repair: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Decode {
            input,
            out_dir,
            format,
            capture,
        } => cmd_decode(&input, &out_dir, format, &capture),
        Commands::Inspect {
            input,
            report,
            stdout,
            pretty,
            capture,
        } => cmd_inspect(&input, report, stdout, pretty, &capture),
        Commands::Listen {
            port,
            baud,
            out_dir,
            max_frames,
            format,
            capture,
        } => cmd_listen(port, baud, &out_dir, max_frames, format, &capture),
        Commands::Ports => cmd_ports(),
        Commands::Synth {
            output,
            width,
            height,
            category,
            no_checksum,
            checksum,
            channel_order,
        } => cmd_synth(
            &output,
            FrameHeader::rgb565(width, height, Category::from_code(category), !no_checksum),
            checksum,
            channel_order,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn build_config(args: &CaptureArgs) -> Result<CaptureConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => CaptureConfig::from_json_file(path).map_err(|err| {
            CliError::new(
                format!("cannot load config {}: {err}", path.display()),
                Some("expected a JSON object such as {\"checksum\": \"reflected\"}".to_string()),
            )
        })?,
        None => CaptureConfig::default(),
    };
    if let Some(checksum) = args.checksum {
        config.checksum = checksum;
    }
    if let Some(order) = args.channel_order {
        config.channel_order = order;
    }
    if let Some(order) = args.byte_order {
        config.byte_order = order;
    }
    if args.mirror {
        config.mirror = true;
    }
    if args.no_repair {
        config.repair_zero_threshold = None;
    }
    Ok(config)
}

fn cmd_decode(
    input: &Path,
    out_dir: &Path,
    format: ImageFormat,
    args: &CaptureArgs,
) -> Result<(), CliError> {
    let config = build_config(args)?;
    let inputs = resolve_inputs(input)?;
    output::ensure_dir(out_dir)?;

    let mut decoded_files = 0usize;
    let mut images = 0usize;
    for path in &inputs {
        match decode_one(path, out_dir, format, &config) {
            Ok(0) => {
                tracing::warn!(file = %path.display(), "no valid frame found");
            }
            Ok(count) => {
                decoded_files += 1;
                images += count;
            }
            Err(err) => {
                tracing::error!(file = %path.display(), "{err:#}");
            }
        }
    }

    eprintln!(
        "OK: {decoded_files}/{} files decoded, {images} images -> {}",
        inputs.len(),
        out_dir.display()
    );
    if decoded_files == 0 {
        return Err(CliError::new(
            "no frames decoded",
            Some("run `camframe inspect` on the input, or try --checksum unreflected".to_string()),
        ));
    }
    Ok(())
}

fn decode_one(
    path: &Path,
    out_dir: &Path,
    format: ImageFormat,
    config: &CaptureConfig,
) -> anyhow::Result<usize> {
    let decoded = decode_file(path, config)
        .with_context(|| format!("Failed to decode capture: {}", path.display()))?;
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let count = decoded.frames.len();

    for frame in decoded.frames {
        let name = if count == 1 {
            format!("{stem}_converted.{}", format.extension())
        } else {
            format!("{stem}_converted_{}.{}", frame.sequence, format.extension())
        };
        let target = out_dir.join(name);
        let category = frame.header.category;
        output::save_image(frame.image, &target, format)?;
        tracing::info!(file = %target.display(), %category, "image saved");
    }
    Ok(count)
}

fn cmd_inspect(
    input: &Path,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    args: &CaptureArgs,
) -> Result<(), CliError> {
    validate_input_file(input)?;
    let config = build_config(args)?;
    let rep = inspect_file(input, &config)
        .with_context(|| format!("Failed to inspect capture: {}", input.display()))?;
    let json = if pretty {
        serde_json::to_string_pretty(&rep)
    } else {
        serde_json::to_string(&rep)
    }
    .context("JSON serialization failed")?;

    if stdout {
        println!("{json}");
        return Ok(());
    }

    let report = report.ok_or_else(|| {
        CliError::new(
            "missing output path",
            Some("use -o/--report or --stdout".to_string()),
        )
    })?;
    if let Some(parent) = report.parent() {
        output::ensure_dir(parent)?;
    }
    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;
    eprintln!("OK: report written -> {}", report.display());
    Ok(())
}

fn cmd_listen(
    port: Option<String>,
    baud: u32,
    out_dir: &Path,
    max_frames: Option<u64>,
    format: ImageFormat,
    args: &CaptureArgs,
) -> Result<(), CliError> {
    let config = build_config(args)?;
    let port = match port {
        Some(port) => port,
        None => select_port()?,
    };
    output::ensure_dir(out_dir)?;

    let mut source = serial::SerialSource::open(&port, baud, config.read_timeout()).map_err(|err| {
        CliError::new(
            format!("cannot open serial port {port}: {err}"),
            Some("check the name with `camframe ports` and that no other program holds it".to_string()),
        )
    })?;

    let control = CaptureControl::new().with_max_frames(max_frames);
    install_interrupt_handler(control.stop_handle());
    let mut session = CaptureSession::new(&config);

    let summary = run_capture(&mut source, &mut session, &config, &control, |frame| {
        let name = artifact_file_name(
            OffsetDateTime::now_utc(),
            frame.header.category,
            frame.category_sequence,
            format.extension(),
        );
        let target = out_dir.join(name);
        output::save_image(frame.image, &target, format)?;
        tracing::info!(file = %target.display(), "image saved");
        Ok(())
    })
    .context("Capture failed")?;
    drop(source);

    print_summary(&summary);
    Ok(())
}

fn select_port() -> Result<String, CliError> {
    let ports = serial::list_ports().context("Failed to enumerate serial ports")?;
    let chosen = serial::auto_select(&ports).ok_or_else(|| {
        CliError::new(
            "no serial port found",
            Some("connect the camera or pass --port".to_string()),
        )
    })?;
    tracing::info!(port = %chosen.name, description = %chosen.description, "auto-selected serial port");
    Ok(chosen.name.clone())
}

/// Set `stop` on Ctrl-C. The capture loop checks it between reads.
fn install_interrupt_handler(stop: Arc<AtomicBool>) {
    let spawned = thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::warn!(%err, "Ctrl-C handling unavailable");
                    return;
                }
            };
            if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
                tracing::info!("interrupt received, stopping");
                stop.store(true, Ordering::SeqCst);
            }
        });
    if let Err(err) = spawned {
        tracing::warn!(%err, "Ctrl-C handling unavailable");
    }
}

fn print_summary(summary: &SessionSummary) {
    eprintln!(
        "OK: {} frames from {} in {:.1}s",
        summary.frames,
        summary.source,
        summary.elapsed_ms as f64 / 1000.0
    );
    for (code, count) in &summary.stats.frames_by_category {
        eprintln!("  {}: {count}", Category::from_code(*code));
    }
    let stats = &summary.stats;
    if stats.checksum_failures + stats.headers_rejected + stats.end_markers_missing > 0 {
        eprintln!(
            "  dropped: {} checksum, {} header, {} end marker",
            stats.checksum_failures, stats.headers_rejected, stats.end_markers_missing
        );
    }
}

fn cmd_ports() -> Result<(), CliError> {
    let ports = serial::list_ports().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        eprintln!("no serial ports found");
        return Ok(());
    }
    for port in ports {
        if port.description.is_empty() {
            println!("{}\t{}", port.name, port.kind);
        } else {
            println!("{}\t{}\t{}", port.name, port.kind, port.description);
        }
    }
    Ok(())
}

fn cmd_synth(
    output: &Path,
    header: FrameHeader,
    checksum: ChecksumConvention,
    channel_order: ChannelOrder,
) -> Result<(), CliError> {
    if header.width == 0 || header.height == 0 {
        return Err(CliError::new(
            "frame dimensions must be positive",
            Some("use --width and --height greater than zero".to_string()),
        ));
    }
    let payload = test_pattern(header.width, header.height, channel_order, ByteOrder::Big);
    let bytes = write_frame(&header, &payload, checksum);
    if let Some(parent) = output.parent() {
        output::ensure_dir(parent)?;
    }
    fs::write(output, bytes)
        .with_context(|| format!("Failed to write capture: {}", output.display()))?;
    eprintln!("OK: test frame written -> {} ({header})", output.display());
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a capture file such as IMG_0001.DAT".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a capture file such as IMG_0001.DAT".to_string()),
        ));
    }
    Ok(())
}

fn resolve_inputs(input: &Path) -> Result<Vec<PathBuf>, CliError> {
    let pattern = if input.is_dir() {
        input.join(BATCH_PATTERN).to_string_lossy().into_owned()
    } else {
        let pattern = input.to_string_lossy().into_owned();
        if !is_glob_pattern(&pattern) {
            validate_input_file(input)?;
            return Ok(vec![input.to_path_buf()]);
        }
        pattern
    };

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    matches.sort();
    Ok(matches)
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
