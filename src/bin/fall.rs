//! Fall CLI - Command-line interface for Synheart Fall
//!
//! Commands:
//! - replay: Replay recorded accelerometer samples into fall events (batch mode)
//! - run: Monitor a live sample stream on stdin (streaming mode)
//! - validate: Validate accelerometer sample schema
//! - doctor: Diagnose configuration and environment
//! - schema: Print input/output schema information
//! - config: Print the effective detector configuration

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use synheart_fall::config::{DetectorConfig, FreeFallConfig};
use synheart_fall::encoder::{FallEncoder, OUTPUT_SCHEMA_VERSION};
use synheart_fall::monitor::{FallMonitor, SensorListener, SensorSource, SensorSubscription};
use synheart_fall::pipeline::FallProcessor;
use synheart_fall::schema::{RawSample, SampleAdapter, SCHEMA_VERSION};
use synheart_fall::types::{FallEvent, FallPayload, FallRecord, FallSnapshot};
use synheart_fall::{FallError, FALL_VERSION, PRODUCER_NAME};

/// Fall - On-device fall detection from accelerometer streams
#[derive(Parser)]
#[command(name = "fall")]
#[command(author = "Synheart AI Inc")]
#[command(version = FALL_VERSION)]
#[command(about = "Detect falls in accelerometer data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded samples into fall events (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Device ID for provenance tracking
        #[arg(long, default_value = "unknown")]
        device_id: String,

        /// Also emit window max updates from the eviction tick
        #[arg(long)]
        include_window: bool,

        #[command(flatten)]
        detector: DetectorArgs,
    },

    /// Monitor a live NDJSON sample stream on stdin (streaming mode)
    Run {
        /// Device ID
        #[arg(long, default_value = "unknown")]
        device_id: String,

        /// Which clock stamps incoming readings
        #[arg(long, default_value = "arrival")]
        clock: Clock,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,

        #[command(flatten)]
        detector: DetectorArgs,
    },

    /// Validate accelerometer sample schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a detector configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },

    /// Print the effective detector configuration
    Config {
        #[command(flatten)]
        detector: DetectorArgs,
    },
}

/// Detector configuration file and per-threshold overrides
#[derive(Args, Clone, Default)]
struct DetectorArgs {
    /// Detector configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lower bound of the impact band
    #[arg(long)]
    impact_low: Option<f64>,

    /// Upper bound of the impact band
    #[arg(long)]
    impact_high: Option<f64>,

    /// Stabilization threshold
    #[arg(long)]
    stabilize_max: Option<f64>,

    /// Stabilization time required to count a fall (ms)
    #[arg(long)]
    stabilize_duration_ms: Option<u64>,

    /// Trailing window for the max magnitude (ms)
    #[arg(long)]
    window_duration_ms: Option<u64>,

    /// Eviction tick period (ms)
    #[arg(long)]
    eviction_interval_ms: Option<u64>,

    /// Require a free-fall phase before the impact
    #[arg(long)]
    free_fall: bool,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one sample per line)
    Ndjson,
    /// JSON array of samples
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum Clock {
    /// Stamp readings when they arrive
    Arrival,
    /// Use each sample's t_ms, counted from stream start
    Sample,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (accel.sample.v1)
    Input,
    /// Output schema (fall.event.v1)
    Output,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn run(cli: Cli) -> Result<(), FallCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            device_id,
            include_window,
            detector,
        } => cmd_replay(
            &input,
            &output,
            input_format,
            output_format,
            &device_id,
            include_window,
            &detector,
        ),

        Commands::Run {
            device_id,
            clock,
            flush,
            detector,
        } => cmd_run(&device_id, clock, flush, &detector),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),

        Commands::Config { detector } => {
            let config = load_config(&detector)?;
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    device_id: &str,
    include_window: bool,
    detector: &DetectorArgs,
) -> Result<(), FallCliError> {
    let config = load_config(detector)?;
    let input_data = read_input(input)?;

    let samples = parse_samples(&input_data, &input_format)?;
    if samples.is_empty() {
        return Err(FallCliError::NoSamples);
    }

    let readings = SampleAdapter::to_replay_readings(&samples)?;

    let mut processor = FallProcessor::with_config(config)?;
    let encoder = FallEncoder::new(device_id);

    let payloads: Vec<FallPayload> = processor
        .replay(&readings)
        .iter()
        .filter(|record| include_window || matches!(record, FallRecord::Fall(_)))
        .map(|record| encoder.encode(record))
        .collect();

    info!(
        samples = readings.len(),
        falls = processor.fall_count(),
        dropped = processor.dropped_samples(),
        "Replay complete"
    );

    let output_data = format_output(&payloads, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(
    device_id: &str,
    clock: Clock,
    flush: bool,
    detector: &DetectorArgs,
) -> Result<(), FallCliError> {
    let config = load_config(detector)?;
    let mut monitor = FallMonitor::new(config)?;
    let mut sensor = StdinSensor::new(clock);
    let encoder = FallEncoder::new(device_id);

    let alert = move |event: &FallEvent| {
        let record = FallRecord::Fall(event.clone());
        match encoder.encode_to_json(&record) {
            Ok(json) => {
                let mut stdout = io::stdout().lock();
                let written = writeln!(stdout, "{}", json)
                    .and_then(|_| if flush { stdout.flush() } else { Ok(()) });
                if let Err(e) = written {
                    warn!(error = %e, "Failed to write fall event");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode fall event"),
        }
    };

    let display = |snapshot: &FallSnapshot| {
        debug!(
            fall_count = snapshot.fall_count,
            window_max = snapshot.window_max,
            last_magnitude = snapshot.last_magnitude,
            phase = snapshot.phase.as_str(),
            "Monitor update"
        );
    };

    monitor.start(&mut sensor, alert, display)?;
    let snapshot = monitor.wait();

    info!(
        fall_count = snapshot.fall_count,
        dropped = snapshot.dropped_samples,
        "Stream ended"
    );
    io::stdout().flush()?;

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), FallCliError> {
    let input_data = read_input(input)?;
    let samples = parse_samples(&input_data, &input_format)?;

    let results = SampleAdapter::validate_samples(&samples);

    let report = ValidationReport {
        total_samples: samples.len(),
        valid_samples: samples.len() - results.len(),
        invalid_samples: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                event_id: r.event_id.clone(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total samples:   {}", report.total_samples);
        println!("Valid samples:   {}", report.valid_samples);
        println!("Invalid samples: {}", report.invalid_samples);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Sample {} (index {}): {}",
                    err.event_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_samples > 0 {
        Err(FallCliError::ValidationFailed(report.invalid_samples))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), FallCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "fall_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Fall version {}", FALL_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!(
            "Input schema: {}, output schema: {}",
            SCHEMA_VERSION, OUTPUT_SCHEMA_VERSION
        ),
    });

    let config_check = match config {
        None => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "No configuration file, using defaults".to_string(),
        },
        Some(path) if !path.exists() => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Configuration file does not exist".to_string(),
        },
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => match DetectorConfig::from_json(&content) {
                Ok(config) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Configuration valid (impact band {}-{}, stabilization {}ms, free-fall {})",
                        config.impact_low,
                        config.impact_high,
                        config.stabilize_duration_ms,
                        if config.free_fall.is_some() { "on" } else { "off" }
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read configuration file: {}", e),
            },
        },
    };
    checks.push(config_check);

    // Check stdin is available (for streaming mode)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: FALL_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Fall Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(FallCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), FallCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One record per accelerometer reading:");
                println!();
                println!("- schema_version: optional, defaults to {}", SCHEMA_VERSION);
                println!("- event_id: optional sample identifier");
                println!("- t_ms: monotonic timestamp in milliseconds from stream start");
                println!("- x, y, z: acceleration per axis (finite numbers)");
                println!("- device_id: optional originating device");
                println!();
                println!("Timestamps must not go backwards within a batch.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: {}", OUTPUT_SCHEMA_VERSION);
                println!();
                println!("- schema_version: {}", OUTPUT_SCHEMA_VERSION);
                println!("- producer: {{ name, version, instance_id }}");
                println!("- provenance: {{ source_device_id, computed_at_utc }}");
                println!("- record: one of");
                println!("  - type \"fall\": {{ fall_count, detected_at_ms, impact_at_ms, stabilization_started_at_ms, magnitude }}");
                println!("  - type \"window_max\": {{ at_ms, max_magnitude, samples_in_window }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, FallCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_samples(input_data: &str, format: &InputFormat) -> Result<Vec<RawSample>, FallCliError> {
    let samples = match format {
        InputFormat::Ndjson => SampleAdapter::parse_ndjson(input_data)?,
        InputFormat::Json => SampleAdapter::parse_array(input_data)?,
    };
    Ok(samples)
}

fn load_config(args: &DetectorArgs) -> Result<DetectorConfig, FallCliError> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_json(&fs::read_to_string(path)?)?,
        None => DetectorConfig::default(),
    };

    if let Some(value) = args.impact_low {
        config.impact_low = value;
    }
    if let Some(value) = args.impact_high {
        config.impact_high = value;
    }
    if let Some(value) = args.stabilize_max {
        config.stabilize_max = value;
    }
    if let Some(value) = args.stabilize_duration_ms {
        config.stabilize_duration_ms = value;
    }
    if let Some(value) = args.window_duration_ms {
        config.window_duration_ms = value;
    }
    if let Some(value) = args.eviction_interval_ms {
        config.eviction_interval_ms = value;
    }
    if args.free_fall && config.free_fall.is_none() {
        config.free_fall = Some(FreeFallConfig::default());
    }

    config.validate()?;
    Ok(config)
}

fn format_output(payloads: &[FallPayload], format: &OutputFormat) -> Result<String, FallCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for payload in payloads {
                out.push_str(&serde_json::to_string(payload)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(payloads)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(payloads)? + "\n"),
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/accel.sample.v1.json",
        "title": "accel.sample.v1",
        "description": "Synheart accelerometer sample schema",
        "type": "object",
        "required": ["t_ms", "x", "y", "z"],
        "properties": {
            "schema_version": {
                "type": "string",
                "const": "accel.sample.v1"
            },
            "event_id": { "type": "string" },
            "t_ms": { "type": "integer", "minimum": 0 },
            "x": { "type": "number" },
            "y": { "type": "number" },
            "z": { "type": "number" },
            "device_id": { "type": "string" }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/fall.event.v1.json",
        "title": "fall.event.v1",
        "description": "Synheart fall detection output schema",
        "type": "object",
        "required": ["schema_version", "producer", "provenance", "record"],
        "properties": {
            "schema_version": { "type": "string", "const": "fall.event.v1" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "provenance": {
                "type": "object",
                "properties": {
                    "source_device_id": { "type": "string" },
                    "computed_at_utc": { "type": "string", "format": "date-time" }
                }
            },
            "record": {
                "oneOf": [
                    {
                        "type": "object",
                        "required": ["type", "fall_count", "detected_at_ms", "impact_at_ms", "stabilization_started_at_ms", "magnitude"],
                        "properties": {
                            "type": { "const": "fall" },
                            "fall_count": { "type": "integer" },
                            "detected_at_ms": { "type": "integer" },
                            "impact_at_ms": { "type": "integer" },
                            "stabilization_started_at_ms": { "type": "integer" },
                            "magnitude": { "type": "number" }
                        }
                    },
                    {
                        "type": "object",
                        "required": ["type", "at_ms", "max_magnitude", "samples_in_window"],
                        "properties": {
                            "type": { "const": "window_max" },
                            "at_ms": { "type": "integer" },
                            "max_magnitude": { "type": "number" },
                            "samples_in_window": { "type": "integer" }
                        }
                    }
                ]
            }
        }
    })
    .to_string()
}

// Stdin sensor

/// Sensor source fed by NDJSON accel.sample.v1 lines on stdin
struct StdinSensor {
    clock: Clock,
    stopped: Arc<AtomicBool>,
}

impl StdinSensor {
    fn new(clock: Clock) -> Self {
        Self {
            clock,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct StdinSubscription {
    stopped: Arc<AtomicBool>,
}

impl SensorSubscription for StdinSubscription {
    fn remove(&mut self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

impl SensorSource for StdinSensor {
    fn is_available(&self) -> bool {
        true
    }

    fn set_update_interval(&mut self, interval: Duration) {
        // The producer on the other end of the pipe sets the rate
        debug!(
            interval_ms = interval.as_millis() as u64,
            "Requested sample interval"
        );
    }

    fn subscribe(
        &mut self,
        listener: SensorListener,
    ) -> Result<Box<dyn SensorSubscription>, FallError> {
        let clock = self.clock;
        let stopped = Arc::clone(&self.stopped);

        thread::Builder::new()
            .name("stdin-sensor".to_string())
            .spawn(move || read_stdin(listener, clock, stopped))
            .map_err(|e| FallError::Subscription(format!("failed to start stdin reader: {e}")))?;

        Ok(Box::new(StdinSubscription {
            stopped: Arc::clone(&self.stopped),
        }))
    }
}

fn read_stdin(listener: SensorListener, clock: Clock, stopped: Arc<AtomicBool>) {
    let stdin = io::stdin();

    for (line_num, line) in stdin.lock().lines().enumerate() {
        if stopped.load(Ordering::Relaxed) {
            return;
        }

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Failed to read stdin");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let sample: RawSample = match serde_json::from_str(trimmed) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(line = line_num + 1, error = %e, "Skipping unparseable sample");
                continue;
            }
        };

        if let Err(e) = sample.validate() {
            warn!(line = line_num + 1, error = %e, "Skipping invalid sample");
            continue;
        }

        let delivered = match clock {
            Clock::Arrival => listener.emit(sample.x, sample.y, sample.z),
            Clock::Sample => listener.emit_at(
                Duration::from_millis(sample.t_ms),
                sample.x,
                sample.y,
                sample.z,
            ),
        };
        if !delivered {
            return;
        }
    }

    listener.close();
}

// Error types

#[derive(Debug)]
enum FallCliError {
    Io(io::Error),
    Fall(FallError),
    Json(serde_json::Error),
    NoSamples,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for FallCliError {
    fn from(e: io::Error) -> Self {
        FallCliError::Io(e)
    }
}

impl From<FallError> for FallCliError {
    fn from(e: FallError) -> Self {
        FallCliError::Fall(e)
    }
}

impl From<serde_json::Error> for FallCliError {
    fn from(e: serde_json::Error) -> Self {
        FallCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FallCliError> for CliError {
    fn from(e: FallCliError) -> Self {
        match e {
            FallCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FallCliError::Fall(e) => {
                let (code, hint) = match &e {
                    FallError::InvalidConfig(_) => (
                        "CONFIG_ERROR",
                        "Run 'fall config' to inspect the effective configuration",
                    ),
                    FallError::ParseError(_) | FallError::JsonError(_) => (
                        "PARSE_ERROR",
                        "Ensure input matches the accel.sample.v1 schema",
                    ),
                    FallError::SensorUnavailable | FallError::Subscription(_) => {
                        ("SENSOR_ERROR", "Run 'fall doctor' to check the environment")
                    }
                    _ => ("FALL_ERROR", "Run with RUST_LOG=debug for details"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            FallCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FallCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            FallCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} samples failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            FallCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_samples: usize,
    valid_samples: usize,
    invalid_samples: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    event_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
