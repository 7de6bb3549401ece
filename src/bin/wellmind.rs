//! WellMind CLI - Command-line interface for WellMind Vision
//!
//! Commands:
//! - analyze: Emotion analysis with stress and fatigue
//! - wellness: Wellness score with score-derived tiers
//! - faces: Per-face summary of every detection
//! - simple: Landmark-geometry mood estimate
//! - doctor: Diagnose configuration and environment
//! - schema: Print input/output schema information
//!
//! Input is recorded detector output in the wellmind.detections.v1 format.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wellmind_vision::detector::BASIC_RECOGNITION;
use wellmind_vision::encoder::{ErrorResponse, ResponseEncoder};
use wellmind_vision::schema::{DetectionRecord, EvidenceAdapter, SCHEMA_VERSION};
use wellmind_vision::{
    DecisionPipeline, ModelInfo, PipelineConfig, VisionError, PRODUCER_NAME, WELLMIND_VERSION,
};

/// WellMind - Emotion to wellness decision pipeline
#[derive(Parser)]
#[command(name = "wellmind")]
#[command(author = "WellMind Team")]
#[command(version = WELLMIND_VERSION)]
#[command(about = "Turn face detections into wellness assessments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emotion analysis of the most confident face
    Analyze(RunArgs),

    /// Wellness score of the most confident face
    Wellness(RunArgs),

    /// Summary of every detected face
    Faces(RunArgs),

    /// Mood estimate from landmark geometry
    Simple(RunArgs),

    /// Diagnose configuration and environment
    Doctor {
        /// Check a pipeline config file
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
}

#[derive(Args)]
struct RunArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Output file path (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Input format
    #[arg(long, default_value = "json")]
    input_format: InputFormat,

    /// Output format
    #[arg(long, default_value = "json-pretty")]
    output_format: OutputFormat,

    /// Pipeline config JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore recorded emotion scores, as if no emotion classifier were deployed
    #[arg(long)]
    no_classifier: bool,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// A single JSON record or a JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one response per line)
    Ndjson,
    /// JSON array of responses
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (wellmind.detections.v1)
    Input,
    /// Output schema (response envelopes)
    Output,
}

#[derive(Clone, Copy, Debug)]
enum Operation {
    Analyze,
    Wellness,
    Faces,
    Simple,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), WellmindCliError> {
    match cli.command {
        Commands::Analyze(args) => cmd_process(Operation::Analyze, &args),
        Commands::Wellness(args) => cmd_process(Operation::Wellness, &args),
        Commands::Faces(args) => cmd_process(Operation::Faces, &args),
        Commands::Simple(args) => cmd_process(Operation::Simple, &args),
        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_process(operation: Operation, args: &RunArgs) -> Result<(), WellmindCliError> {
    let config = match &args.config {
        Some(path) => PipelineConfig::from_json(&fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };
    let pipeline = DecisionPipeline::from_config(&config);
    let encoder = ResponseEncoder::new();

    let input_data = read_input(&args.input)?;
    let records = match args.input_format {
        InputFormat::Ndjson => EvidenceAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json if input_data.trim_start().starts_with('[') => {
            EvidenceAdapter::parse_array(&input_data)?
        }
        InputFormat::Json => vec![EvidenceAdapter::parse_record(&input_data)?],
    };

    if records.is_empty() {
        return Err(WellmindCliError::NoRecords);
    }
    debug!(records = records.len(), ?operation, "processing detection records");

    let mut models = ModelInfo::replay();
    if args.no_classifier {
        models.emotion_recognition = BASIC_RECOGNITION.to_string();
    }

    let mut responses = Vec::with_capacity(records.len());
    for record in records {
        let record = if args.no_classifier {
            without_emotion_scores(record)
        } else {
            record
        };

        let mut response = match respond(&pipeline, &encoder, &models, operation, &record) {
            Ok(value) => value,
            // One empty frame should not sink a batch
            Err(e) if e.is_client_error() => serde_json::to_value(ErrorResponse::from_error(&e))?,
            Err(e) => return Err(e.into()),
        };

        if let (Some(image_id), Some(object)) = (&record.image_id, response.as_object_mut()) {
            object.insert("image_id".to_string(), serde_json::Value::String(image_id.clone()));
        }
        responses.push(response);
    }

    write_output(&args.output, &format_output(&responses, &args.output_format)?)
}

fn respond(
    pipeline: &DecisionPipeline,
    encoder: &ResponseEncoder,
    models: &ModelInfo,
    operation: Operation,
    record: &DetectionRecord,
) -> Result<serde_json::Value, VisionError> {
    let evidence = EvidenceAdapter::record_to_evidence(record)?;
    let value = match operation {
        Operation::Analyze => {
            serde_json::to_value(encoder.emotion_analysis(pipeline.analyze_emotion(&evidence)?, models))?
        }
        Operation::Wellness => {
            serde_json::to_value(encoder.wellness_score(pipeline.wellness_score(&evidence)?))?
        }
        Operation::Faces => {
            serde_json::to_value(encoder.face_analysis(pipeline.detect_faces(&evidence), models))?
        }
        Operation::Simple => {
            serde_json::to_value(encoder.simple_mood(pipeline.analyze_simple(&evidence)?))?
        }
    };
    Ok(value)
}

/// Drop recorded classifier output so every face takes the fallback path
fn without_emotion_scores(mut record: DetectionRecord) -> DetectionRecord {
    for face in &mut record.faces {
        face.emotion = None;
    }
    record
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), WellmindCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "wellmind_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("WellMind version {}", WELLMIND_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    match config {
        Some(path) if path.exists() => {
            let check = match fs::read_to_string(path) {
                Ok(content) => match PipelineConfig::from_json(&content) {
                    Ok(config) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (stress threshold {}, wellness cutoffs {}/{})",
                            config.stress_confidence_threshold,
                            config.wellness_low_cutoff,
                            config.wellness_medium_cutoff
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
                    message: format!("Cannot read config file: {}", e),
                },
            };
            checks.push(check);
        }
        Some(_) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Config file does not exist".to_string(),
        }),
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default thresholds".to_string(),
        }),
    }

    checks.push(DoctorCheck {
        name: "emotion_classifier".to_string(),
        status: CheckStatus::Warning,
        message: format!(
            "No live classifier in the CLI; recorded scores are replayed, --no-classifier uses {}",
            BASIC_RECOGNITION
        ),
    });

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for --input -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: WELLMIND_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("WellMind Doctor Report");
        println!("======================");
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

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(WellmindCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), WellmindCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One record per image:");
                println!();
                println!("- schema_version: \"{}\" (optional)", SCHEMA_VERSION);
                println!("- image_id: caller identifier echoed in output (optional)");
                println!("- emotion_scale: \"percent\" (default) or \"unit\"");
                println!("- faces: array of detections, each with");
                println!("  - box: [x, y, width, height] in pixels");
                println!("  - confidence: detection confidence in [0, 1]");
                println!("  - keypoints: {{ left_eye, right_eye, nose, mouth_left, mouth_right }} as [x, y]");
                println!("  - emotion: {{ label: score }} (optional; missing means no classifier output)");
                println!();
                println!("Emotion labels: happy, sad, angry, fear, surprise, disgust, neutral");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: response envelopes");
                println!();
                println!("Every response carries:");
                println!("- timestamp: RFC 3339 UTC");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- image_id: echoed from the input record when present");
                println!();
                println!("analyze:  detected_faces, face_id, dominant_emotion, emotion_scores,");
                println!("          stress_level, fatigue_detected, confidence, recommendations,");
                println!("          emotion_source, model_info");
                println!("wellness: wellness_score (0-100), emotion, stress_level, fatigue_level,");
                println!("          recommendations, confidence");
                println!("faces:    faces_detected, face_locations, emotions_per_face, overall_mood,");
                println!("          models_used");
                println!("simple:   detected_faces, estimated_mood, confidence, stress_level,");
                println!("          recommendations, note");
                println!();
                println!("Records without a usable face produce {{ error, code, status_code, timestamp }}.");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, WellmindCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), WellmindCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn format_output(
    responses: &[serde_json::Value],
    format: &OutputFormat,
) -> Result<String, WellmindCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for response in responses {
                lines.push(serde_json::to_string(response)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(responses)? + "\n"),
        OutputFormat::JsonPretty => {
            // A single record prints as an object, batches as an array
            let body = match responses {
                [single] => serde_json::to_string_pretty(single)?,
                _ => serde_json::to_string_pretty(responses)?,
            };
            Ok(body + "\n")
        }
    }
}

fn get_input_json_schema() -> String {
    let point = serde_json::json!({
        "type": "array",
        "items": { "type": "number" },
        "minItems": 2,
        "maxItems": 2
    });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "description": "Recorded face detector output for one image",
        "type": "object",
        "properties": {
            "schema_version": { "type": "string", "const": SCHEMA_VERSION },
            "image_id": { "type": "string" },
            "emotion_scale": { "type": "string", "enum": ["unit", "percent"] },
            "faces": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["box", "confidence", "keypoints"],
                    "properties": {
                        "box": {
                            "type": "array",
                            "items": { "type": "number" },
                            "minItems": 4,
                            "maxItems": 4
                        },
                        "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
                        "keypoints": {
                            "type": "object",
                            "required": ["left_eye", "right_eye", "nose", "mouth_left", "mouth_right"],
                            "properties": {
                                "left_eye": point,
                                "right_eye": point,
                                "nose": point,
                                "mouth_left": point,
                                "mouth_right": point
                            }
                        },
                        "emotion": {
                            "type": "object",
                            "additionalProperties": { "type": "number" }
                        }
                    }
                }
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    let level = serde_json::json!({ "type": "string", "enum": ["Low", "Medium", "High"] });
    let strings = serde_json::json!({ "type": "array", "items": { "type": "string" } });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "wellmind.response",
        "description": "WellMind response envelope",
        "type": "object",
        "required": ["timestamp"],
        "properties": {
            "timestamp": { "type": "string", "format": "date-time" },
            "image_id": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "dominant_emotion": { "type": "string" },
            "emotion_scores": {
                "type": "object",
                "additionalProperties": { "type": "number" }
            },
            "stress_level": level,
            "fatigue_level": level,
            "fatigue_detected": { "type": "boolean" },
            "wellness_score": { "type": "number", "minimum": 0, "maximum": 100 },
            "confidence": { "type": "number" },
            "recommendations": strings,
            "faces_detected": { "type": "integer" },
            "overall_mood": { "type": "string" },
            "estimated_mood": { "type": "string", "enum": ["positive", "neutral", "negative"] },
            "error": { "type": "string" },
            "code": { "type": "string" },
            "status_code": { "type": "integer" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum WellmindCliError {
    Io(io::Error),
    Vision(VisionError),
    Json(serde_json::Error),
    NoRecords,
    DoctorFailed,
}

impl From<io::Error> for WellmindCliError {
    fn from(e: io::Error) -> Self {
        WellmindCliError::Io(e)
    }
}

impl From<VisionError> for WellmindCliError {
    fn from(e: VisionError) -> Self {
        WellmindCliError::Vision(e)
    }
}

impl From<serde_json::Error> for WellmindCliError {
    fn from(e: serde_json::Error) -> Self {
        WellmindCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<WellmindCliError> for CliError {
    fn from(e: WellmindCliError) -> Self {
        match e {
            WellmindCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            WellmindCliError::Vision(e) => {
                let hint = match &e {
                    VisionError::ConfigError(_) => "Run 'wellmind doctor --config <file>' for details",
                    VisionError::JsonError(_) => "Check JSON syntax",
                    _ => "Ensure input matches the wellmind.detections.v1 schema",
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            WellmindCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            WellmindCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No detection records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            WellmindCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

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
