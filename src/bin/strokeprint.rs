//! Strokeprint CLI - Command-line interface for Strokeprint
//!
//! Commands:
//! - extract: Derive a feature set from a capture
//! - compare: Compare two stored feature sets
//! - verify: Extract and compare two captures
//! - validate: Validate capture structure and values
//! - enroll: Add a baseline version to a baselines file
//! - authenticate: Score a capture against an enrolled baseline
//! - doctor: Diagnose configuration and baselines
//! - config: Print the effective configuration

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use strokeprint::baseline::BaselineRegistry;
use strokeprint::config::EngineConfig;
use strokeprint::features::FeatureExtractor;
use strokeprint::scorer::SimilarityScorer;
use strokeprint::types::{BiometricFeatureSet, BiometricType};
use strokeprint::validator::validate_capture;
use strokeprint::{AuthProcessor, ComputeError, RawCaptureAdapter, PRODUCER_NAME, STROKEPRINT_VERSION};

/// Strokeprint - Stroke biometric feature extraction and similarity scoring
#[derive(Parser)]
#[command(name = "strokeprint")]
#[command(version = STROKEPRINT_VERSION)]
#[command(about = "Extract stroke biometrics and score signature matches", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON); omitted fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a feature set from a capture
    Extract {
        /// Input capture file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Compare two stored feature sets
    Compare {
        /// Reference feature set file
        #[arg(long)]
        reference: PathBuf,

        /// Candidate feature set file
        #[arg(long)]
        candidate: PathBuf,
    },

    /// Extract and compare two captures
    Verify {
        /// Reference capture file
        #[arg(long)]
        reference: PathBuf,

        /// Candidate capture file (use - for stdin)
        #[arg(long)]
        candidate: PathBuf,
    },

    /// Validate capture structure and values
    Validate {
        /// Input capture file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a baseline version built from one or more captures
    Enroll {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Biometric type (signature, shape, drawing)
        #[arg(long = "type", default_value = "signature")]
        biometric_type: BiometricType,

        /// Baselines file; created if missing, updated in place
        #[arg(long)]
        baselines: PathBuf,

        /// Capture files to enroll
        #[arg(required = true)]
        captures: Vec<PathBuf>,
    },

    /// Score a capture against the user's latest baseline
    Authenticate {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Biometric type (signature, shape, drawing)
        #[arg(long = "type", default_value = "signature")]
        biometric_type: BiometricType,

        /// Baselines file
        #[arg(long)]
        baselines: PathBuf,

        /// Candidate capture file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Diagnose configuration and baselines
    Doctor {
        /// Check baselines file
        #[arg(long)]
        baselines: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as JSON
    Config,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

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

fn run(cli: Cli) -> Result<(), StrokeprintCliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { input, output } => cmd_extract(&config, &input, &output),
        Commands::Compare {
            reference,
            candidate,
        } => cmd_compare(&config, &reference, &candidate),
        Commands::Verify {
            reference,
            candidate,
        } => cmd_verify(&config, &reference, &candidate),
        Commands::Validate { input, json } => cmd_validate(&input, json),
        Commands::Enroll {
            user,
            biometric_type,
            baselines,
            captures,
        } => cmd_enroll(config, &user, biometric_type, &baselines, &captures),
        Commands::Authenticate {
            user,
            biometric_type,
            baselines,
            input,
        } => cmd_authenticate(config, &user, biometric_type, &baselines, &input),
        Commands::Doctor { baselines, json } => {
            cmd_doctor(cli.config.as_deref(), baselines.as_deref(), json)
        }
        Commands::Config => {
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn cmd_extract(config: &EngineConfig, input: &Path, output: &Path) -> Result<(), StrokeprintCliError> {
    let collection = RawCaptureAdapter::from_json(&read_input(input)?)?;
    let features = FeatureExtractor::new(config.extractor.clone()).extract(&collection);
    let json = serde_json::to_string_pretty(&features)?;

    if output.to_string_lossy() == "-" {
        println!("{}", json);
    } else {
        fs::write(output, json)?;
    }
    Ok(())
}

fn cmd_compare(
    config: &EngineConfig,
    reference: &Path,
    candidate: &Path,
) -> Result<(), StrokeprintCliError> {
    let reference: BiometricFeatureSet = serde_json::from_str(&read_input(reference)?)?;
    let candidate: BiometricFeatureSet = serde_json::from_str(&read_input(candidate)?)?;

    let result = SimilarityScorer::new(config.scorer.clone()).compare(&reference, &candidate);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_verify(
    config: &EngineConfig,
    reference: &Path,
    candidate: &Path,
) -> Result<(), StrokeprintCliError> {
    let extractor = FeatureExtractor::new(config.extractor.clone());
    let reference = extractor.extract(&RawCaptureAdapter::from_json(&read_input(reference)?)?);
    let candidate = extractor.extract(&RawCaptureAdapter::from_json(&read_input(candidate)?)?);

    let result = SimilarityScorer::new(config.scorer.clone()).compare(&reference, &candidate);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), StrokeprintCliError> {
    let capture = RawCaptureAdapter::parse(&read_input(input)?)?;
    let validation = validate_capture(&capture);

    let report = ValidationReport {
        stroke_count: capture.strokes().len(),
        point_count: capture
            .strokes()
            .iter()
            .filter_map(|s| s.points())
            .map(|p| p.len())
            .sum(),
        valid: validation.is_valid(),
        errors: validation.issues.iter().map(|e| e.to_string()).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Strokes: {}", report.stroke_count);
        println!("Points:  {}", report.point_count);
        println!("Valid:   {}", report.valid);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {}", err);
            }
        }
    }

    if report.errors.is_empty() {
        Ok(())
    } else {
        Err(StrokeprintCliError::ValidationFailed(report.errors.len()))
    }
}

fn cmd_enroll(
    config: EngineConfig,
    user: &str,
    biometric_type: BiometricType,
    baselines: &Path,
    captures: &[PathBuf],
) -> Result<(), StrokeprintCliError> {
    let mut processor = AuthProcessor::with_config(config)?;
    if baselines.exists() {
        processor.load_baselines(&fs::read_to_string(baselines)?)?;
    }

    let capture_data = captures
        .iter()
        .map(|path| read_input(path))
        .collect::<Result<Vec<_>, _>>()?;
    let refs: Vec<&str> = capture_data.iter().map(String::as_str).collect();

    let baseline = processor.enroll(user, biometric_type, &refs)?;
    fs::write(baselines, processor.save_baselines()?)?;

    let summary = serde_json::json!({
        "user_id": baseline.user_id,
        "biometric_type": baseline.biometric_type,
        "baseline_id": baseline.id,
        "version": baseline.version,
        "sample_count": baseline.samples.len(),
        "consistency": baseline.consistency(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_authenticate(
    config: EngineConfig,
    user: &str,
    biometric_type: BiometricType,
    baselines: &Path,
    input: &Path,
) -> Result<(), StrokeprintCliError> {
    let mut processor = AuthProcessor::with_config(config)?;
    processor.load_baselines(&fs::read_to_string(baselines)?)?;

    let record = processor.authenticate_json(user, biometric_type, &read_input(input)?)?;
    println!("{}", record);
    Ok(())
}

fn cmd_doctor(
    config: Option<&Path>,
    baselines: Option<&Path>,
    json: bool,
) -> Result<(), StrokeprintCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "strokeprint_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Strokeprint version {}", STROKEPRINT_VERSION),
    });

    // Check config file if provided
    match config {
        Some(path) => checks.push(match load_config(Some(path)) {
            Ok(_) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!("Config file {} is valid", path.display()),
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: CliError::from(e).message,
            },
        }),
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default configuration".to_string(),
        }),
    }

    if let Some(path) = baselines {
        checks.push(check_baselines(path));
    }

    // Check stdin is available (for piped captures)
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
            message: "stdin is a pipe (captures can be piped with -i -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: STROKEPRINT_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Strokeprint Doctor Report");
        println!("=========================");
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
        Err(StrokeprintCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn check_baselines(path: &Path) -> DoctorCheck {
    let (status, message) = if !path.exists() {
        (CheckStatus::Warning, "Baselines file does not exist".to_string())
    } else {
        match fs::read_to_string(path) {
            Err(e) => (CheckStatus::Error, format!("Cannot read baselines file: {}", e)),
            Ok(content) => match BaselineRegistry::from_json(&content) {
                Ok(registry) if registry.is_empty() => {
                    (CheckStatus::Warning, "Baselines file holds no enrollments".to_string())
                }
                Ok(registry) => (
                    CheckStatus::Ok,
                    format!("Baselines file valid ({} enrolled user/type pairs)", registry.len()),
                ),
                Err(e) => (CheckStatus::Error, format!("Invalid baselines JSON: {}", e)),
            },
        }
    };

    DoctorCheck {
        name: "baselines".to_string(),
        status,
        message,
    }
}

fn read_input(path: &Path) -> Result<String, StrokeprintCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, StrokeprintCliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(EngineConfig::default()),
    }
}

// Error types

#[derive(Debug)]
enum StrokeprintCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for StrokeprintCliError {
    fn from(e: io::Error) -> Self {
        StrokeprintCliError::Io(e)
    }
}

impl From<ComputeError> for StrokeprintCliError {
    fn from(e: ComputeError) -> Self {
        StrokeprintCliError::Compute(e)
    }
}

impl From<serde_json::Error> for StrokeprintCliError {
    fn from(e: serde_json::Error) -> Self {
        StrokeprintCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<StrokeprintCliError> for CliError {
    fn from(e: StrokeprintCliError) -> Self {
        match e {
            StrokeprintCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            StrokeprintCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::ConfigError(_) => {
                        ("CONFIG_ERROR", "Run 'strokeprint config' to see a valid configuration")
                    }
                    ComputeError::Validation(_) => {
                        ("VALIDATION_ERROR", "Run 'strokeprint validate' for details")
                    }
                    _ => ("COMPUTE_ERROR", "Ensure input is a stroke capture or feature set"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            StrokeprintCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            StrokeprintCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} validation issues found", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            StrokeprintCliError::DoctorFailed => CliError {
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
    stroke_count: usize,
    point_count: usize,
    valid: bool,
    errors: Vec<String>,
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
