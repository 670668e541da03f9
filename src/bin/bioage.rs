//! BioAge CLI - Command-line interface for the BioAge engine
//!
//! Commands:
//! - score: Score a bio-age request (JSON) into a result
//! - config: Print the default configuration
//! - metrics: List the metric catalogue
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bioage_engine::{
    BioAgeConfig, BioAgeEngine, BioAgeRequest, BioAgeResult, ComputeError, Domain, MetricKey,
    CONFIG_VERSION, ENGINE_VERSION, PRODUCER_NAME,
};

/// BioAge - biological age scoring from wearable metrics
#[derive(Parser)]
#[command(name = "bioage")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score biological age from wearable metrics", long_about = None)]
struct Cli {
    /// Emit engine logs to stderr (filter with RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a bio-age request
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Configuration file (JSON, partial allowed)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Print the default configuration as JSON
    Config,

    /// List the metric keys the engine scores
    Metrics {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Configuration file to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Human-readable summary
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        init_logging();
    }

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

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bioage_engine=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), BioAgeCliError> {
    match cli.command {
        Commands::Score {
            input,
            output,
            config,
            output_format,
        } => cmd_score(&input, &output, config.as_deref(), output_format),
        Commands::Config => cmd_config(),
        Commands::Metrics { json } => cmd_metrics(json),
        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_score(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    output_format: OutputFormat,
) -> Result<(), BioAgeCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let request: BioAgeRequest = serde_json::from_str(&input_data)
        .map_err(|e| BioAgeCliError::ParseError(format!("Failed to parse request: {}", e)))?;

    let engine = match config {
        Some(path) => BioAgeEngine::new(BioAgeConfig::from_json(&fs::read_to_string(path)?)?)?,
        None => BioAgeEngine::default(),
    };

    let result = engine.calculate(&request)?;

    let output_data = match output_format {
        OutputFormat::Json => serde_json::to_string(&result)? + "\n",
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&result)? + "\n",
        OutputFormat::Text => format_summary(&result),
    };

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_config() -> Result<(), BioAgeCliError> {
    println!("{}", BioAgeConfig::default().to_json()?);
    Ok(())
}

fn cmd_metrics(json: bool) -> Result<(), BioAgeCliError> {
    let entries: Vec<MetricInfo> = MetricKey::ALL
        .iter()
        .map(|key| MetricInfo {
            key: key.as_str().to_string(),
            label: key.label().to_string(),
            unit: key.unit().to_string(),
            domain: key.domain().map(|d| d.as_str().to_string()),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("Metric Catalogue");
        println!("================");
        for domain in Domain::ALL {
            println!("\n{} ({})", domain.label(), domain.as_str());
            for entry in entries
                .iter()
                .filter(|e| e.domain.as_deref() == Some(domain.as_str()))
            {
                println!("  - {:<20} {:<26} [{}]", entry.key, entry.label, entry.unit);
            }
        }
        println!("\nCircadian features are supplied as a pre-computed bundle, not as metrics.");
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), BioAgeCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Engine version {}", ENGINE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "default_config".to_string(),
        status: match BioAgeConfig::default().validate() {
            Ok(()) => CheckStatus::Ok,
            Err(_) => CheckStatus::Error,
        },
        message: format!("Built-in configuration: {}", CONFIG_VERSION),
    });

    if let Some(config_path) = config {
        let check = if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match BioAgeConfig::from_json(&content) {
                    Ok(loaded) => {
                        let status = if loaded.version == CONFIG_VERSION {
                            CheckStatus::Ok
                        } else {
                            CheckStatus::Warning
                        };
                        DoctorCheck {
                            name: "config".to_string(),
                            status,
                            message: format!("Config file valid (version {})", loaded.version),
                        }
                    }
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid config: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                },
            }
        } else {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            }
        };
        checks.push(check);
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input FILE to score)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("BioAge Doctor Report");
        println!("====================");
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
        Err(BioAgeCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn format_summary(result: &BioAgeResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Bio age:        {:.1} (chronological {:.1})\n",
        result.bio_age, result.chronological_age
    ));
    out.push_str(&format!("Age gap:        {:+.2} years\n", result.age_gap));
    out.push_str(&format!("Pace of aging:  {:.2}\n", result.pace_of_aging));

    if result.domains.is_empty() {
        out.push_str("\nNo scoreable metrics.\n");
        return out;
    }

    out.push_str("\nDomains:\n");
    for domain in &result.domains {
        out.push_str(&format!(
            "  {:<26} {:+6.2} y  weight {:.2}  quality {:.2}\n",
            domain.label, domain.gap, domain.weight, domain.quality
        ));
        for metric in &domain.metrics {
            let mut flags = Vec::new();
            if !metric.fresh {
                flags.push("stale");
            }
            if metric.is_override {
                flags.push("override");
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            };
            out.push_str(&format!(
                "    - {}: {} {}{}\n",
                metric.label, metric.value, metric.unit, flags
            ));
        }
    }
    out
}

// Error handling

#[derive(Debug)]
enum BioAgeCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    ParseError(String),
    DoctorFailed,
}

impl From<io::Error> for BioAgeCliError {
    fn from(e: io::Error) -> Self {
        BioAgeCliError::Io(e)
    }
}

impl From<ComputeError> for BioAgeCliError {
    fn from(e: ComputeError) -> Self {
        BioAgeCliError::Compute(e)
    }
}

impl From<serde_json::Error> for BioAgeCliError {
    fn from(e: serde_json::Error) -> Self {
        BioAgeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BioAgeCliError> for CliError {
    fn from(e: BioAgeCliError) -> Self {
        match e {
            BioAgeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BioAgeCliError::Compute(ComputeError::InvalidChronologicalAge(age)) => CliError {
                code: "INVALID_AGE".to_string(),
                message: format!("Invalid chronological age: {}", age),
                hint: Some("chronological_age must be a positive number of years".to_string()),
            },
            BioAgeCliError::Compute(ComputeError::InvalidConfig(msg)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: msg,
                hint: Some("Run 'bioage doctor --config FILE' for details".to_string()),
            },
            BioAgeCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            BioAgeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            BioAgeCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'bioage metrics' for accepted metric keys".to_string()),
            },
            BioAgeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct MetricInfo {
    key: String,
    label: String,
    unit: String,
    domain: Option<String>,
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
