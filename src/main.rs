// FaultLens - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading and logging initialisation (debug mode support)
// 3. Input resolution (files, directories via discovery, or stdin)
// 4. Diagnosis, report rendering and optional event export
//
// Exit codes: 0 success, 1 I/O or configuration error, 2 validation failure.

use clap::{Parser, ValueEnum};
use faultlens::app::batch::{self, BatchReport, InputMode, LoadConfig, LoadedInput};
use faultlens::app::validation;
use faultlens::core::diagnosis::{DiagnosisCore, RetrievalConfig};
use faultlens::core::discovery::DiscoveryConfig;
use faultlens::core::export;
use faultlens::core::filter::PrefilterConfig;
use faultlens::platform::config::{self, AppConfig, PlatformPaths};
use faultlens::util;
use faultlens::util::error::{ExportError, FaultLensError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// FaultLens - equipment log fault diagnosis.
#[derive(Parser, Debug)]
#[command(name = "faultlens", version, about)]
struct Cli {
    /// Log files or directories to diagnose (reads stdin if omitted).
    paths: Vec<PathBuf>,

    /// Configuration file (defaults to config.toml in the platform config dir).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Report format.
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Diagnose each input file separately instead of fusing them.
    #[arg(long = "per-file")]
    per_file: bool,

    /// Prefilter keyword (repeatable); overrides the configured keywords.
    #[arg(short = 'k', long = "keyword")]
    keywords: Vec<String>,

    /// Context lines kept around each prefilter hit.
    #[arg(long = "context")]
    context: Option<usize>,

    /// Also write every normalised event to this CSV file.
    #[arg(long = "events-csv")]
    events_csv: Option<PathBuf>,

    /// Run the built-in validation scenarios and exit.
    #[arg(long = "validate")]
    validate: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config first: its [logging] level feeds the subscriber.
    let loaded = match &cli.config {
        Some(path) => config::load_config(path),
        None => Ok(config::load_default_config(&PlatformPaths::resolve())),
    };
    let (app_config, config_warnings) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            util::logging::init(cli.debug, None);
            tracing::error!(error = %e, "Configuration error");
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };

    util::logging::init(cli.debug, app_config.log_level.as_deref());
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "FaultLens starting"
    );

    let core = DiagnosisCore::with_default_packs().with_retrieval(retrieval_config(&app_config));

    if cli.validate {
        return run_validate(&core, cli.format);
    }

    match run(&cli, &app_config, &core) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Diagnosis failed");
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}

fn retrieval_config(app: &AppConfig) -> RetrievalConfig {
    RetrievalConfig {
        max_level: app.max_level,
        budget_per_level: app.budget_per_level,
        early_stop_count: app.early_stop_count,
        evidence_cap: app.evidence_cap,
    }
}

fn discovery_config(app: &AppConfig) -> DiscoveryConfig {
    DiscoveryConfig {
        max_depth: app.max_depth,
        max_files: app.max_files,
        include_patterns: app.include_patterns.clone(),
        exclude_patterns: app.exclude_patterns.clone(),
    }
}

fn prefilter_config(cli: &Cli, app: &AppConfig) -> PrefilterConfig {
    let keywords = if cli.keywords.is_empty() {
        app.keywords.clone()
    } else {
        cli.keywords.clone()
    };
    let context_lines = cli
        .context
        .unwrap_or(app.context_lines)
        .min(util::constants::ABSOLUTE_MAX_CONTEXT_LINES);
    PrefilterConfig {
        keywords,
        context_lines,
    }
}

fn run_validate(core: &DiagnosisCore, format: OutputFormat) -> ExitCode {
    let summary = validation::run_validation(core);

    let written = match format {
        OutputFormat::Json => export::export_json(&summary, io::stdout().lock(), Path::new("<stdout>"))
            .map_err(FaultLensError::from),
        OutputFormat::Text => {
            let mut out = String::new();
            for detail in &summary.details {
                let mark = if detail.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("[{mark}] {}: {}\n", detail.name, detail.root_cause));
            }
            out.push_str(&format!("{}/{} scenarios passed\n", summary.passed, summary.total));
            write_stdout(&out)
        }
    };
    if let Err(e) = written {
        eprintln!("error: {e}");
        return ExitCode::from(1);
    }

    if summary.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn run(cli: &Cli, app: &AppConfig, core: &DiagnosisCore) -> Result<(), FaultLensError> {
    let load_config = LoadConfig {
        max_lines: app.max_lines,
        ..LoadConfig::default()
    };

    let inputs = if cli.paths.is_empty() {
        tracing::debug!("No paths given, reading stdin");
        vec![LoadedInput {
            name: batch::STDIN_NAME.to_string(),
            lines: batch::read_lines_from(io::stdin().lock(), &load_config)?,
        }]
    } else {
        let (files, warnings) = batch::resolve_inputs(&cli.paths, &discovery_config(app))?;
        for warning in &warnings {
            tracing::warn!(warning = %warning, "Discovery warning");
        }
        files
            .iter()
            .map(|path| -> Result<LoadedInput, FaultLensError> {
                Ok(LoadedInput {
                    name: path.display().to_string(),
                    lines: batch::load_lines(path, &load_config)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    let mode = if cli.per_file {
        InputMode::PerFile
    } else {
        InputMode::Combined
    };
    let reports = batch::diagnose_inputs(core, &inputs, mode, &prefilter_config(cli, app));

    if let Some(csv_path) = &cli.events_csv {
        write_events_csv(csv_path, &reports)?;
    }

    match cli.format {
        OutputFormat::Json => {
            let stdout = io::stdout().lock();
            let target = Path::new("<stdout>");
            match reports.as_slice() {
                [single] if mode == InputMode::Combined => {
                    export::export_report_json(&single.report, stdout, target)?
                }
                _ => export::export_json(&reports, stdout, target)?,
            }
            write_stdout("\n")
        }
        OutputFormat::Text => write_stdout(&render_reports(&reports, mode)),
    }
}

fn render_reports(reports: &[BatchReport], mode: InputMode) -> String {
    let mut out = String::new();
    for (i, batch) in reports.iter().enumerate() {
        if mode == InputMode::PerFile {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("== {} ==\n", batch.source));
        }
        out.push_str(&export::render_text(&batch.report));
    }
    out
}

fn write_events_csv(path: &Path, reports: &[BatchReport]) -> Result<(), FaultLensError> {
    let file = std::fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let events: Vec<_> = reports
        .iter()
        .flat_map(|r| r.report.events.iter().cloned())
        .collect();
    let count = export::export_events_csv(&events, io::BufWriter::new(file), path)?;
    tracing::info!(path = %path.display(), events = count, "Events exported");
    Ok(())
}

fn write_stdout(text: &str) -> Result<(), FaultLensError> {
    io::stdout()
        .lock()
        .write_all(text.as_bytes())
        .map_err(|source| {
            ExportError::Io {
                path: PathBuf::from("<stdout>"),
                source,
            }
            .into()
        })
}
