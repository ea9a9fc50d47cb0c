// FaultLens - app/batch.rs
//
// Input loading and batch diagnosis.
// Reads log files (or stdin), applies the keyword prefilter and runs the
// diagnosis core over the result, either once for all inputs or once per
// input file in parallel.
//
//   - Transient I/O errors are retried with capped backoff.
//   - Files at or above the large-file threshold are memory-mapped.
//   - Invalid UTF-8 is decoded lossily; a bad byte never fails a load.

use crate::core::diagnosis::DiagnosisCore;
use crate::core::discovery::{self, DiscoveryConfig};
use crate::core::filter::{self, PrefilterConfig};
use crate::core::model::Report;
use crate::util::constants;
use crate::util::error::{FaultLensError, InputError};
use rayon::prelude::*;
use serde::Serialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retry limits for transient I/O errors.
const MAX_RETRIES: u32 = 3;
const RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

/// Name used for input read from standard input.
pub const STDIN_NAME: &str = "<stdin>";

// =============================================================================
// Types
// =============================================================================

/// How several inputs are diagnosed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// All lines of all inputs go into one diagnosis.
    #[default]
    Combined,
    /// One diagnosis per input.
    PerFile,
}

/// Line loading limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadConfig {
    /// Lines kept per input; later lines are dropped with a warning.
    pub max_lines: usize,
    /// Files of at least this many bytes are memory-mapped.
    pub large_file_threshold: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_lines: constants::DEFAULT_MAX_LINES,
            large_file_threshold: constants::DEFAULT_LARGE_FILE_THRESHOLD,
        }
    }
}

/// One input's lines, ready for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedInput {
    /// Display name: the file path, or `<stdin>`.
    pub name: String,
    pub lines: Vec<String>,
}

/// A report together with the input(s) it was produced from.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Input name, or a comma-joined list for a combined diagnosis.
    pub source: String,
    pub report: Report,
}

// =============================================================================
// Path resolution
// =============================================================================

/// Expand `paths` into the list of files to read.
///
/// Files are taken as given; directories go through discovery. Discovery
/// warnings are returned alongside, not raised.
pub fn resolve_inputs(
    paths: &[PathBuf],
    config: &DiscoveryConfig,
) -> Result<(Vec<PathBuf>, Vec<String>), FaultLensError> {
    let mut files = Vec::new();
    let mut warnings = Vec::new();
    for path in paths {
        if path.is_dir() {
            let outcome = discovery::discover_files(path, config)?;
            if outcome.files.is_empty() {
                warnings.push(format!("No log files found under '{}'", path.display()));
            }
            files.extend(outcome.files.into_iter().map(|f| f.path));
            warnings.extend(outcome.warnings);
        } else {
            files.push(path.clone());
        }
    }
    Ok((files, warnings))
}

// =============================================================================
// Loading
// =============================================================================

/// Read a log file into non-blank physical lines, capped at `max_lines`.
pub fn load_lines(path: &Path, config: &LoadConfig) -> Result<Vec<String>, InputError> {
    let io_err = |source| InputError::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = std::fs::metadata(path).map_err(io_err)?.len();
    let content = if size >= config.large_file_threshold {
        tracing::debug!(file = %path.display(), size_mb = size / (1024 * 1024), "Memory-mapping large file");
        read_large_file(path).map_err(io_err)?
    } else {
        read_file_with_retry(path).map_err(io_err)?
    };

    let lines = split_lines(&content, config.max_lines);
    tracing::debug!(file = %path.display(), lines = lines.len(), "Input loaded");
    Ok(lines)
}

/// Read all of `reader` (normally stdin) into non-blank lines.
pub fn read_lines_from<R: Read>(mut reader: R, config: &LoadConfig) -> Result<Vec<String>, InputError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| InputError::Stdin { source })?;
    Ok(split_lines(&String::from_utf8_lossy(&bytes), config.max_lines))
}

/// Split into physical lines, dropping blank ones and trailing `\r`.
pub fn split_lines(content: &str, max_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect();
    if lines.len() > max_lines {
        tracing::warn!(total = lines.len(), limit = max_lines, "Input truncated to line limit");
        lines.truncate(max_lines);
    }
    lines
}

fn read_large_file(path: &Path) -> io::Result<String> {
    let file = std::fs::File::open(path)?;
    // SAFETY: the map is read-only and dropped before returning. A log
    // rewritten underneath us yields garbled text, not a crash we guard.
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    Ok(String::from_utf8_lossy(&mmap).into_owned())
}

fn read_file_with_retry(path: &Path) -> io::Result<String> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_RETRIES {
        match std::fs::read(path) {
            Ok(bytes) => return Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(RETRY_DELAYS_MS[attempt as usize]));
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("Unknown read error")))
}

fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

// =============================================================================
// Diagnosis
// =============================================================================

/// Diagnose loaded inputs after applying the prefilter to each one.
///
/// `PerFile` runs in parallel on the rayon pool; reports come back in input
/// order either way.
pub fn diagnose_inputs(
    core: &DiagnosisCore,
    inputs: &[LoadedInput],
    mode: InputMode,
    prefilter: &PrefilterConfig,
) -> Vec<BatchReport> {
    let narrow = |input: &LoadedInput| -> Vec<String> {
        if prefilter.is_empty() {
            return input.lines.clone();
        }
        let kept = filter::prefilter(&input.lines, &prefilter.keywords, prefilter.context_lines);
        if kept.is_empty() {
            tracing::warn!(input = %input.name, keywords = ?prefilter.keywords, "No line matched the prefilter keywords");
        }
        kept
    };

    match mode {
        InputMode::Combined => {
            let lines: Vec<String> = inputs.iter().flat_map(narrow).collect();
            let source = inputs
                .iter()
                .map(|i| i.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            vec![BatchReport {
                source,
                report: core.diagnose(&lines),
            }]
        }
        InputMode::PerFile => inputs
            .par_iter()
            .map(|input| BatchReport {
                source: input.name.clone(),
                report: core.diagnose(&narrow(input)),
            })
            .collect(),
    }
}

// =============================================================================
// Tests
// =============================================================================
