// FaultLens - core/discovery.rs
//
// Recursive directory traversal and log file discovery.
//
// Uses `walkdir` for traversal and reads only file metadata, never contents;
// reading is owned by the app layer (`app::batch`).
//
//   - Per-entry I/O errors are non-fatal and collected as warnings.
//   - max_files and max_depth are clamped to named-constant upper bounds.
//   - Literal exclude patterns short-circuit directory descent via
//     filter_entry, so excluded subtrees (e.g. .git/) are never walked.

use crate::util::constants;
use crate::util::error::DiscoveryError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a discovery operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Maximum directory recursion depth.
    pub max_depth: usize,

    /// Maximum number of matching files to return.
    pub max_files: usize,

    /// Glob patterns (filename-only) that a file must match to be included.
    /// An empty list means "include everything that is not excluded".
    pub include_patterns: Vec<String>,

    /// Glob patterns matched against filenames and directory names.
    /// Matching files are skipped; matching directories are not descended into.
    pub exclude_patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: constants::DEFAULT_MAX_DEPTH,
            max_files: constants::DEFAULT_MAX_FILES,
            include_patterns: constants::DEFAULT_INCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            exclude_patterns: constants::DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// A log file found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Files accepted by discovery plus the non-fatal problems met on the way.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    /// Accepted files, sorted by path.
    pub files: Vec<DiscoveredFile>,
    pub warnings: Vec<String>,
    /// Matching files found before the `max_files` cap was applied.
    pub total_found: usize,
}

// =============================================================================
// Discovery
// =============================================================================

/// Discover log files under `root`, applying include/exclude glob patterns.
///
/// When more than `max_files` match, the most recently modified ones are
/// kept and a warning is recorded. Returns `Err` only if the root itself is
/// invalid (`RootNotFound`, `NotADirectory`).
pub fn discover_files(root: &Path, config: &DiscoveryConfig) -> Result<DiscoveryOutcome, DiscoveryError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(DiscoveryError::NotADirectory {
                path: root.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(DiscoveryError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    let max_files = config
        .max_files
        .clamp(constants::MIN_MAX_FILES, constants::ABSOLUTE_MAX_FILES);
    let max_depth = config.max_depth.min(constants::ABSOLUTE_MAX_DEPTH);

    tracing::debug!(
        root = %root.display(),
        max_depth,
        max_files,
        include = ?config.include_patterns,
        exclude = ?config.exclude_patterns,
        "Discovery starting"
    );

    let include_pats = compile_patterns(&config.include_patterns, "include");
    let exclude_pats = compile_patterns(&config.exclude_patterns, "exclude");

    let mut files: Vec<DiscoveredFile> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let walker = walkdir::WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_str().unwrap_or("");
            !is_excluded_component(name, &exclude_pats)
        });

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                let path_str = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                let msg = format!("Cannot access '{path_str}': {e}");
                tracing::warn!(warning = %msg, "Discovery warning");
                warnings.push(msg);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => {
                warnings.push(format!("Skipping '{}': non-UTF-8 filename", path.display()));
                continue;
            }
        };

        if is_excluded_filename(file_name, &exclude_pats) {
            tracing::trace!(file = file_name, "Excluded by pattern");
            continue;
        }
        if !is_included(file_name, &include_pats) {
            tracing::trace!(file = file_name, "Not matched by include patterns");
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                let msg = format!("Cannot read metadata for '{}': {e}", path.display());
                tracing::warn!(warning = %msg, "Discovery warning");
                warnings.push(msg);
                continue;
            }
        };

        files.push(DiscoveredFile {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        });
    }

    let total_found = files.len();

    if total_found > max_files {
        // Newest first; files without an mtime count as oldest.
        files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
        files.truncate(max_files);
        warnings.push(format!(
            "{total_found} log files were found but the limit is {max_files}. \
             Only the {max_files} most recently modified files are diagnosed."
        ));
        tracing::info!(total_found, limit = max_files, "File list truncated");
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        total_found,
        files_kept = files.len(),
        warnings = warnings.len(),
        "Discovery complete"
    );

    Ok(DiscoveryOutcome {
        files,
        warnings,
        total_found,
    })
}

// =============================================================================
// Glob helpers
// =============================================================================

/// Compile glob pattern strings; patterns that fail are logged and skipped.
fn compile_patterns(patterns: &[String], kind: &str) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = p, kind, error = %e, "Invalid glob pattern, skipping");
                None
            }
        })
        .collect()
}

/// Literal exclude patterns (no wildcards) double as directory-name matchers.
fn is_excluded_component(dir_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| {
        let s = p.as_str();
        !s.contains('*') && !s.contains('?') && !s.contains('[') && p.matches(dir_name)
    })
}

fn is_excluded_filename(file_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| p.matches(file_name))
}

/// An empty include list means "include all".
fn is_included(file_name: &str, include_pats: &[glob::Pattern]) -> bool {
    include_pats.is_empty() || include_pats.iter().any(|p| p.matches(file_name))
}

// =============================================================================
// Tests
// =============================================================================
