// FaultLens - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Knowledge text and rule outcomes live with their skill packs and the
// fusion table; this file only holds numbers and fixed strings shared
// across layers.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "FaultLens";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "FaultLens";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Progressive retrieval
// =============================================================================

/// Highest knowledge tier (0 = summary .. 3 = operational action).
pub const MAX_KNOWLEDGE_LEVEL: u8 = 3;

/// Default token budget granted to each tier during progressive retrieval.
pub const DEFAULT_BUDGET_PER_LEVEL: usize = 120;

/// Hard upper bound on the per-tier budget accepted from configuration.
pub const ABSOLUTE_MAX_BUDGET_PER_LEVEL: usize = 4_096;

/// Accumulated snippet count at which retrieval stops after tier 0 or 1.
///
/// Tiers 2 and 3 are only skipped when the background tiers alone already
/// produced this many snippets.
pub const DEFAULT_EARLY_STOP_COUNT: usize = 6;

/// Highest tier at which the early-stop check is applied.
pub const EARLY_STOP_MAX_LEVEL: u8 = 1;

/// Hard upper bound on the configurable early-stop count.
pub const ABSOLUTE_MAX_EARLY_STOP_COUNT: usize = 64;

/// Maximum number of snippet texts kept in `Report::evidence`.
pub const DEFAULT_EVIDENCE_CAP: usize = 10;

/// Hard upper bound on the configurable evidence cap.
pub const ABSOLUTE_MAX_EVIDENCE_CAP: usize = 100;

// =============================================================================
// Token estimation
// =============================================================================

/// Estimated tokens per CJK ideograph, expressed in quarter tokens (1.5).
pub const CJK_QUARTER_TOKENS: usize = 6;

/// Estimated tokens per non-CJK character, expressed in quarter tokens (0.25).
pub const OTHER_QUARTER_TOKENS: usize = 1;

// =============================================================================
// Report sentinels
// =============================================================================

/// Root cause reported when no fusion rule matched.
pub const ROOT_CAUSE_UNIDENTIFIED: &str = "unidentified";

/// Impact reported when no fusion rule matched.
pub const IMPACT_UNDETERMINED: &str = "undetermined";

/// Action recommended when no fusion rule matched.
pub const DEFAULT_ACTION: &str = "Gather more context log and re-check the alert time window";

/// Marker used in the phenomenon summary when no component was routed.
pub const NO_COMPONENT_MARKER: &str = "none";

// =============================================================================
// Input limits
// =============================================================================

/// Default number of context lines kept around a prefilter keyword hit.
pub const DEFAULT_CONTEXT_LINES: usize = 5;

/// Hard upper bound on prefilter context lines.
pub const ABSOLUTE_MAX_CONTEXT_LINES: usize = 50;

/// Maximum number of lines fed into a single diagnosis.
pub const DEFAULT_MAX_LINES: usize = 200_000;

/// Hard upper bound on the per-diagnosis line cap.
pub const ABSOLUTE_MAX_LINES: usize = 5_000_000;

/// File size threshold in bytes above which files are memory-mapped.
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100 MB

// =============================================================================
// Discovery limits
// =============================================================================

/// Maximum directory recursion depth during discovery.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Hard upper bound on max depth (prevents infinite traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 50;

/// Minimum sensible value for the max-files limit.
pub const MIN_MAX_FILES: usize = 1;

/// Maximum number of files to discover in a single scan.
pub const DEFAULT_MAX_FILES: usize = 500;

/// Hard upper bound on max files (prevents configuration mistakes).
pub const ABSOLUTE_MAX_FILES: usize = 10_000;

/// Default include glob patterns for log file discovery.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.log", "*.log.[0-9]*", "*.txt"];

/// Default exclude glob patterns for log file discovery.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["*.gz", "*.zip", "*.bak", "*.tmp", ".git"];

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
