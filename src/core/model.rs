// FaultLens - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary between the line
// parser, the skill packs, the diagnosis core and the export layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// Level
// =============================================================================

/// Normalised severity level.
///
/// Every vendor token (ERR, TIPS, sev:WARNING, ...) is mapped to one of these
/// variants; a raw vendor token never leaves the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Fatal,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl Level {
    /// Canonical upper-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Fatal => "FATAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }

    /// Map a vendor severity token through the normalisation table.
    ///
    /// Matching is case-insensitive. Returns `None` for tokens outside the
    /// table so callers can fall back to content inference.
    pub fn from_token(token: &str) -> Option<Level> {
        match token.trim().to_ascii_uppercase().as_str() {
            "FATAL" | "CRIT" | "CRITICAL" | "EMERG" | "ALERT" | "PANIC" => Some(Level::Fatal),
            "ERROR" | "ERR" | "E" => Some(Level::Error),
            "WARN" | "WARNING" | "WRN" | "W" => Some(Level::Warn),
            "INFO" | "TIPS" | "NOTICE" | "I" => Some(Level::Info),
            "DEBUG" | "DBG" | "TRACE" | "D" => Some(Level::Debug),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Parsed line
// =============================================================================

/// The line grammar a raw line was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineFormat {
    /// `[tick][pid] <timestamp> <hex-code> <LEVEL> <path>:<line> <rest>`
    Structured,
    /// `c[<timestamp>] sev:<LEVEL> [error:<code>] src:<TAG> <rest>`
    Board,
    /// A bracketed severity marker such as `[WARN]` anywhere in the line.
    ShortTag,
    /// None of the above.
    Unknown,
}

/// Structured decomposition of one raw log line.
///
/// Built once by `parser::parse_line` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLine {
    pub format: LineFormat,
    pub timestamp: Option<String>,
    pub tick: Option<u64>,
    pub pid: Option<u64>,
    /// Hex error code, kept in its original spelling (e.g. `0x30A00002`).
    pub code: Option<String>,
    /// Source path (structured) or source file name (board).
    pub path: Option<String>,
    pub line_no: Option<u32>,
    pub func: Option<String>,
    pub message: String,
    pub level: Level,
    /// Subsystem directory (structured) or source tag (board).
    pub module: Option<String>,
    pub params: Vec<String>,
    pub raw: String,
}

// =============================================================================
// Unified event
// =============================================================================

/// Cross-subsystem normalised form of one meaningful log line.
///
/// Only skill packs build these (see `skillpack::build_event`), so
/// `component` always names a registered pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedEvent {
    pub timestamp: Option<String>,
    pub component: String,
    pub module: Option<String>,
    pub level: Option<Level>,
    /// Component-scoped tag, e.g. `state_change` or `port_flap`.
    pub event_type: String,
    pub keywords: Vec<String>,
    /// Extracted code / params / tick / source location, keyed by name.
    pub attributes: BTreeMap<String, String>,
    pub raw: String,
}

// =============================================================================
// Knowledge
// =============================================================================

/// One statically defined diagnostic fact.
///
/// `level` is the abstraction tier: 0 summary, 1 principle, 2 diagnostic
/// rule, 3 operational action. `source` has the shape
/// `<component>:L<level>:<kind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnowledgeSnippet {
    pub level: u8,
    pub text: &'static str,
    pub source: &'static str,
}

// =============================================================================
// Report
// =============================================================================

/// Earliest and latest parseable event timestamp in a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Output of `DiagnosisCore::diagnose`.
///
/// A pure function of the input lines and the static knowledge tables.
/// `root_cause == "unidentified"` is a valid, low-confidence outcome rather
/// than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub phenomenon_summary: String,
    pub root_cause: String,
    pub impact: String,
    /// Never empty.
    pub recommended_actions: Vec<String>,
    pub causal_chain: Vec<String>,
    pub evidence: Vec<String>,
    /// Component name -> snippet provenance tags in retrieval order.
    pub retrieval_trace: BTreeMap<String, Vec<String>>,
    /// Identifier of the fusion rule that fired, if any.
    pub matched_rule: Option<String>,
    pub time_window: Option<TimeWindow>,
    pub events: Vec<UnifiedEvent>,
}

impl Report {
    /// True when no fusion rule identified a root cause.
    pub fn is_unidentified(&self) -> bool {
        self.matched_rule.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_normalisation_table() {
        assert_eq!(Level::from_token("ERR"), Some(Level::Error));
        assert_eq!(Level::from_token("error"), Some(Level::Error));
        assert_eq!(Level::from_token("TIPS"), Some(Level::Info));
        assert_eq!(Level::from_token("Warning"), Some(Level::Warn));
        assert_eq!(Level::from_token("crit"), Some(Level::Fatal));
        assert_eq!(Level::from_token("dbg"), Some(Level::Debug));
        assert_eq!(Level::from_token("VERBOSE"), None);
    }

    #[test]
    fn test_level_serialises_upper_case() {
        let json = serde_json::to_string(&Level::Warn).unwrap();
        assert_eq!(json, "\"WARN\"");
    }

    #[test]
    fn test_line_format_serialises_snake_case() {
        let json = serde_json::to_string(&LineFormat::ShortTag).unwrap();
        assert_eq!(json, "\"short_tag\"");
    }
}
