// FaultLens - core/parser.rs
//
// Format-agnostic log line parsing.
// Core layer: operates on one in-memory line at a time, never fails.
//
// Grammars are tried in a fixed priority order and the first match wins:
//   1. structured  [tick][pid] <ts> <hex-code> <LEVEL> <path>:<line> <rest>
//   2. board       c[<ts>] sev:<LEVEL> [error:<code>] src:<TAG> <rest>
//   3. short-tag   ... [WARN] ...
//   4. unknown     level inferred from content keywords only

use crate::core::model::{Level, LineFormat, ParsedLine};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

// =============================================================================
// Keyword tables
// =============================================================================

/// Content keywords checked first. Any hit classifies the text as FATAL.
const FATAL_KEYWORDS: &[&str] = &[
    "fatal",
    "panic",
    "crash",
    "watchdog reset",
    "watchdog timeout",
    "core dump",
    "system halt",
    "kernel oops",
];

/// Content keywords checked second.
const ERROR_KEYWORDS: &[&str] = &[
    "error",
    "failed",
    "failure",
    "fault",
    "lost",
    "timeout",
    "unavailable",
    "unreachable",
    "abnormal",
    "exception",
];

/// Content keywords checked last.
const WARN_KEYWORDS: &[&str] = &[
    "warn",
    "degraded",
    "oscillation",
    "flap",
    "holdover",
    "unstable",
    "drift",
    "jitter",
    "retry",
];

/// Path segments that never name a subsystem.
const GENERIC_DIRS: &[&str] = &[
    "src", "source", "driver", "drivers", "lib", "libs", "include", "common",
];

// =============================================================================
// Compiled patterns
// =============================================================================

struct Patterns {
    structured: Regex,
    board: Regex,
    short_tag: Regex,
    leading_tags: Regex,
    trailing_params: Regex,
    func_prefix: Regex,
    board_location: Regex,
    board_call: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();

    PATTERNS.get_or_init(|| {
        // Patterns are exercised by the unit tests below, so a mistake here
        // shows up as a failing test rather than a runtime panic.
        fn re(pat: &str) -> Regex {
            Regex::new(pat).expect("parser: invalid regex")
        }

        Patterns {
            structured: re(concat!(
                r"^\[(?P<tick>\d+)\]\[(?P<pid>\d+)\]\s+",
                r"(?P<ts>\d{4}[/-]\d{2}[/-]\d{2}[ T]\d{2}:\d{2}:\d{2}(?:\.\d+)?)\s+",
                r"(?P<code>0[xX][0-9A-Fa-f]+)\s+",
                r"(?P<level>[A-Za-z]+)\s+",
                r"(?P<path>[^\s:]+):(?P<line>\d+)",
                r"(?:\s+(?P<rest>.*))?$",
            )),
            board: re(concat!(
                r"^[A-Za-z]?\[(?P<ts>[^\]]+)\]\s*",
                r"sev:(?P<sev>[A-Za-z]+)\s+",
                r"(?:error:(?P<code>0[xX][0-9A-Fa-f]+)\s+)?",
                r"src:(?P<src>[A-Za-z0-9_]+)",
                r"(?P<rest>.*)$",
            )),
            short_tag: re(
                r"(?i)\[(?P<sev>FATAL|CRITICAL|CRIT|ERROR|ERR|WARNING|WARN|INFO|NOTICE|TIPS|DEBUG|DBG|TRACE)\]",
            ),
            leading_tags: re(r"^(?:\s*\[[^\]]*\])+\s*"),
            trailing_params: re(r"^(?P<body>.*?)\s*\((?P<params>[^()]*)\)\s*$"),
            func_prefix: re(r"^(?P<func>[A-Za-z_][A-Za-z0-9_]*):(?:\s+(?P<body>.*))?$"),
            board_location: re(concat!(
                r"^\[\s*(?P<file>[^/\]]+?)\s*/\s*(?P<func>[^/\]]+?)\s*/\s*(?P<line>\d+)\s*\]",
                r"\s*:?\s*(?P<body>.*)$",
            )),
            board_call: re(r"^(?P<func>[A-Za-z_][A-Za-z0-9_]*)\(\)\s*:?\s*(?P<body>.*)$"),
        }
    })
}

// =============================================================================
// Entry point
// =============================================================================

/// Parse one raw line into its structured decomposition.
///
/// Never fails: a line matching no grammar comes back as
/// `LineFormat::Unknown` with a level inferred from its content.
pub fn parse_line(raw: &str) -> ParsedLine {
    let line = raw.trim();
    parse_structured(raw, line)
        .or_else(|| parse_board(raw, line))
        .or_else(|| parse_short_tag(raw, line))
        .unwrap_or_else(|| ParsedLine {
            format: LineFormat::Unknown,
            timestamp: None,
            tick: None,
            pid: None,
            code: None,
            path: None,
            line_no: None,
            func: None,
            message: line.to_string(),
            level: infer_level(line),
            module: None,
            params: Vec::new(),
            raw: raw.to_string(),
        })
}

fn parse_structured(raw: &str, line: &str) -> Option<ParsedLine> {
    let p = patterns();
    let caps = p.structured.captures(line)?;

    let path = caps["path"].to_string();
    let rest = caps.name("rest").map(|m| m.as_str().trim()).unwrap_or("");

    // Trailing "(a, b, c)" first, then an optional leading "Func:".
    let (body, params) = match p.trailing_params.captures(rest) {
        Some(pc) => (
            pc.name("body").map(|m| m.as_str()).unwrap_or(""),
            split_params(&pc["params"]),
        ),
        None => (rest, Vec::new()),
    };
    let (func, message) = match p.func_prefix.captures(body) {
        Some(fc) => (
            Some(fc["func"].to_string()),
            fc.name("body").map(|m| m.as_str().trim()).unwrap_or(""),
        ),
        None => (None, body.trim()),
    };

    let level = structured_level(&caps["level"], message);

    Some(ParsedLine {
        format: LineFormat::Structured,
        timestamp: Some(caps["ts"].to_string()),
        tick: caps["tick"].parse().ok(),
        pid: caps["pid"].parse().ok(),
        code: Some(caps["code"].to_string()),
        module: derive_module(&path),
        path: Some(path),
        line_no: caps["line"].parse().ok(),
        func,
        message: message.to_string(),
        level,
        params,
        raw: raw.to_string(),
    })
}

/// Severity for a structured line.
///
/// The declared error tag may only be upgraded to FATAL; the informational
/// tag likewise stays INFO unless FATAL keywords appear. WARN/ERROR keywords
/// never change an informational line.
fn structured_level(declared: &str, message: &str) -> Level {
    let inferred = infer_level(message);
    match Level::from_token(declared) {
        Some(Level::Error) | Some(Level::Info) if inferred == Level::Fatal => Level::Fatal,
        Some(level) => level,
        None => inferred,
    }
}

fn parse_board(raw: &str, line: &str) -> Option<ParsedLine> {
    let p = patterns();
    let caps = p.board.captures(line)?;

    let rest = caps["rest"].trim_start_matches(':').trim();

    let mut path = None;
    let mut func = None;
    let mut line_no = None;
    let mut message = rest;

    if let Some(lc) = p.board_location.captures(rest) {
        path = Some(lc["file"].to_string());
        func = Some(lc["func"].to_string());
        line_no = lc["line"].parse().ok();
        message = lc.name("body").map(|m| m.as_str()).unwrap_or("");
    } else if let Some(cc) = p.board_call.captures(rest) {
        func = Some(cc["func"].to_string());
        message = cc.name("body").map(|m| m.as_str()).unwrap_or("");
    }
    let message = message.trim();

    let level = Level::from_token(&caps["sev"]).unwrap_or_else(|| infer_level(message));

    Some(ParsedLine {
        format: LineFormat::Board,
        timestamp: Some(caps["ts"].trim().to_string()),
        tick: None,
        pid: None,
        code: caps.name("code").map(|m| m.as_str().to_string()),
        path,
        line_no,
        func,
        message: message.to_string(),
        level,
        module: Some(caps["src"].to_string()),
        params: Vec::new(),
        raw: raw.to_string(),
    })
}

fn parse_short_tag(raw: &str, line: &str) -> Option<ParsedLine> {
    let p = patterns();
    let caps = p.short_tag.captures(line)?;
    let level = Level::from_token(&caps["sev"])?;

    let message = p.leading_tags.replace(line, "");

    Some(ParsedLine {
        format: LineFormat::ShortTag,
        timestamp: None,
        tick: None,
        pid: None,
        code: None,
        path: None,
        line_no: None,
        func: None,
        message: message.trim().to_string(),
        level,
        module: None,
        params: Vec::new(),
        raw: raw.to_string(),
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// Infer severity from message content.
///
/// FATAL keywords are checked before ERROR, and ERROR before WARN, so the
/// most severe tier present wins. Defaults to INFO.
pub fn infer_level(text: &str) -> Level {
    let lower = text.to_lowercase();
    let tiers: [(&[&str], Level); 3] = [
        (FATAL_KEYWORDS, Level::Fatal),
        (ERROR_KEYWORDS, Level::Error),
        (WARN_KEYWORDS, Level::Warn),
    ];
    tiers
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, level)| *level)
        .unwrap_or(Level::Info)
}

/// Subsystem directory of a source path.
///
/// Scans the directory segments (filename excluded) from the end and returns
/// the first one that is not a generic directory name.
/// `src/driver/clk/clk_core.c` -> `clk`.
pub fn derive_module(path: &str) -> Option<String> {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let (_, dirs) = segments.split_last()?;
    dirs.iter()
        .rev()
        .find(|seg| !GENERIC_DIRS.iter().any(|g| seg.eq_ignore_ascii_case(g)))
        .map(|seg| seg.to_string())
}

fn split_params(group: &str) -> Vec<String> {
    group
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a structured or board timestamp (`2026/02/01 10:00:15.550901234`).
///
/// Vendor timestamps carry no zone; they are interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let normalised = raw.trim().replace('/', "-").replace('T', " ");
    NaiveDateTime::parse_from_str(&normalised, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&normalised, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|ndt| ndt.and_utc())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const PLL_LINE: &str = "[360155][42] 2026/02/01 10:00:15.550901234 0x30A00002 ERROR \
        src/driver/clk/clk_core.c:405 Clk_CheckPllStatus: PLL status changed LOCK->UNLOCK \
        state_reg=0x3 (0x00000003, 0x00000000, 0x00000044, 0x00000000)";

    #[test]
    fn test_structured_round_trip() {
        let p = parse_line(PLL_LINE);
        assert_eq!(p.format, LineFormat::Structured);
        assert_eq!(p.tick, Some(360155));
        assert_eq!(p.pid, Some(42));
        assert_eq!(p.timestamp.as_deref(), Some("2026/02/01 10:00:15.550901234"));
        assert_eq!(p.code.as_deref(), Some("0x30A00002"));
        assert_eq!(p.path.as_deref(), Some("src/driver/clk/clk_core.c"));
        assert_eq!(p.line_no, Some(405));
        assert_eq!(p.func.as_deref(), Some("Clk_CheckPllStatus"));
        assert_eq!(
            p.params,
            vec!["0x00000003", "0x00000000", "0x00000044", "0x00000000"]
        );
        assert_eq!(p.level, Level::Error);
        assert_eq!(p.module.as_deref(), Some("clk"));
        assert_eq!(p.message, "PLL status changed LOCK->UNLOCK state_reg=0x3");
        assert_eq!(p.raw, PLL_LINE);
    }

    #[test]
    fn test_structured_error_upgraded_to_fatal() {
        let line = "[1][2] 2026/02/01 10:00:16.000000000 0x30A00003 ERROR \
            src/driver/clk/clk_core.c:406 Clk_CheckPllStatus: Fatal Error: System PLL lost lock";
        assert_eq!(parse_line(line).level, Level::Fatal);
    }

    #[test]
    fn test_structured_tips_stays_info_despite_warn_keywords() {
        let line = "[360170][42] 2026/02/01 10:00:10.700234567 0x30100020 TIPS \
            src/driver/clk/holdover.c:88 Holdover_Activate: Holdover mode activated \
            oscillator=OCXO (0x00000001, 0x0000000F, 0x00015180, 0x00000000)";
        let p = parse_line(line);
        assert_eq!(p.format, LineFormat::Structured);
        assert_eq!(p.level, Level::Info);
        assert_eq!(p.module.as_deref(), Some("clk"));
        assert_eq!(p.func.as_deref(), Some("Holdover_Activate"));
    }

    #[test]
    fn test_structured_tips_upgraded_only_by_fatal_keywords() {
        let line = "[1][1] 2026/02/01 10:00:00 0x1 TIPS src/bsp/wdt.c:10 Wdt_Kick: watchdog reset imminent";
        assert_eq!(parse_line(line).level, Level::Fatal);
    }

    #[test]
    fn test_structured_without_params_or_func() {
        let line = "[7][8] 2026/02/01 10:00:00 0xFF ERROR lib/switch/port.c:12 link down on ge0/0/2";
        let p = parse_line(line);
        assert_eq!(p.format, LineFormat::Structured);
        assert!(p.params.is_empty());
        assert_eq!(p.func, None);
        assert_eq!(p.message, "link down on ge0/0/2");
        assert_eq!(p.module.as_deref(), Some("switch"));
    }

    #[test]
    fn test_structured_unbalanced_tail_yields_no_params() {
        let line = "[7][8] 2026/02/01 10:00:00 0xFF ERROR src/clk/a.c:1 F: broken (0x1, 0x2";
        let p = parse_line(line);
        assert!(p.params.is_empty());
        assert_eq!(p.message, "broken (0x1, 0x2");
    }

    #[test]
    fn test_board_with_location_block() {
        let line = "c[2026/02/01 10:00:15.550901234] sev:ERR error:0x30A002 src:PLL_CTRL:: \
            [ clk_core.c / Clk_CheckPllStatus / 405 ]: PLL status changed: LOCK -> UNLOCK.";
        let p = parse_line(line);
        assert_eq!(p.format, LineFormat::Board);
        assert_eq!(p.level, Level::Error);
        assert_eq!(p.module.as_deref(), Some("PLL_CTRL"));
        assert_eq!(p.code.as_deref(), Some("0x30A002"));
        assert_eq!(p.path.as_deref(), Some("clk_core.c"));
        assert_eq!(p.func.as_deref(), Some("Clk_CheckPllStatus"));
        assert_eq!(p.line_no, Some(405));
        assert_eq!(p.message, "PLL status changed: LOCK -> UNLOCK.");
        assert_eq!(p.timestamp.as_deref(), Some("2026/02/01 10:00:15.550901234"));
    }

    #[test]
    fn test_board_with_call_prefix() {
        let line = "c[2026/02/01 10:00:10.500890123] sev:WARN src:CLK_REF_SEL \
            RefQualityMonitor(): GNSS reference source unavailable.";
        let p = parse_line(line);
        assert_eq!(p.format, LineFormat::Board);
        assert_eq!(p.level, Level::Warn);
        assert_eq!(p.module.as_deref(), Some("CLK_REF_SEL"));
        assert_eq!(p.func.as_deref(), Some("RefQualityMonitor"));
        assert_eq!(p.message, "GNSS reference source unavailable.");
        assert_eq!(p.code, None);
    }

    #[test]
    fn test_short_tag() {
        let p = parse_line("[CLK][ERROR] unlock timeout");
        assert_eq!(p.format, LineFormat::ShortTag);
        assert_eq!(p.level, Level::Error);
        assert_eq!(p.message, "unlock timeout");
        assert_eq!(p.module, None);

        let p = parse_line("port 3 [warn] flapping");
        assert_eq!(p.format, LineFormat::ShortTag);
        assert_eq!(p.level, Level::Warn);
    }

    #[test]
    fn test_unknown_line_infers_level() {
        let p = parse_line("kernel panic after reference lost");
        assert_eq!(p.format, LineFormat::Unknown);
        assert_eq!(p.level, Level::Fatal);

        let p = parse_line("");
        assert_eq!(p.format, LineFormat::Unknown);
        assert_eq!(p.level, Level::Info);
    }

    #[test]
    fn test_infer_level_orders_fatal_first() {
        assert_eq!(infer_level("holdover then crash"), Level::Fatal);
        assert_eq!(infer_level("link degraded, sync lost"), Level::Error);
        assert_eq!(infer_level("port flap"), Level::Warn);
        assert_eq!(infer_level("all good"), Level::Info);
    }

    #[test]
    fn test_derive_module() {
        assert_eq!(derive_module("src/driver/clk/clk_core.c").as_deref(), Some("clk"));
        assert_eq!(derive_module("src/driver/clk_core.c"), None);
        assert_eq!(derive_module("clk_core.c"), None);
        assert_eq!(derive_module("app/switch/src/port.c").as_deref(), Some("switch"));
        assert_eq!(derive_module(r"src\ptp\servo.c").as_deref(), Some("ptp"));
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2026/02/01 10:00:15.550901234").unwrap();
        assert_eq!(ts.year(), 2026);
        assert_eq!(ts.second(), 15);
        assert!(parse_timestamp("2026-02-01 10:00:15").is_some());
        assert!(parse_timestamp("not a time").is_none());
    }
}
