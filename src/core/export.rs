// FaultLens - core/export.rs
//
// JSON, CSV and plain-text rendering of diagnosis reports.
// Core layer: writes to any Write trait object; the caller opens files.

use crate::core::model::{Report, UnifiedEvent};
use crate::util::error::ExportError;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Write `report` as pretty-printed JSON.
pub fn export_report_json<W: Write>(
    report: &Report,
    writer: W,
    export_path: &Path,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, report).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })
}

/// Write any serialisable value (e.g. a list of per-file reports) as
/// pretty-printed JSON.
pub fn export_json<T: Serialize + ?Sized, W: Write>(
    value: &T,
    writer: W,
    export_path: &Path,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, value).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })
}

/// Export events to CSV, one row per event.
///
/// Writes: timestamp, component, module, level, event_type, keywords, raw.
/// Keywords are joined with `;`.
pub fn export_events_csv<W: Write>(
    events: &[UnifiedEvent],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |e| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(["timestamp", "component", "module", "level", "event_type", "keywords", "raw"])
        .map_err(csv_err)?;

    for event in events {
        csv_writer
            .write_record([
                event.timestamp.as_deref().unwrap_or(""),
                &event.component,
                event.module.as_deref().unwrap_or(""),
                event.level.map(|l| l.as_str()).unwrap_or(""),
                &event.event_type,
                &event.keywords.join(";"),
                &event.raw,
            ])
            .map_err(csv_err)?;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(events.len())
}

/// Human-readable multi-line rendering of a report.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    let _ = writeln!(out, "Summary:     {}", report.phenomenon_summary);
    let _ = writeln!(out, "Root cause:  {}", report.root_cause);
    let _ = writeln!(out, "Impact:      {}", report.impact);
    if let Some(rule) = &report.matched_rule {
        let _ = writeln!(out, "Rule:        {rule}");
    }
    if let Some(window) = &report.time_window {
        let _ = writeln!(
            out,
            "Time window: {} .. {}",
            window.start.format("%Y-%m-%d %H:%M:%S%.3f"),
            window.end.format("%Y-%m-%d %H:%M:%S%.3f")
        );
    }
    if !report.causal_chain.is_empty() {
        let _ = writeln!(out, "Causal chain: {}", report.causal_chain.join(" -> "));
    }

    let _ = writeln!(out, "Recommended actions:");
    for (i, action) in report.recommended_actions.iter().enumerate() {
        let _ = writeln!(out, "  {}. {action}", i + 1);
    }

    if !report.evidence.is_empty() {
        let _ = writeln!(out, "Evidence:");
        for text in &report.evidence {
            let _ = writeln!(out, "  - {text}");
        }
    }

    if !report.retrieval_trace.is_empty() {
        let _ = writeln!(out, "Retrieval trace:");
        for (component, sources) in &report.retrieval_trace {
            let _ = writeln!(out, "  {component}: {}", sources.join(", "));
        }
    }

    if !report.events.is_empty() {
        let _ = writeln!(out, "Events:");
        for event in &report.events {
            let _ = writeln!(
                out,
                "  [{}] {:<5} {}/{}",
                event.timestamp.as_deref().unwrap_or("-"),
                event.level.map(|l| l.as_str()).unwrap_or("-"),
                event.component,
                event.event_type
            );
        }
    }
    out
}
