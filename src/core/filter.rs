// FaultLens - core/filter.rs
//
// Keyword prefilter applied to raw lines before diagnosis.
// Keeps keyword hits plus surrounding context so that large captures can be
// narrowed to the alert neighbourhood.
// Core layer: pure logic, no I/O or UI dependencies.

use std::collections::BTreeSet;

/// Prefilter settings. An empty keyword list disables filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefilterConfig {
    /// Case-insensitive substrings; blank entries are ignored.
    pub keywords: Vec<String>,

    /// Lines kept before and after each hit.
    pub context_lines: usize,
}

impl PrefilterConfig {
    /// Returns true if no usable keyword is configured.
    pub fn is_empty(&self) -> bool {
        normalised_keywords(&self.keywords).is_empty()
    }
}

/// Indices of the lines kept by the prefilter, ascending.
///
/// Every line containing any keyword is kept together with `context_lines`
/// lines on either side; overlapping windows are merged. With no usable
/// keyword every index is returned. No hit at all yields an empty list.
pub fn prefilter_indices<S: AsRef<str>>(
    lines: &[S],
    keywords: &[String],
    context_lines: usize,
) -> Vec<usize> {
    let keywords = normalised_keywords(keywords);
    if keywords.is_empty() {
        return (0..lines.len()).collect();
    }

    let mut keep = BTreeSet::new();
    for (i, line) in lines.iter().enumerate() {
        let lower = line.as_ref().to_lowercase();
        if keywords.iter().any(|k| lower.contains(k.as_str())) {
            let start = i.saturating_sub(context_lines);
            let end = (i + context_lines + 1).min(lines.len());
            keep.extend(start..end);
        }
    }

    tracing::debug!(
        total = lines.len(),
        kept = keep.len(),
        keywords = keywords.len(),
        "Prefilter applied"
    );
    keep.into_iter().collect()
}

/// Lines kept by the prefilter, in original order.
pub fn prefilter<S: AsRef<str>>(lines: &[S], keywords: &[String], context_lines: usize) -> Vec<String> {
    prefilter_indices(lines, keywords, context_lines)
        .into_iter()
        .map(|i| lines[i].as_ref().to_string())
        .collect()
}

fn normalised_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn test_empty_keywords_returns_all() {
        let lines = numbered(4);
        assert_eq!(prefilter_indices(&lines, &[], 2), vec![0, 1, 2, 3]);
        assert_eq!(prefilter(&lines, &kw(&["  ", ""]), 2), lines);
    }

    #[test]
    fn test_context_window() {
        let mut lines = numbered(10);
        lines[5] = "[CLK][INFO] enter HOLDOVER".to_string();
        assert_eq!(prefilter_indices(&lines, &kw(&["holdover"]), 2), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_window_clamped_at_edges() {
        let mut lines = numbered(4);
        lines[0] = "unlock".to_string();
        lines[3] = "unlock".to_string();
        assert_eq!(prefilter_indices(&lines, &kw(&["unlock"]), 1), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_overlapping_windows_deduplicated() {
        let mut lines = numbered(8);
        lines[2] = "port flap".to_string();
        lines[3] = "port flap again".to_string();
        let kept = prefilter_indices(&lines, &kw(&["flap"]), 1);
        assert_eq!(kept, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_context_keeps_only_hits() {
        let mut lines = numbered(5);
        lines[1] = "reference lost".to_string();
        lines[4] = "port down".to_string();
        let kept = prefilter(&lines, &kw(&["Reference", "PORT"]), 0);
        assert_eq!(kept, vec!["reference lost", "port down"]);
    }

    #[test]
    fn test_no_hit_yields_empty() {
        let lines = numbered(3);
        assert!(prefilter(&lines, &kw(&["holdover"]), 5).is_empty());
    }

    #[test]
    fn test_config_is_empty() {
        assert!(PrefilterConfig::default().is_empty());
        let cfg = PrefilterConfig {
            keywords: kw(&["pll"]),
            context_lines: 3,
        };
        assert!(!cfg.is_empty());
    }
}
