// FaultLens - core/knowledge.rs
//
// Static, tiered knowledge tables and budget-bounded retrieval.
// Each skill pack owns one `KnowledgeBase` built from a `&'static` slice, so
// tables are immutable and can never be aliased or mutated across instances.

use crate::core::model::KnowledgeSnippet;
use crate::util::constants;

/// A skill pack's knowledge table.
///
/// Snippets keep their table order; retrieval within one tier walks them in
/// that order.
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeBase {
    snippets: &'static [KnowledgeSnippet],
}

impl KnowledgeBase {
    pub const fn new(snippets: &'static [KnowledgeSnippet]) -> Self {
        Self { snippets }
    }

    /// All snippets at `level`, in table order.
    pub fn tier(&self, level: u8) -> impl Iterator<Item = &'static KnowledgeSnippet> {
        self.snippets.iter().filter(move |s| s.level == level)
    }

    /// Snippets at `level` that fit within `budget_tokens`.
    ///
    /// Strictly greedy: walks the tier in table order and stops at the first
    /// snippet whose estimated cost would exceed the remaining budget, even
    /// if a later, smaller snippet would still fit.
    pub fn retrieve(&self, level: u8, budget_tokens: usize) -> Vec<KnowledgeSnippet> {
        let mut out = Vec::new();
        let mut used = 0usize;
        for snippet in self.tier(level) {
            let cost = estimate_tokens(snippet.text);
            if used + cost > budget_tokens {
                break;
            }
            used += cost;
            out.push(*snippet);
        }
        out
    }
}

/// Approximate multilingual token cost of `text`.
///
/// CJK ideographs weigh 1.5 tokens, every other character 0.25. The sum is
/// rounded down and floored at 1.
pub fn estimate_tokens(text: &str) -> usize {
    let (cjk, other) = text.chars().fold((0usize, 0usize), |(cjk, other), c| {
        if is_cjk_ideograph(c) {
            (cjk + 1, other)
        } else {
            (cjk, other + 1)
        }
    });
    let quarters = cjk * constants::CJK_QUARTER_TOKENS + other * constants::OTHER_QUARTER_TOKENS;
    (quarters / 4).max(1)
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c as u32, 0x4E00..=0x9FFF | 0x3400..=0x4DBF)
}

#[cfg(test)]
mod tests {
    use super::*;

    static TABLE: &[KnowledgeSnippet] = &[
        KnowledgeSnippet {
            level: 0,
            text: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", // 40 chars -> 10 tokens
            source: "test:L0:summary",
        },
        KnowledgeSnippet {
            level: 1,
            text: "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", // 20 tokens
            source: "test:L1:principle",
        },
        KnowledgeSnippet {
            level: 1,
            text: "cccc", // 1 token
            source: "test:L1:principle",
        },
        KnowledgeSnippet {
            level: 1,
            text: "dddddddd", // 2 tokens
            source: "test:L1:principle",
        },
    ];

    #[test]
    fn test_estimate_latin() {
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens("abcdefghi"), 2); // 2.25 rounds down
    }

    #[test]
    fn test_estimate_cjk_weighs_more() {
        assert_eq!(estimate_tokens("时钟"), 3); // 2 * 1.5
        assert_eq!(estimate_tokens("时钟ab"), 3); // 3.5 rounds down
        assert_eq!(estimate_tokens("时"), 1); // 1.5 rounds down
    }

    #[test]
    fn test_estimate_floor_is_one() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("a"), 1);
    }

    #[test]
    fn test_retrieve_returns_only_requested_tier() {
        let kb = KnowledgeBase::new(TABLE);
        let got = kb.retrieve(1, 1_000);
        assert_eq!(got.len(), 3);
        assert!(got.iter().all(|s| s.level == 1));
        assert!(kb.retrieve(3, 1_000).is_empty());
    }

    #[test]
    fn test_retrieve_is_strict_greedy() {
        let kb = KnowledgeBase::new(TABLE);
        // The first L1 snippet costs 20; later ones would fit but are not tried.
        assert!(kb.retrieve(1, 19).is_empty());
        assert_eq!(kb.retrieve(1, 20).len(), 1);
        assert_eq!(kb.retrieve(1, 21).len(), 2);
        assert_eq!(kb.retrieve(1, 23).len(), 3);
    }

    #[test]
    fn test_retrieve_never_exceeds_budget() {
        let kb = KnowledgeBase::new(TABLE);
        for budget in 0..40 {
            for level in 0..=3 {
                let cost: usize = kb
                    .retrieve(level, budget)
                    .iter()
                    .map(|s| estimate_tokens(s.text))
                    .sum();
                assert!(cost <= budget, "level {level} budget {budget} cost {cost}");
            }
        }
    }

    #[test]
    fn test_zero_budget_returns_nothing() {
        let kb = KnowledgeBase::new(TABLE);
        assert!(kb.retrieve(0, 0).is_empty());
    }
}
