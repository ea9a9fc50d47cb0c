// FaultLens - core/skillpack/clock.rs
//
// Clock subsystem: PLL lock state, reference selection, holdover, GNSS
// antenna and PTP/1588 sync quality.

use super::{build_event, classify, EventPattern, Membership, SkillPack};
use crate::core::knowledge::KnowledgeBase;
use crate::core::model::{KnowledgeSnippet, UnifiedEvent};
use crate::core::parser;

const NAME: &str = "clock";

const FALLBACK_KEYWORDS: &[&str] = &["clock"];

const MEMBERSHIP: Membership = Membership {
    modules: &["clk", "clock", "pll", "holdover", "ref", "refsel", "gnss", "gps", "ptp", "sync"],
    board_prefixes: &["CLK", "PLL", "HOLDOVER", "REF", "GNSS", "GPS", "PTP", "SYNC", "ANT"],
    tags: &["[clk]", "[clock]", "[pll]", "[ptp]", "[gnss]", "[sync]"],
    keywords: &["holdover", "unlock", "reference", "pll", "ptp", "1588", "gnss", "antenna"],
};

/// Most specific first: a holdover line often also mentions the unlock that
/// caused it, and an oscillation line mentions the reference it flips to.
const PATTERNS: &[EventPattern] = &[
    EventPattern {
        event_type: "state_change",
        any_of: &["holdover"],
        keywords: &["holdover"],
    },
    EventPattern {
        event_type: "antenna_fault",
        any_of: &[
            "antenna open",
            "antenna short",
            "antenna fault",
            "antenna alarm",
            "antenna disconnected",
        ],
        keywords: &["antenna", "fault"],
    },
    EventPattern {
        event_type: "source_oscillation",
        any_of: &["oscillation", "switching frequently", "source flapping", "ref flapping"],
        keywords: &["reference", "oscillation"],
    },
    EventPattern {
        event_type: "reference_lost",
        any_of: &[
            "reference lost",
            "reference source lost",
            "reference source unavailable",
            "reference unavailable",
            "loss of reference",
            "ref lost",
        ],
        keywords: &["reference", "lost"],
    },
    EventPattern {
        event_type: "pll_unlock",
        any_of: &["unlock", "lost lock", "loss of lock"],
        keywords: &["pll", "unlock"],
    },
    EventPattern {
        event_type: "sync_quality_drop",
        any_of: &["1588", "ptp"],
        keywords: &["ptp", "1588"],
    },
];

static KNOWLEDGE: &[KnowledgeSnippet] = &[
    KnowledgeSnippet {
        level: 0,
        text: "The clock subsystem locks the local oscillator to a selected reference and falls back to holdover when no reference is usable.",
        source: "clock:L0:summary",
    },
    KnowledgeSnippet {
        level: 1,
        text: "When 1588/PTP lock cannot be maintained the clock may enter holdover.",
        source: "clock:L1:principle",
    },
    KnowledgeSnippet {
        level: 1,
        text: "Loss of the reference source degrades clock stability.",
        source: "clock:L1:principle",
    },
    KnowledgeSnippet {
        level: 2,
        text: "Repeated unlock timeouts together with reference loss usually point to a reference-source anomaly.",
        source: "clock:L2:rule",
    },
    KnowledgeSnippet {
        level: 2,
        text: "Entering holdover is the key state signal of a broken sync chain.",
        source: "clock:L2:rule",
    },
    KnowledgeSnippet {
        level: 2,
        text: "An open or shorted GPS antenna removes the GNSS reference entirely.",
        source: "clock:L2:rule",
    },
    KnowledgeSnippet {
        level: 3,
        text: "Check the upstream sync link, the PTP session and the reference inputs.",
        source: "clock:L3:ops",
    },
    KnowledgeSnippet {
        level: 3,
        text: "Measure the antenna feeder current to tell an open circuit from a short.",
        source: "clock:L3:ops",
    },
];

/// Skill pack for the clock subsystem.
#[derive(Debug, Clone, Copy)]
pub struct ClockSkillPack {
    knowledge: KnowledgeBase,
}

impl ClockSkillPack {
    pub fn new() -> Self {
        Self {
            knowledge: KnowledgeBase::new(KNOWLEDGE),
        }
    }
}

impl Default for ClockSkillPack {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillPack for ClockSkillPack {
    fn name(&self) -> &str {
        NAME
    }

    fn detect(&self, line: &str) -> bool {
        MEMBERSHIP.claims(&parser::parse_line(line))
    }

    fn normalize(&self, line: &str) -> Option<UnifiedEvent> {
        let parsed = parser::parse_line(line);
        if !MEMBERSHIP.claims(&parsed) {
            return None;
        }
        let (event_type, keywords) = match classify(PATTERNS, &parsed.message) {
            Some(p) => (p.event_type, p.keywords),
            None => ("clock_unknown", FALLBACK_KEYWORDS),
        };
        Some(build_event(NAME, parsed, event_type, keywords))
    }

    fn retrieve(&self, _query: &str, level: u8, budget_tokens: usize) -> Vec<KnowledgeSnippet> {
        self.knowledge.retrieve(level, budget_tokens)
    }
}
