// FaultLens - core/skillpack/switch.rs
//
// Switch subsystem: port link state, flapping and frame errors.

use super::{build_event, classify, EventPattern, Membership, SkillPack};
use crate::core::knowledge::KnowledgeBase;
use crate::core::model::{KnowledgeSnippet, UnifiedEvent};
use crate::core::parser;

const NAME: &str = "switch";

const FALLBACK_KEYWORDS: &[&str] = &["switch"];

const MEMBERSHIP: Membership = Membership {
    modules: &["switch", "sw", "port", "phy", "eth", "mac", "lag"],
    board_prefixes: &["SW", "PORT", "PHY", "ETH", "MAC", "LINK", "LAG"],
    tags: &["[sw]", "[switch]", "[port]", "[eth]"],
    keywords: &["port flap", "link flap", "link down", "port down", "link up", "port up"],
};

/// Flapping outranks plain down/up: a flap report usually names both states.
const PATTERNS: &[EventPattern] = &[
    EventPattern {
        event_type: "port_flap",
        any_of: &["flap"],
        keywords: &["port", "flap"],
    },
    EventPattern {
        event_type: "port_down",
        any_of: &["link down", "port down", "linkdown", "went down"],
        keywords: &["port", "down"],
    },
    EventPattern {
        event_type: "port_up",
        any_of: &["link up", "port up", "linkup"],
        keywords: &["port", "up"],
    },
    EventPattern {
        event_type: "crc_error",
        any_of: &["crc", "fcs error"],
        keywords: &["crc"],
    },
];

static KNOWLEDGE: &[KnowledgeSnippet] = &[
    KnowledgeSnippet {
        level: 0,
        text: "The switch subsystem keeps port links stable and forwards sync and service traffic.",
        source: "switch:L0:summary",
    },
    KnowledgeSnippet {
        level: 1,
        text: "PTP packets traverse switch ports, so link instability shows up as timing jitter downstream.",
        source: "switch:L1:principle",
    },
    KnowledgeSnippet {
        level: 2,
        text: "A port flap causes upstream sync jitter and short service interruptions.",
        source: "switch:L2:rule",
    },
    KnowledgeSnippet {
        level: 2,
        text: "Rising CRC counts before a link drop point at the optics or the cable.",
        source: "switch:L2:rule",
    },
    KnowledgeSnippet {
        level: 3,
        text: "Inspect the optical module and fibre of the flapping port and check its error counters.",
        source: "switch:L3:ops",
    },
];

/// Skill pack for the switch subsystem.
#[derive(Debug, Clone, Copy)]
pub struct SwitchSkillPack {
    knowledge: KnowledgeBase,
}

impl SwitchSkillPack {
    pub fn new() -> Self {
        Self {
            knowledge: KnowledgeBase::new(KNOWLEDGE),
        }
    }
}

impl Default for SwitchSkillPack {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillPack for SwitchSkillPack {
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
            None => ("switch_unknown", FALLBACK_KEYWORDS),
        };
        Some(build_event(NAME, parsed, event_type, keywords))
    }

    fn retrieve(&self, _query: &str, level: u8, budget_tokens: usize) -> Vec<KnowledgeSnippet> {
        self.knowledge.retrieve(level, budget_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Level;

    fn event_type(line: &str) -> Option<String> {
        SwitchSkillPack::new().normalize(line).map(|e| e.event_type)
    }

    #[test]
    fn test_short_tag_port_flap() {
        let event = SwitchSkillPack::new()
            .normalize("[SW][WARN] port flap detected")
            .unwrap();
        assert_eq!(event.component, "switch");
        assert_eq!(event.event_type, "port_flap");
        assert_eq!(event.level, Some(Level::Warn));
        assert_eq!(event.keywords, vec!["port", "flap"]);
    }

    #[test]
    fn test_structured_port_flap() {
        let event = SwitchSkillPack::new()
            .normalize(
                "[360050][80] 2026/02/01 10:00:05.000567890 0x80A00001 ERROR \
                 src/driver/switch/port_mgr.c:88 PortMgr_LinkFlapDetect: port flap detected on \
                 ge0/0/1 flap_count=5 (0x00000005, 0x00000001, 0x00000000, 0x00000000)",
            )
            .unwrap();
        assert_eq!(event.event_type, "port_flap");
        assert_eq!(event.module.as_deref(), Some("switch"));
        assert_eq!(event.attributes["flap_count"], "5");
    }

    #[test]
    fn test_event_types() {
        assert_eq!(event_type("[SW][ERROR] ge0/0/3 link down").as_deref(), Some("port_down"));
        assert_eq!(event_type("[SW][INFO] ge0/0/3 link up").as_deref(), Some("port_up"));
        assert_eq!(event_type("[PORT][WARN] crc errors rising").as_deref(), Some("crc_error"));
        assert_eq!(event_type("[SW][INFO] config saved").as_deref(), Some("switch_unknown"));
        assert_eq!(event_type("link flap on uplink").as_deref(), Some("port_flap"));
    }

    #[test]
    fn test_ignores_clock_lines() {
        let pack = SwitchSkillPack::new();
        assert!(!pack.detect("[CLK][INFO] enter holdover"));
        assert!(!pack.detect(
            "c[2026/02/01 10:00:10.700234567] sev:INFO src:HOLDOVER_CTRL HoldoverActivate(): Holdover mode activated."
        ));
    }

    #[test]
    fn test_board_prefix() {
        let event = SwitchSkillPack::new()
            .normalize("c[2026/02/01 10:00:05] sev:ERR src:PORT_MGR LinkMonitor(): ge0/0/1 link down.")
            .unwrap();
        assert_eq!(event.event_type, "port_down");
        assert_eq!(event.level, Some(Level::Error));
    }

    #[test]
    fn test_retrieve_tiers() {
        let pack = SwitchSkillPack::new();
        let l2 = pack.retrieve("port flap", 2, 120);
        assert_eq!(l2.len(), 2);
        assert!(l2.iter().all(|s| s.source == "switch:L2:rule"));
    }
}
