// FaultLens - core/skillpack/mod.rs
//
// The skill pack contract and the helpers every pack shares.
//
// A skill pack owns one subsystem: it decides which lines belong to it,
// normalises those lines into `UnifiedEvent`s, and serves its static,
// tiered knowledge under a token budget. Packs are flat structs behind a
// trait object; conflicts between packs are resolved by the registry in
// `core::diagnosis`, never inside a pack.

pub mod clock;
pub mod switch;

pub use clock::ClockSkillPack;
pub use switch::SwitchSkillPack;

use crate::core::model::{KnowledgeSnippet, LineFormat, ParsedLine, UnifiedEvent};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Capability contract implemented once per subsystem.
///
/// None of the operations fail: a line a pack cannot classify is simply not
/// claimed, and retrieval of an empty tier returns an empty list.
pub trait SkillPack: Send + Sync {
    /// Registry key; also the `component` of every event this pack emits.
    fn name(&self) -> &str;

    /// True if this pack claims ownership of `line`.
    fn detect(&self, line: &str) -> bool;

    /// Normalise `line` into one event, or `None` when `detect` is false.
    fn normalize(&self, line: &str) -> Option<UnifiedEvent>;

    /// Snippets at tier `level` fitting within `budget_tokens`, greedily in
    /// table order.
    fn retrieve(&self, query: &str, level: u8, budget_tokens: usize) -> Vec<KnowledgeSnippet>;
}

/// The packs wired into the default registry, in registration order.
pub fn default_packs() -> Vec<Box<dyn SkillPack>> {
    vec![Box::new(ClockSkillPack::new()), Box::new(SwitchSkillPack::new())]
}

// =============================================================================
// Line membership
// =============================================================================

/// Ownership rules for one pack.
///
/// Checked in order: a declared module (structured path directory, board
/// source tag), then bracket tags, then plain keywords. A declared module the
/// pack does not list is not a rejection; the line still gets the tag and
/// keyword checks.
#[derive(Debug, Clone, Copy)]
pub struct Membership {
    /// Structured-format path directories, matched case-insensitively.
    pub modules: &'static [&'static str],
    /// Board-format source tag prefixes, upper case.
    pub board_prefixes: &'static [&'static str],
    /// Short-tag brackets, lower case (e.g. `[clk]`).
    pub tags: &'static [&'static str],
    /// Keyword fallback, lower case.
    pub keywords: &'static [&'static str],
}

impl Membership {
    pub fn claims(&self, parsed: &ParsedLine) -> bool {
        self.claims_module(parsed) || self.claims_text(&parsed.raw)
    }

    fn claims_module(&self, parsed: &ParsedLine) -> bool {
        match (parsed.format, parsed.module.as_deref()) {
            (LineFormat::Structured, Some(module)) => {
                self.modules.iter().any(|m| module.eq_ignore_ascii_case(m))
            }
            (LineFormat::Board, Some(tag)) => {
                let tag = tag.to_ascii_uppercase();
                self.board_prefixes.iter().any(|p| tag.starts_with(p))
            }
            _ => false,
        }
    }

    fn claims_text(&self, raw: &str) -> bool {
        let lower = raw.to_lowercase();
        self.tags.iter().any(|t| lower.contains(t))
            || self.keywords.iter().any(|k| lower.contains(k))
    }
}

// =============================================================================
// Event classification
// =============================================================================

/// One entry of a pack's ordered classification table.
#[derive(Debug, Clone, Copy)]
pub struct EventPattern {
    pub event_type: &'static str,
    /// Lower-case substrings; any hit selects this pattern.
    pub any_of: &'static [&'static str],
    pub keywords: &'static [&'static str],
}

/// First pattern (in table order) whose substrings occur in `message`.
pub fn classify(
    patterns: &'static [EventPattern],
    message: &str,
) -> Option<&'static EventPattern> {
    let lower = message.to_lowercase();
    patterns
        .iter()
        .find(|p| p.any_of.iter().any(|needle| lower.contains(needle)))
}

/// Build the event for a claimed line.
///
/// Built-in packs call this after their membership check, so `component`
/// always names the calling pack.
pub(crate) fn build_event(
    component: &str,
    parsed: ParsedLine,
    event_type: &str,
    keywords: &[&str],
) -> UnifiedEvent {
    let attributes = extract_attributes(&parsed);
    UnifiedEvent {
        timestamp: parsed.timestamp,
        component: component.to_string(),
        module: parsed.module,
        level: Some(parsed.level),
        event_type: event_type.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        attributes,
        raw: parsed.raw,
    }
}

/// Parser fields plus `key=value` pairs found in the message.
fn extract_attributes(parsed: &ParsedLine) -> BTreeMap<String, String> {
    static KEY_VALUE: OnceLock<Regex> = OnceLock::new();
    let key_value = KEY_VALUE.get_or_init(|| {
        Regex::new(r"\b(?P<key>[A-Za-z_][A-Za-z0-9_]*)=(?P<value>[^\s,()]+)")
            .expect("skillpack: invalid key=value regex")
    });

    let mut attrs = BTreeMap::new();
    if let Some(code) = &parsed.code {
        attrs.insert("code".to_string(), code.clone());
    }
    if let Some(tick) = parsed.tick {
        attrs.insert("tick".to_string(), tick.to_string());
    }
    if let Some(pid) = parsed.pid {
        attrs.insert("pid".to_string(), pid.to_string());
    }
    if let Some(path) = &parsed.path {
        attrs.insert("path".to_string(), path.clone());
    }
    if let Some(line_no) = parsed.line_no {
        attrs.insert("line".to_string(), line_no.to_string());
    }
    if let Some(func) = &parsed.func {
        attrs.insert("func".to_string(), func.clone());
    }
    for (i, param) in parsed.params.iter().enumerate() {
        attrs.insert(format!("param{i}"), param.clone());
    }
    // Message pairs never shadow parser fields.
    for caps in key_value.captures_iter(&parsed.message) {
        attrs
            .entry(caps["key"].to_string())
            .or_insert_with(|| caps["value"].to_string());
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_line;

    const MEMBERSHIP: Membership = Membership {
        modules: &["clk"],
        board_prefixes: &["CLK", "PLL"],
        tags: &["[clk]"],
        keywords: &["holdover"],
    };

    #[test]
    fn test_membership_structured_module_match() {
        let own = parse_line("[1][2] 2026/02/01 10:00:00 0x1 ERROR src/driver/clk/a.c:1 F: x");
        let foreign = parse_line("[1][2] 2026/02/01 10:00:00 0x1 ERROR src/driver/switch/a.c:1 F: x");
        assert!(MEMBERSHIP.claims(&own));
        assert!(!MEMBERSHIP.claims(&foreign));
    }

    #[test]
    fn test_membership_unlisted_module_falls_back_to_keywords() {
        let structured = parse_line(
            "[1][2] 2026/02/01 10:00:00 0x1 ERROR src/bsp/timing/mon.c:10 Mon_Poll: \
             PLL lost lock, entering holdover",
        );
        assert_eq!(structured.module.as_deref(), Some("timing"));
        assert!(MEMBERSHIP.claims(&structured));

        let board = parse_line("c[2026/02/01 10:00:00] sev:ERR src:SYS_MON Poll(): entering holdover");
        assert_eq!(board.module.as_deref(), Some("SYS_MON"));
        assert!(MEMBERSHIP.claims(&board));

        let quiet = parse_line("c[2026/02/01 10:00:00] sev:INFO src:SYS_MON Poll(): fan ok");
        assert!(!MEMBERSHIP.claims(&quiet));
    }

    #[test]
    fn test_membership_board_prefix() {
        let own = parse_line("c[2026/02/01 10:00:00] sev:INFO src:PLL_CTRL Poll(): ok");
        let foreign = parse_line("c[2026/02/01 10:00:00] sev:INFO src:PORT_MGR Poll(): link up");
        assert!(MEMBERSHIP.claims(&own));
        assert!(!MEMBERSHIP.claims(&foreign));
    }

    #[test]
    fn test_membership_tag_then_keyword() {
        assert!(MEMBERSHIP.claims(&parse_line("[CLK][INFO] all quiet")));
        assert!(MEMBERSHIP.claims(&parse_line("[X][INFO] enter holdover")));
        assert!(MEMBERSHIP.claims(&parse_line("entering HOLDOVER now")));
        assert!(!MEMBERSHIP.claims(&parse_line("[SW][WARN] port flap")));
    }

    #[test]
    fn test_attributes_from_structured_line() {
        let parsed = parse_line(
            "[360050][80] 2026/02/01 10:00:05.000567890 0x80A00001 ERROR \
             src/driver/switch/port_mgr.c:88 PortMgr_LinkFlapDetect: port flap detected \
             on ge0/0/1 flap_count=5 (0x00000005, 0x00000001)",
        );
        let event = build_event("switch", parsed, "port_flap", &["port", "flap"]);
        assert_eq!(event.attributes["code"], "0x80A00001");
        assert_eq!(event.attributes["tick"], "360050");
        assert_eq!(event.attributes["pid"], "80");
        assert_eq!(event.attributes["line"], "88");
        assert_eq!(event.attributes["func"], "PortMgr_LinkFlapDetect");
        assert_eq!(event.attributes["param0"], "0x00000005");
        assert_eq!(event.attributes["param1"], "0x00000001");
        assert_eq!(event.attributes["flap_count"], "5");
        assert_eq!(event.component, "switch");
        assert_eq!(event.keywords, vec!["port", "flap"]);
    }

    #[test]
    fn test_attributes_empty_for_short_tag() {
        let event = build_event("clock", parse_line("[CLK][INFO] enter holdover"), "state_change", &[]);
        assert!(event.attributes.is_empty());
        assert_eq!(event.timestamp, None);
    }

    #[test]
    fn test_default_packs_registration_order() {
        let names: Vec<String> = default_packs().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["clock", "switch"]);
    }
}
