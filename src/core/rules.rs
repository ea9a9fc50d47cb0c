// FaultLens - core/rules.rs
//
// Ordered causal-fusion rule table.
// Rules are evaluated top to bottom over the set of observed event types and
// the first match wins; later rules are never consulted once one fires.

use std::collections::BTreeSet;

/// Distinct event types observed in one diagnosis.
pub type EventTypeSet = BTreeSet<String>;

/// Conclusion attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusionOutcome {
    pub root_cause: &'static str,
    pub impact: &'static str,
    pub actions: &'static [&'static str],
    pub causal_chain: &'static [&'static str],
}

/// One row of the fusion table.
#[derive(Clone, Copy)]
pub struct FusionRule {
    pub id: &'static str,
    pub condition: fn(&EventTypeSet) -> bool,
    pub outcome: FusionOutcome,
}

impl std::fmt::Debug for FusionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FusionRule")
            .field("id", &self.id)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

fn has(types: &EventTypeSet, event_type: &str) -> bool {
    types.contains(event_type)
}

/// The fusion table, highest priority first.
pub static FUSION_RULES: &[FusionRule] = &[
    FusionRule {
        id: "switch_jitter_holdover",
        condition: |t| has(t, "port_flap") && (has(t, "state_change") || has(t, "pll_unlock")),
        outcome: FusionOutcome {
            root_cause: "Switch port jitter induced clock holdover",
            impact: "Sync quality degraded, risk of service deactivation",
            actions: &[
                "Repair or replace the flapping port link",
                "Check PTP session stability",
                "Confirm the clock leaves holdover",
            ],
            causal_chain: &["Switch port flap", "PTP jitter", "Clock holdover"],
        },
    },
    FusionRule {
        id: "reference_anomaly_holdover",
        condition: |t| {
            (has(t, "reference_lost") && has(t, "state_change"))
                || (has(t, "pll_unlock") && has(t, "state_change"))
        },
        outcome: FusionOutcome {
            root_cause: "Reference-source anomaly triggered clock holdover",
            impact: "Clock accuracy degraded, service quality at risk",
            actions: &[
                "Check the sync source link and its input quality",
                "Verify the state of the upstream reference source",
            ],
            causal_chain: &["reference anomaly", "clock unlock/holdover"],
        },
    },
    FusionRule {
        id: "pll_unlock",
        condition: |t| has(t, "pll_unlock"),
        outcome: FusionOutcome {
            root_cause: "PLL unlocked, reference source possibly anomalous",
            impact: "Clock accuracy degraded, risk of service interruption",
            actions: &[
                "Check the PLL reference input",
                "Review the reference selection and lock history",
            ],
            causal_chain: &["PLL unlock"],
        },
    },
    FusionRule {
        id: "antenna_fault",
        condition: |t| has(t, "antenna_fault"),
        outcome: FusionOutcome {
            root_cause: "GPS antenna fault (open or short circuit)",
            impact: "GNSS reference unavailable",
            actions: &[
                "Inspect the GPS antenna, feeder cable and lightning protector",
                "Measure the antenna feeder current",
            ],
            causal_chain: &["antenna fault", "GNSS unavailable"],
        },
    },
    FusionRule {
        id: "source_oscillation",
        condition: |t| has(t, "source_oscillation"),
        outcome: FusionOutcome {
            root_cause: "Reference source switching oscillation",
            impact: "PLL repeatedly relocks, sync is unstable",
            actions: &[
                "Check the quality of every candidate reference",
                "Review reference priorities and switch hold-off settings",
            ],
            causal_chain: &["reference instability", "source oscillation"],
        },
    },
    FusionRule {
        id: "switch_port_fault",
        condition: |t| has(t, "port_flap") || has(t, "port_down"),
        outcome: FusionOutcome {
            root_cause: "Switch port abnormality",
            impact: "Link interruption, possible transport and sync impact",
            actions: &[
                "Check the port optics, cabling and peer device",
                "Review the port error counters",
            ],
            causal_chain: &["port fault"],
        },
    },
];

/// First rule in `rules` whose condition holds for `types`.
pub fn evaluate<'a>(rules: &'a [FusionRule], types: &EventTypeSet) -> Option<&'a FusionRule> {
    rules.iter().find(|rule| (rule.condition)(types))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire(types: &[&str]) -> Option<&'static str> {
        let set: EventTypeSet = types.iter().map(|t| t.to_string()).collect();
        evaluate(FUSION_RULES, &set).map(|r| r.id)
    }

    #[test]
    fn test_rule_1_port_flap_with_holdover_or_unlock() {
        assert_eq!(fire(&["port_flap", "state_change"]), Some("switch_jitter_holdover"));
        assert_eq!(fire(&["port_flap", "pll_unlock"]), Some("switch_jitter_holdover"));
        // Outranks rule 2 even when its condition also holds.
        assert_eq!(
            fire(&["port_flap", "reference_lost", "state_change"]),
            Some("switch_jitter_holdover")
        );
    }

    #[test]
    fn test_rule_2_reference_anomaly() {
        assert_eq!(fire(&["reference_lost", "state_change"]), Some("reference_anomaly_holdover"));
        assert_eq!(fire(&["pll_unlock", "state_change"]), Some("reference_anomaly_holdover"));
        assert_eq!(
            fire(&["reference_lost", "pll_unlock", "state_change"]),
            Some("reference_anomaly_holdover")
        );
    }

    #[test]
    fn test_rule_3_pll_unlock_alone() {
        assert_eq!(fire(&["pll_unlock"]), Some("pll_unlock"));
        assert_eq!(fire(&["pll_unlock", "reference_lost"]), Some("pll_unlock"));
    }

    #[test]
    fn test_rule_4_antenna() {
        assert_eq!(fire(&["antenna_fault", "reference_lost"]), Some("antenna_fault"));
    }

    #[test]
    fn test_rule_5_oscillation() {
        assert_eq!(fire(&["source_oscillation"]), Some("source_oscillation"));
        // Antenna fault outranks oscillation.
        assert_eq!(fire(&["source_oscillation", "antenna_fault"]), Some("antenna_fault"));
    }

    #[test]
    fn test_rule_6_port_fault() {
        assert_eq!(fire(&["port_flap"]), Some("switch_port_fault"));
        assert_eq!(fire(&["port_down", "port_up"]), Some("switch_port_fault"));
    }

    #[test]
    fn test_no_rule_matches() {
        assert_eq!(fire(&[]), None);
        assert_eq!(fire(&["state_change"]), None);
        assert_eq!(fire(&["reference_lost"]), None);
        assert_eq!(fire(&["clock_unknown", "switch_unknown", "port_up"]), None);
    }

    #[test]
    fn test_every_outcome_has_actions() {
        for rule in FUSION_RULES {
            assert!(!rule.outcome.actions.is_empty(), "{} has no actions", rule.id);
            assert!(!rule.outcome.causal_chain.is_empty(), "{} has no chain", rule.id);
        }
    }
}
