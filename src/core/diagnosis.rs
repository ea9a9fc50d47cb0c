// FaultLens - core/diagnosis.rs
//
// The diagnosis core: skill pack registry, single-pass routing and
// normalisation, progressive knowledge retrieval, and causal fusion.
//
// Every call is a pure function of its input lines and the static tables.
// The only mutable state is the registry, which is fixed once wiring is
// done, so `&DiagnosisCore` can be shared across threads freely.

use crate::core::model::{KnowledgeSnippet, Report, TimeWindow, UnifiedEvent};
use crate::core::parser;
use crate::core::rules::{self, EventTypeSet, FusionRule, FUSION_RULES};
use crate::core::skillpack::{self, SkillPack};
use crate::util::constants;
use crate::util::error::DiagnosisError;
use crate::util::logging::preview;
use std::collections::BTreeMap;

// =============================================================================
// Configuration
// =============================================================================

/// Tunables for progressive retrieval and evidence collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalConfig {
    /// Highest tier visited (0..=3).
    pub max_level: u8,
    /// Token budget granted to each tier.
    pub budget_per_level: usize,
    /// Accumulated count that ends retrieval after tier 0 or 1.
    pub early_stop_count: usize,
    /// Maximum number of snippet texts kept in the report.
    pub evidence_cap: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_level: constants::MAX_KNOWLEDGE_LEVEL,
            budget_per_level: constants::DEFAULT_BUDGET_PER_LEVEL,
            early_stop_count: constants::DEFAULT_EARLY_STOP_COUNT,
            evidence_cap: constants::DEFAULT_EVIDENCE_CAP,
        }
    }
}

// =============================================================================
// Routing result
// =============================================================================

/// Output of the routing + normalisation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Routing {
    /// One event per claimed line, in input order.
    pub events: Vec<UnifiedEvent>,
    /// Components with at least one claimed line, by descending hit count;
    /// ties keep registration order.
    pub routed: Vec<String>,
}

// =============================================================================
// DiagnosisCore
// =============================================================================

/// Registry of skill packs plus the end-to-end diagnosis pipeline.
pub struct DiagnosisCore {
    packs: Vec<Box<dyn SkillPack>>,
    retrieval: RetrievalConfig,
}

impl DiagnosisCore {
    /// An empty registry with default retrieval settings.
    pub fn new() -> Self {
        Self {
            packs: Vec::new(),
            retrieval: RetrievalConfig::default(),
        }
    }

    /// The default registry: Clock then Switch.
    pub fn with_default_packs() -> Self {
        let mut core = Self::new();
        for pack in skillpack::default_packs() {
            core.register(pack);
        }
        core
    }

    /// Replace the retrieval settings used by `diagnose`.
    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// Insert `pack`, or overwrite the pack registered under the same name.
    ///
    /// An overwritten pack keeps its original registration position.
    pub fn register(&mut self, pack: Box<dyn SkillPack>) {
        match self.packs.iter().position(|p| p.name() == pack.name()) {
            Some(idx) => {
                tracing::debug!(component = pack.name(), "Skill pack replaced");
                self.packs[idx] = pack;
            }
            None => {
                tracing::debug!(component = pack.name(), "Skill pack registered");
                self.packs.push(pack);
            }
        }
    }

    /// Registered component names in registration order.
    pub fn component_names(&self) -> Vec<String> {
        self.packs.iter().map(|p| p.name().to_string()).collect()
    }

    fn pack(&self, name: &str) -> Option<&dyn SkillPack> {
        self.packs.iter().find(|p| p.name() == name).map(|p| p.as_ref())
    }

    // -------------------------------------------------------------------------
    // Routing
    // -------------------------------------------------------------------------

    /// Route and normalise every line in one pass.
    ///
    /// Packs are tried in registration order and the first one returning an
    /// event claims the line; later packs never see it.
    pub fn route<S: AsRef<str>>(&self, lines: &[S]) -> Routing {
        let mut hits = vec![0usize; self.packs.len()];
        let mut events = Vec::new();

        for line in lines {
            let line = line.as_ref();
            let claimed = self
                .packs
                .iter()
                .enumerate()
                .find_map(|(idx, pack)| pack.normalize(line).map(|event| (idx, event)));

            match claimed {
                Some((idx, event)) => {
                    tracing::trace!(
                        component = %event.component,
                        event_type = %event.event_type,
                        line = preview(line),
                        "Line claimed"
                    );
                    hits[idx] += 1;
                    events.push(event);
                }
                None => {
                    tracing::trace!(line = preview(line), "Line unclaimed");
                }
            }
        }

        // Stable sort on registration order, so equal counts keep that order.
        let mut order: Vec<usize> = (0..self.packs.len()).filter(|&i| hits[i] > 0).collect();
        order.sort_by(|&a, &b| hits[b].cmp(&hits[a]));
        let routed = order
            .into_iter()
            .map(|i| self.packs[i].name().to_string())
            .collect();

        Routing { events, routed }
    }

    // -------------------------------------------------------------------------
    // Progressive retrieval
    // -------------------------------------------------------------------------

    /// Fetch knowledge for `component` tier by tier, from 0 up to `max_level`.
    ///
    /// After tier 0 and tier 1 the accumulated list is checked against the
    /// early-stop count; tiers 2 and 3 are therefore always visited unless
    /// the background tiers alone already yielded that many snippets.
    ///
    /// Fails with `UnknownComponent` when no pack is registered under
    /// `component`.
    pub fn progressive_retrieve(
        &self,
        component: &str,
        query: &str,
        max_level: u8,
        budget_per_level: usize,
    ) -> Result<Vec<KnowledgeSnippet>, DiagnosisError> {
        let pack = self
            .pack(component)
            .ok_or_else(|| DiagnosisError::UnknownComponent {
                name: component.to_string(),
                registered: self.component_names(),
            })?;

        let max_level = max_level.min(constants::MAX_KNOWLEDGE_LEVEL);
        let mut selected: Vec<KnowledgeSnippet> = Vec::new();

        for level in 0..=max_level {
            let tier = pack.retrieve(query, level, budget_per_level);
            tracing::debug!(component, level, snippets = tier.len(), "Tier retrieved");
            selected.extend(tier);

            if level <= constants::EARLY_STOP_MAX_LEVEL
                && selected.len() >= self.retrieval.early_stop_count
            {
                tracing::debug!(component, level, total = selected.len(), "Early stop");
                break;
            }
        }

        Ok(selected)
    }

    // -------------------------------------------------------------------------
    // Fusion
    // -------------------------------------------------------------------------

    /// Diagnose a set of raw log lines.
    ///
    /// Lines may mix all supported grammars and arrive in any order. Never
    /// fails: unmatched input yields the "unidentified" root cause with the
    /// generic follow-up action.
    pub fn diagnose<S: AsRef<str>>(&self, lines: &[S]) -> Report {
        let Routing { events, routed } = self.route(lines);

        let query = lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n");

        let mut evidence: Vec<String> = Vec::new();
        let mut retrieval_trace: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for component in &routed {
            match self.progressive_retrieve(
                component,
                &query,
                self.retrieval.max_level,
                self.retrieval.budget_per_level,
            ) {
                Ok(snippets) => {
                    retrieval_trace.insert(
                        component.clone(),
                        snippets.iter().map(|s| s.source.to_string()).collect(),
                    );
                    evidence.extend(snippets.iter().map(|s| s.text.to_string()));
                }
                Err(e) => {
                    // Routed names come from the registry itself.
                    tracing::error!(error = %e, "Routed component vanished from registry");
                }
            }
        }
        evidence.truncate(self.retrieval.evidence_cap);

        let event_types: EventTypeSet = events.iter().map(|e| e.event_type.clone()).collect();
        let matched: Option<&FusionRule> = rules::evaluate(FUSION_RULES, &event_types);

        let (root_cause, impact, recommended_actions, causal_chain) = match matched {
            Some(rule) => (
                rule.outcome.root_cause.to_string(),
                rule.outcome.impact.to_string(),
                to_strings(rule.outcome.actions),
                to_strings(rule.outcome.causal_chain),
            ),
            None => (
                constants::ROOT_CAUSE_UNIDENTIFIED.to_string(),
                constants::IMPACT_UNDETERMINED.to_string(),
                vec![constants::DEFAULT_ACTION.to_string()],
                Vec::new(),
            ),
        };

        let components = if routed.is_empty() {
            constants::NO_COMPONENT_MARKER.to_string()
        } else {
            routed.join(", ")
        };
        let phenomenon_summary = format!(
            "Detected {} key events across components: {components}",
            events.len()
        );

        tracing::info!(
            lines = lines.len(),
            events = events.len(),
            components = %components,
            rule = matched.map(|r| r.id).unwrap_or("-"),
            "Diagnosis complete"
        );

        Report {
            phenomenon_summary,
            root_cause,
            impact,
            recommended_actions,
            causal_chain,
            evidence,
            retrieval_trace,
            matched_rule: matched.map(|r| r.id.to_string()),
            time_window: time_window(&events),
            events,
        }
    }
}

impl Default for DiagnosisCore {
    fn default() -> Self {
        Self::with_default_packs()
    }
}

impl std::fmt::Debug for DiagnosisCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosisCore")
            .field("components", &self.component_names())
            .field("retrieval", &self.retrieval)
            .finish()
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Span covered by the events' parseable timestamps.
fn time_window(events: &[UnifiedEvent]) -> Option<TimeWindow> {
    let mut stamps = events
        .iter()
        .filter_map(|e| e.timestamp.as_deref())
        .filter_map(parser::parse_timestamp);
    let first = stamps.next()?;
    let (start, end) = stamps.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));
    Some(TimeWindow { start, end })
}

// =============================================================================
// Tests
// =============================================================================
