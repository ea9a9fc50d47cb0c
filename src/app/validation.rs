// FaultLens - app/validation.rs
//
// Canned end-to-end scenarios that check the registry, the parsers and the
// fusion table close the loop from raw lines to a named root cause.

use crate::core::diagnosis::DiagnosisCore;
use serde::Serialize;

/// One scenario: input lines plus the words the root cause must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationCase {
    pub name: &'static str,
    pub lines: Vec<&'static str>,
    /// Each must be a case-insensitive substring of the root cause.
    pub expected_root_keywords: Vec<&'static str>,
}

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDetail {
    pub name: String,
    pub passed: bool,
    pub root_cause: String,
    pub causal_chain: Vec<String>,
}

/// Aggregate outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub passed: usize,
    pub details: Vec<ValidationDetail>,
}

impl ValidationSummary {
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// The built-in scenarios, covering all three line grammars.
pub fn default_validation_cases() -> Vec<ValidationCase> {
    vec![
        ValidationCase {
            name: "clock_holdover_tag_format",
            lines: vec![
                "[CLK][WARN] reference lost",
                "[CLK][ERROR] PLL status changed: LOCK -> UNLOCK",
                "[CLK][INFO] enter holdover",
            ],
            expected_root_keywords: vec!["reference", "holdover"],
        },
        ValidationCase {
            name: "switch_clock_fusion_tag_format",
            lines: vec!["[SW][WARN] port flap detected on ge0/0/1", "[CLK][INFO] enter holdover"],
            expected_root_keywords: vec!["Switch", "Holdover"],
        },
        ValidationCase {
            name: "clock_holdover_structured_format",
            lines: vec![
                "[360150][42] 2026/02/01 10:00:10.500890123 0x30B00010 ERROR src/driver/clk/clk_ref_sel.c:200 ClkRefSel_QualityMonitor: GNSS reference source unavailable (0x00000001, 0x00000000, 0x00000000, 0x00000000)",
                "[360155][42] 2026/02/01 10:00:15.550901234 0x30A00002 ERROR src/driver/clk/clk_core.c:405 Clk_CheckPllStatus: PLL status changed LOCK->UNLOCK state_reg=0x3 (0x00000003, 0x00000000, 0x00000044, 0x00000000)",
                "[360170][42] 2026/02/01 10:00:10.700234567 0x30100020 TIPS src/driver/clk/holdover.c:88 Holdover_Activate: Holdover mode activated oscillator=OCXO (0x00000001, 0x0000000F, 0x00015180, 0x00000000)",
            ],
            expected_root_keywords: vec!["reference", "holdover"],
        },
        ValidationCase {
            name: "switch_clock_fusion_structured_format",
            lines: vec![
                "[360050][80] 2026/02/01 10:00:05.000567890 0x80A00001 ERROR src/driver/switch/port_mgr.c:88 PortMgr_LinkFlapDetect: port flap detected on ge0/0/1 flap_count=5 (0x00000005, 0x00000001, 0x00000000, 0x00000000)",
                "[360170][42] 2026/02/01 10:00:10.700234567 0x30100020 TIPS src/driver/clk/holdover.c:88 Holdover_Activate: Holdover mode activated oscillator=OCXO (0x00000001, 0x0000000F, 0x00015180, 0x00000000)",
            ],
            expected_root_keywords: vec!["Switch", "Holdover"],
        },
        ValidationCase {
            name: "clock_holdover_board_format",
            lines: vec![
                "c[2026/02/01 10:00:10.500890123] sev:WARN src:CLK_REF_SEL RefQualityMonitor(): GNSS reference source unavailable.",
                "c[2026/02/01 10:00:15.550901234] sev:ERR error:0x30A002 src:PLL_CTRL:: [ clk_core.c / Clk_CheckPllStatus / 405 ]: PLL status changed: LOCK -> UNLOCK.",
                "c[2026/02/01 10:00:10.700234567] sev:INFO src:HOLDOVER_CTRL HoldoverActivate(): Holdover mode activated.",
            ],
            expected_root_keywords: vec!["reference", "holdover"],
        },
        ValidationCase {
            name: "gps_antenna_fault",
            lines: vec![
                "[CLK][ERROR] GPS antenna open detected",
                "[CLK][WARN] reference lost",
            ],
            expected_root_keywords: vec!["antenna"],
        },
        ValidationCase {
            name: "switch_port_down",
            lines: vec!["[SW][ERROR] ge0/0/2 link down"],
            expected_root_keywords: vec!["switch", "port"],
        },
    ]
}

/// Run every case in `cases` through `core`.
pub fn run_cases(core: &DiagnosisCore, cases: &[ValidationCase]) -> ValidationSummary {
    let details: Vec<ValidationDetail> = cases
        .iter()
        .map(|case| {
            let report = core.diagnose(&case.lines);
            let root = report.root_cause.to_lowercase();
            let passed = case
                .expected_root_keywords
                .iter()
                .all(|k| root.contains(&k.to_lowercase()));
            tracing::debug!(case = case.name, passed, root_cause = %report.root_cause, "Validation case");
            ValidationDetail {
                name: case.name.to_string(),
                passed,
                root_cause: report.root_cause,
                causal_chain: report.causal_chain,
            }
        })
        .collect();

    let passed = details.iter().filter(|d| d.passed).count();
    tracing::info!(total = details.len(), passed, "Validation complete");
    ValidationSummary {
        total: details.len(),
        passed,
        details,
    }
}

/// Run the built-in scenarios through `core`.
pub fn run_validation(core: &DiagnosisCore) -> ValidationSummary {
    run_cases(core, &default_validation_cases())
}
