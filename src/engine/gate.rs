use crate::engine::checklist::Checklist;
use crate::engine::report::ValidationReport;
use crate::engine::rules::{RuleCategory, RuleStatus, Validation};
use crate::engine::run::Run;
use crate::engine::submission::{Artifact, Submission};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const RULE_GATE_ARTIFACT: &str = "G1_ARTIFACT_PRESENT";
pub const RULE_GATE_PLACEMENT: &str = "G2_PLACEMENT";
pub const RULE_GATE_TESTS: &str = "G3_TEST_COUNT";
pub const RULE_GATE_FALLBACK: &str = "G4_FALLBACK";
pub const RULE_GATE_DEPLOY_NOTES: &str = "G5_DEPLOY_NOTES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateOutcome {
    pub passed: bool,
    pub checklist: Checklist,
    pub validations: Vec<Validation>,
    pub fail_reasons: Vec<String>,
    pub required_actions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CompletionGate {
    min_acceptance_tests: usize,
}

impl CompletionGate {
    pub fn new(min_acceptance_tests: usize) -> Self {
        Self {
            min_acceptance_tests,
        }
    }

    pub fn check(&self, run: &Run, submission: &Submission, report: &ValidationReport) -> GateOutcome {
        let mut validations = Vec::new();
        let mut fail_reasons = Vec::new();
        let mut required_actions = Vec::new();

        let mut record =
            |validation: Validation, fail_reason: Option<String>, required_action: Option<&str>| {
                if let Some(reason) = fail_reason {
                    fail_reasons.push(reason);
                }
                if let Some(action) = required_action {
                    required_actions.push(action.to_string());
                }
                validations.push(validation);
            };

        if submission.has_executable_artifact() {
            record(
                Validation::pass(RULE_GATE_ARTIFACT, "executable artifact", RuleCategory::Gate)
                    .with_details(json!({ "runId": run.run_id })),
                None,
                None,
            );
        } else {
            record(
                Validation::fail(
                    RULE_GATE_ARTIFACT,
                    "executable artifact",
                    RuleCategory::Gate,
                    "no executable artifact was submitted".to_string(),
                ),
                Some("no executable artifact was submitted".to_string()),
                Some("provide at least one formula artifact with concrete content"),
            );
        }

        let unplaced: Vec<&Artifact> = submission
            .artifacts
            .iter()
            .filter(|artifact| artifact.placement.is_empty())
            .collect();
        if submission.artifacts.is_empty() || !unplaced.is_empty() {
            let reason = if submission.artifacts.is_empty() {
                "no artifact carries placement information".to_string()
            } else {
                format!(
                    "{} artifact(s) carry no placement information",
                    unplaced.len()
                )
            };
            record(
                Validation::fail(
                    RULE_GATE_PLACEMENT,
                    "artifact placement",
                    RuleCategory::Gate,
                    reason.clone(),
                ),
                Some(reason),
                Some("give every artifact a target sheet, cell, range, or column"),
            );
        } else {
            record(
                Validation::pass(RULE_GATE_PLACEMENT, "artifact placement", RuleCategory::Gate),
                None,
                None,
            );
        }

        let test_count = submission.acceptance_tests.len();
        if test_count < self.min_acceptance_tests {
            let reason = format!(
                "only {test_count} acceptance test(s) were provided (minimum {})",
                self.min_acceptance_tests
            );
            record(
                Validation::fail(
                    RULE_GATE_TESTS,
                    "acceptance test count",
                    RuleCategory::Gate,
                    reason.clone(),
                ),
                Some(reason),
                Some("provide at least 3 acceptance tests, each on its own numbered line"),
            );
        } else {
            record(
                Validation::pass(RULE_GATE_TESTS, "acceptance test count", RuleCategory::Gate),
                None,
                None,
            );
        }

        if submission.fallback_plans.is_empty() {
            record(
                Validation::fail(
                    RULE_GATE_FALLBACK,
                    "fallback plan",
                    RuleCategory::Gate,
                    "no fallback plan was provided".to_string(),
                ),
                Some("no fallback plan was provided".to_string()),
                Some("provide at least one fallback plan in `if <condition> then <action>` form"),
            );
        } else {
            record(
                Validation::pass(RULE_GATE_FALLBACK, "fallback plan", RuleCategory::Gate),
                None,
                None,
            );
        }

        let has_notes = submission
            .deploy_notes
            .as_ref()
            .map(|notes| !notes.is_empty())
            .unwrap_or(false);
        if has_notes {
            record(
                Validation::pass(RULE_GATE_DEPLOY_NOTES, "deploy notes", RuleCategory::Gate),
                None,
                None,
            );
        } else {
            record(
                Validation::fail(
                    RULE_GATE_DEPLOY_NOTES,
                    "deploy notes",
                    RuleCategory::Gate,
                    "no deploy notes were provided".to_string(),
                ),
                Some("no deploy notes were provided".to_string()),
                Some(
                    "provide deploy notes covering protect_ranges, naming_conventions, or permissions",
                ),
            );
        }

        let gate_failed = validations
            .iter()
            .any(|validation| validation.status == RuleStatus::Fail);
        let checklist = report.checklist;

        GateOutcome {
            passed: checklist.is_complete() && !gate_failed,
            checklist,
            validations,
            fail_reasons,
            required_actions,
        }
    }
}
