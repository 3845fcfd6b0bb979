use crate::engine::checklist::Checklist;
use crate::engine::rules::{validate_artifact, RuleCategory, RuleStatus, Validation};
use crate::engine::submission::Submission;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const RULE_ST_ARTIFACTS: &str = "ST1_ARTIFACTS";
pub const RULE_ST_TESTS: &str = "ST2_TESTS";
pub const RULE_ST_FALLBACK: &str = "ST3_FALLBACK";
pub const RULE_ST_DEPLOY_NOTES: &str = "ST4_DEPLOY_NOTES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub all_passed: bool,
    pub critical_fails: Vec<Validation>,
    pub warnings: Vec<Validation>,
    pub passes: Vec<Validation>,
    pub checklist: Checklist,
    pub summary: String,
}

impl ValidationReport {
    pub fn validations(&self) -> impl Iterator<Item = &Validation> {
        self.passes
            .iter()
            .chain(self.warnings.iter())
            .chain(self.critical_fails.iter())
    }
}

#[derive(Debug, Clone)]
pub struct ValidationEngine {
    min_acceptance_tests: usize,
}

impl ValidationEngine {
    pub fn new(min_acceptance_tests: usize) -> Self {
        Self {
            min_acceptance_tests,
        }
    }

    pub fn evaluate(&self, submission: &Submission) -> ValidationReport {
        let mut validations = Vec::new();
        for artifact in &submission.artifacts {
            validations.extend(validate_artifact(artifact));
        }
        validations.extend(self.structural_checks(submission));

        let checklist = Checklist::derive(submission, &validations, self.min_acceptance_tests);

        let mut critical_fails = Vec::new();
        let mut warnings = Vec::new();
        let mut passes = Vec::new();
        for validation in validations {
            match validation.status {
                RuleStatus::Fail => critical_fails.push(validation),
                RuleStatus::Warn => warnings.push(validation),
                RuleStatus::Pass => passes.push(validation),
            }
        }

        let summary = render_summary(&critical_fails, &warnings, &passes, checklist);

        ValidationReport {
            all_passed: critical_fails.is_empty(),
            critical_fails,
            warnings,
            passes,
            checklist,
            summary,
        }
    }

    fn structural_checks(&self, submission: &Submission) -> Vec<Validation> {
        let mut checks = Vec::new();

        checks.push(if submission.artifacts.is_empty() {
            Validation::fail(
                RULE_ST_ARTIFACTS,
                "artifacts present",
                RuleCategory::Structural,
                "the submission declares no artifacts".to_string(),
            )
        } else {
            Validation::pass(RULE_ST_ARTIFACTS, "artifacts present", RuleCategory::Structural)
                .with_details(json!({ "count": submission.artifacts.len() }))
        });

        let test_count = submission.acceptance_tests.len();
        checks.push(if test_count < self.min_acceptance_tests {
            Validation::fail(
                RULE_ST_TESTS,
                "acceptance test count",
                RuleCategory::Structural,
                format!(
                    "{test_count} acceptance test(s) declared, minimum is {}",
                    self.min_acceptance_tests
                ),
            )
            .with_details(json!({ "count": test_count, "minimum": self.min_acceptance_tests }))
        } else {
            Validation::pass(RULE_ST_TESTS, "acceptance test count", RuleCategory::Structural)
                .with_details(json!({ "count": test_count, "minimum": self.min_acceptance_tests }))
        });

        checks.push(if submission.fallback_plans.is_empty() {
            Validation::fail(
                RULE_ST_FALLBACK,
                "fallback plan present",
                RuleCategory::Structural,
                "the submission declares no fallback plan".to_string(),
            )
        } else {
            Validation::pass(RULE_ST_FALLBACK, "fallback plan present", RuleCategory::Structural)
                .with_details(json!({ "count": submission.fallback_plans.len() }))
        });

        let has_notes = submission
            .deploy_notes
            .as_ref()
            .map(|notes| !notes.is_empty())
            .unwrap_or(false);
        checks.push(if has_notes {
            Validation::pass(
                RULE_ST_DEPLOY_NOTES,
                "deploy notes present",
                RuleCategory::Structural,
            )
        } else {
            Validation::fail(
                RULE_ST_DEPLOY_NOTES,
                "deploy notes present",
                RuleCategory::Structural,
                "the submission declares no deploy notes".to_string(),
            )
        });

        checks
    }
}

fn render_summary(
    critical_fails: &[Validation],
    warnings: &[Validation],
    passes: &[Validation],
    checklist: Checklist,
) -> String {
    let mut lines = vec![format!(
        "validation: {} passed, {} warned, {} failed",
        passes.len(),
        warnings.len(),
        critical_fails.len()
    )];
    for validation in critical_fails {
        lines.push(format!(
            "fail {}: {}",
            validation.rule_id,
            validation.reason.as_deref().unwrap_or("no reason recorded")
        ));
    }
    for validation in warnings {
        lines.push(format!(
            "warn {}: {}",
            validation.rule_id,
            validation.reason.as_deref().unwrap_or("no reason recorded")
        ));
    }
    let missing = checklist.missing_items();
    if missing.is_empty() {
        lines.push("checklist: complete".to_string());
    } else {
        lines.push(format!("checklist missing: {}", missing.join(", ")));
    }
    lines.join("\n")
}
