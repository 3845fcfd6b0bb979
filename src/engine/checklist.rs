use crate::engine::rules::{RuleCategory, RuleStatus, Validation};
use crate::engine::submission::Submission;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub has_executable_artifact: bool,
    pub artifacts_have_placement: bool,
    pub supports_auto_expand: bool,
    pub avoids_self_reference: bool,
    pub has_acceptance_tests: bool,
    pub has_fallback_plan: bool,
    pub has_deploy_notes: bool,
}

impl Checklist {
    // The one place the seven completion flags are computed.
    pub fn derive(
        submission: &Submission,
        validations: &[Validation],
        min_acceptance_tests: usize,
    ) -> Self {
        let auto_expand_pass = validations
            .iter()
            .any(|v| v.category == RuleCategory::AutoExpand && v.status == RuleStatus::Pass);
        let hard_coded_warn = validations
            .iter()
            .any(|v| v.category == RuleCategory::HardCodedRange && v.status == RuleStatus::Warn);
        let self_reference_fail = validations
            .iter()
            .any(|v| v.category == RuleCategory::SelfReference && v.status == RuleStatus::Fail);

        Self {
            has_executable_artifact: submission.has_executable_artifact(),
            artifacts_have_placement: !submission.artifacts.is_empty()
                && submission
                    .artifacts
                    .iter()
                    .all(|artifact| !artifact.placement.is_empty()),
            supports_auto_expand: auto_expand_pass || !hard_coded_warn,
            avoids_self_reference: !self_reference_fail,
            has_acceptance_tests: submission.acceptance_tests.len() >= min_acceptance_tests,
            has_fallback_plan: !submission.fallback_plans.is_empty(),
            has_deploy_notes: submission
                .deploy_notes
                .as_ref()
                .map(|notes| !notes.is_empty())
                .unwrap_or(false),
        }
    }

    pub fn is_complete(self) -> bool {
        self.has_executable_artifact
            && self.artifacts_have_placement
            && self.supports_auto_expand
            && self.avoids_self_reference
            && self.has_acceptance_tests
            && self.has_fallback_plan
            && self.has_deploy_notes
    }

    pub fn entries(self) -> [(&'static str, bool); 7] {
        [
            ("executable artifact", self.has_executable_artifact),
            ("artifact placement", self.artifacts_have_placement),
            ("automatic range growth", self.supports_auto_expand),
            ("no self-referencing formula", self.avoids_self_reference),
            ("acceptance tests", self.has_acceptance_tests),
            ("fallback plan", self.has_fallback_plan),
            ("deploy notes", self.has_deploy_notes),
        ]
    }

    pub fn missing_items(self) -> Vec<&'static str> {
        self.entries()
            .into_iter()
            .filter(|(_, done)| !done)
            .map(|(label, _)| label)
            .collect()
    }
}
