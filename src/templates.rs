use crate::engine::gate::GateOutcome;
use crate::engine::report::ValidationReport;
use crate::engine::rules::Validation;
use crate::engine::run::{Run, Stage};
use crate::engine::submission::Submission;

pub const SUBMISSION_TEMPLATE: &str = "\
[STATE]
current_state=<StageName>
next_state=<StageName>

[ARTIFACTS]
- type=<FORMULA|STEPS|TEMPLATE|SCHEMA_PLAN> platform=<excel|google_sheets> target_sheet=<name> target_range=<addr> content=<text>

[ACCEPTANCE_TESTS]
1) <description>
2) <description>
3) <description>

[FALLBACK]
- if <condition> then <action>

[DEPLOY_NOTES]
- protect_ranges: <comma list>
- naming_conventions: <comma list>
- permissions: <comma list>

[NEXT_ACTION]
- system_will_validate: <text>
- user_needs_to_provide: <text>
- if_fail_agent_will: <text>";

pub fn format_retry_message(
    missing_blocks: &[String],
    parsed_defects: Option<(usize, bool)>,
    min_acceptance_tests: usize,
) -> String {
    let mut lines = vec!["Your submission could not be accepted.".to_string()];
    if !missing_blocks.is_empty() {
        lines.push(format!(
            "- missing required sections: {}",
            missing_blocks.join(", ")
        ));
    }
    if let Some((test_count, missing_next_action)) = parsed_defects {
        if test_count < min_acceptance_tests {
            lines.push(format!(
                "- {test_count} acceptance test(s) found, at least {min_acceptance_tests} are required"
            ));
        }
        if missing_next_action {
            lines.push("- the [NEXT_ACTION] section is required".to_string());
        }
    }
    lines.push("Resubmit the complete package using exactly this template:".to_string());
    lines.push(String::new());
    lines.push(SUBMISSION_TEMPLATE.to_string());
    lines.join("\n")
}

pub fn self_reference_message(offenders: &[&Validation]) -> String {
    let mut lines =
        vec!["A submitted formula references its own target column, which corrupts recalculation:"
            .to_string()];
    for validation in offenders {
        lines.push(format!(
            "- {}: {}",
            validation.rule_id,
            validation
                .reason
                .as_deref()
                .unwrap_or("self-reference detected")
        ));
    }
    lines.push(
        "Redesign each offending formula so it reads only from other columns, then resubmit the full package."
            .to_string(),
    );
    lines.join("\n")
}

pub fn iteration_exhausted_message(run: &Run) -> String {
    let mut lines = vec![format!(
        "The iteration budget for this run is exhausted ({} of {} rounds used).",
        run.iteration, run.max_iterations
    )];
    let missing = run.checklist.missing_items();
    if missing.is_empty() {
        lines.push("All checklist items are currently satisfied.".to_string());
    } else {
        lines.push("These completion requirements are still unmet:".to_string());
        for item in missing {
            lines.push(format!("- {item}"));
        }
    }
    lines.push(
        "Automatic retries have stopped. Please review the run yourself and either supply the missing pieces or abandon the task."
            .to_string(),
    );
    lines.join("\n")
}

pub fn force_continue_message(
    gate: &GateOutcome,
    report: &ValidationReport,
    regressed_to: Stage,
) -> String {
    let mut lines = vec!["The task is not finished; completion was rejected.".to_string()];
    for reason in &gate.fail_reasons {
        lines.push(format!("- {reason}"));
    }
    for validation in &report.critical_fails {
        lines.push(format!(
            "- rule {} failed: {}",
            validation.rule_id,
            validation.reason.as_deref().unwrap_or("no reason recorded")
        ));
    }
    for validation in &report.warnings {
        lines.push(format!(
            "- warning {}: {}",
            validation.rule_id,
            validation.reason.as_deref().unwrap_or("no reason recorded")
        ));
    }
    if !gate.required_actions.is_empty() {
        lines.push("Required actions:".to_string());
        for action in &gate.required_actions {
            lines.push(format!("- {action}"));
        }
    }
    lines.push(format!(
        "The run has moved back to stage `{regressed_to}`. Redo the work and resubmit the full package."
    ));
    lines.join("\n")
}

pub fn success_summary(run: &Run, submission: &Submission) -> String {
    let mut lines = vec![
        "All completion requirements are satisfied; the run is deployed.".to_string(),
        format!(
            "Delivered {} artifact(s), {} acceptance test(s), {} fallback plan(s).",
            submission.artifacts.len(),
            submission.acceptance_tests.len(),
            submission.fallback_plans.len()
        ),
    ];
    for artifact in &submission.artifacts {
        lines.push(format!(
            "- {} on {} at {}",
            artifact.kind,
            artifact.platform,
            artifact.placement.describe()
        ));
    }
    lines.push(format!(
        "Run {} finished after {} iteration(s).",
        run.run_id, run.iteration
    ));
    lines.join("\n")
}
