use crate::engine::parser::ParseOutcome;
use crate::engine::report::ValidationReport;
use crate::engine::rules::{RuleCategory, Validation};
use crate::engine::run::Run;
use crate::templates;

// Hard backstop against infinite retry loops; runs before the parser.
pub fn intercept_max_iterations(run: &Run) -> Option<String> {
    if run.iteration < run.max_iterations {
        return None;
    }
    Some(templates::iteration_exhausted_message(run))
}

pub fn intercept_format(outcome: &ParseOutcome, min_acceptance_tests: usize) -> Option<String> {
    if !outcome.missing_blocks.is_empty() {
        return Some(templates::format_retry_message(
            &outcome.missing_blocks,
            None,
            min_acceptance_tests,
        ));
    }
    let submission = outcome.submission.as_ref()?;
    let short_on_tests = submission.acceptance_tests.len() < min_acceptance_tests;
    let missing_next_action = submission.next_action.is_none();
    if short_on_tests || missing_next_action {
        return Some(templates::format_retry_message(
            &outcome.missing_blocks,
            Some((submission.acceptance_tests.len(), missing_next_action)),
            min_acceptance_tests,
        ));
    }
    None
}

pub fn intercept_self_reference(report: &ValidationReport) -> Option<String> {
    let offenders: Vec<&Validation> = report
        .critical_fails
        .iter()
        .filter(|validation| validation.category == RuleCategory::SelfReference)
        .collect();
    if offenders.is_empty() {
        return None;
    }
    Some(templates::self_reference_message(&offenders))
}
