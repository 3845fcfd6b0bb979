use sheetgate::engine::parser::{SubmissionParser, MARKER_FALLBACK};
use sheetgate::engine::run::Stage;
use sheetgate::engine::submission::{ArtifactKind, Platform};

fn parser() -> SubmissionParser {
    SubmissionParser::new(Platform::GoogleSheets)
}

fn full_package() -> String {
    [
        "[STATE]",
        "current_state=executed",
        "next_state=verified",
        "",
        "[ARTIFACTS]",
        "- type=FORMULA platform=google_sheets target_sheet=Data target_column=C content==ARRAYFORMULA(A2:A * B2:B)",
        "",
        "[ACCEPTANCE_TESTS]",
        "1) totals column matches a manual sum over the first ten rows",
        "2) blank input rows produce blank outputs",
        "3) new rows are picked up without editing the formula",
        "",
        "[FALLBACK]",
        "- if the formula shows a #REF! error then restore the previous version from history",
        "",
        "[DEPLOY_NOTES]",
        "- protect_ranges: C2:C",
        "- naming_conventions: totals_",
        "- permissions: editors only",
        "",
        "[NEXT_ACTION]",
        "- system_will_validate: formula rules and the completion checklist",
        "- user_needs_to_provide: confirmation that column C is free",
        "- if_fail_agent_will: redesign the formula and resubmit",
    ]
    .join("\n")
}

#[test]
fn full_package_parses_with_no_missing_blocks() {
    let outcome = parser().parse(&full_package(), 100);
    assert!(outcome.success);
    assert!(outcome.missing_blocks.is_empty());

    let submission = outcome.submission.expect("submission");
    assert_eq!(submission.proposed_stage, Stage::Verified);
    assert_eq!(submission.artifacts.len(), 1);
    assert_eq!(submission.acceptance_tests.len(), 3);
    assert_eq!(submission.fallback_plans.len(), 1);
    assert!(submission.deploy_notes.is_some());
    assert!(submission.next_action.is_some());
}

#[test]
fn artifact_attributes_are_decomposed() {
    let outcome = parser().parse(&full_package(), 100);
    let submission = outcome.submission.expect("submission");
    let artifact = &submission.artifacts[0];
    assert_eq!(artifact.kind, ArtifactKind::Formula);
    assert_eq!(artifact.platform, Platform::GoogleSheets);
    assert_eq!(artifact.placement.sheet.as_deref(), Some("Data"));
    assert_eq!(artifact.placement.column.as_deref(), Some("C"));
    assert_eq!(artifact.content, "=ARRAYFORMULA(A2:A * B2:B)");
    assert_eq!(artifact.created_at, 100);
}

#[test]
fn acceptance_tests_get_ids_and_pass_expectation() {
    let outcome = parser().parse(&full_package(), 100);
    let submission = outcome.submission.expect("submission");
    let ids: Vec<&str> = submission
        .acceptance_tests
        .iter()
        .map(|test| test.id.as_str())
        .collect();
    assert_eq!(ids, ["t-1", "t-2", "t-3"]);
    assert!(submission
        .acceptance_tests
        .iter()
        .all(|test| test.expected == "pass"));
}

#[test]
fn fallback_and_deploy_notes_are_decomposed() {
    let outcome = parser().parse(&full_package(), 100);
    let submission = outcome.submission.expect("submission");

    let plan = &submission.fallback_plans[0];
    assert_eq!(plan.condition, "the formula shows a #REF! error");
    assert_eq!(plan.action, "restore the previous version from history");

    let notes = submission.deploy_notes.expect("deploy notes");
    assert_eq!(notes.protect_ranges, vec!["C2:C".to_string()]);
    assert_eq!(notes.naming_conventions, vec!["totals_".to_string()]);
    assert_eq!(notes.permissions, vec!["editors only".to_string()]);
}

#[test]
fn removing_fallback_reports_exactly_that_marker() {
    let text = full_package().replace("[FALLBACK]", "[SOMETHING_ELSE]");
    let outcome = parser().parse(&text, 100);
    assert!(!outcome.success);
    assert_eq!(outcome.missing_blocks, vec![MARKER_FALLBACK.to_string()]);
    assert!(outcome.submission.is_none());
}

#[test]
fn markers_are_case_insensitive_and_order_free() {
    let text = [
        "[deploy_notes]",
        "- permissions: owner",
        "[fallback]",
        "- if it breaks then roll back",
        "[acceptance_tests]",
        "1) a",
        "2) b",
        "3) c",
        "[artifacts]",
        "- type=formula target_cell=B2 content==A2*2",
        "[state]",
        "next_state=executed",
    ]
    .join("\n");
    let outcome = parser().parse(&text, 100);
    assert!(outcome.success);
    let submission = outcome.submission.expect("submission");
    assert_eq!(submission.proposed_stage, Stage::Executed);
    assert!(submission.next_action.is_none());
}

#[test]
fn unknown_stage_names_default_to_executed() {
    let text = full_package().replace("next_state=verified", "next_state=shipping");
    let outcome = parser().parse(&text, 100);
    let submission = outcome.submission.expect("submission");
    // current_state=executed still matches.
    assert_eq!(submission.proposed_stage, Stage::Executed);

    let text = full_package()
        .replace("current_state=executed", "current_state=later")
        .replace("next_state=verified", "next_state=whenever");
    let submission = parser().parse(&text, 100).submission.expect("submission");
    assert_eq!(submission.proposed_stage, Stage::Executed);
}

#[test]
fn unstructured_artifact_lines_fall_back_to_formula_scan() {
    let text = full_package().replace(
        "- type=FORMULA platform=google_sheets target_sheet=Data target_column=C content==ARRAYFORMULA(A2:A * B2:B)",
        "the totals live in =SUM(A2:A)",
    );
    let outcome = parser().parse(&text, 100);
    let submission = outcome.submission.expect("submission");
    assert_eq!(submission.artifacts.len(), 1);
    let artifact = &submission.artifacts[0];
    assert_eq!(artifact.kind, ArtifactKind::Formula);
    assert_eq!(artifact.platform, Platform::GoogleSheets);
    assert!(artifact.content.starts_with("=SUM(A2:A)"));
    assert!(artifact.placement.is_empty());
}

#[test]
fn junk_lines_never_panic_the_parser() {
    let outcome = parser().parse("", 100);
    assert!(!outcome.success);
    assert_eq!(outcome.missing_blocks.len(), 5);

    let text = "[STATE]\n===\n[ARTIFACTS]\n-\n[ACCEPTANCE_TESTS]\n?\n[FALLBACK]\n:\n[DEPLOY_NOTES]\n=";
    let outcome = parser().parse(text, 100);
    assert!(outcome.success);
    let submission = outcome.submission.expect("submission");
    assert!(submission.artifacts.is_empty());
    assert!(submission.acceptance_tests.is_empty());
    assert!(submission.fallback_plans.is_empty());
}
