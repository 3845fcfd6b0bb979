use sheetgate::engine::checklist::Checklist;
use sheetgate::engine::error::GateError;
use sheetgate::engine::run::{Run, Stage, TurnRole};

fn sample_run() -> Run {
    Run::new("run-1", "user-1", "task-1", 8, 100)
}

#[test]
fn direct_init_to_deployed_is_rejected_and_stage_is_unchanged() {
    let mut run = sample_run();
    let err = run.transition(Stage::Deployed, 101).expect_err("skip rejected");
    assert!(matches!(
        err,
        GateError::InvalidStageTransition {
            from: Stage::Init,
            to: Stage::Deployed
        }
    ));
    assert_eq!(run.stage, Stage::Init);
}

#[test]
fn forward_progression_moves_one_stage_at_a_time() {
    let mut run = sample_run();
    for target in [
        Stage::Analyzed,
        Stage::Designed,
        Stage::Executed,
        Stage::Verified,
        Stage::Deployed,
    ] {
        run.transition(target, 102).expect("forward hop");
        assert_eq!(run.stage, target);
    }
}

#[test]
fn backward_transitions_retreat_one_stage() {
    let mut run = sample_run();
    run.walk_to(Stage::Verified, 103).expect("walk forward");
    run.transition(Stage::Executed, 104).expect("retreat");
    assert_eq!(run.stage, Stage::Executed);
    run.transition(Stage::Designed, 105).expect("retreat");
    run.transition(Stage::Analyzed, 106).expect("retreat");
    run.transition(Stage::Init, 107).expect("retreat");
    assert_eq!(run.stage, Stage::Init);
}

#[test]
fn deployed_is_terminal() {
    let mut run = sample_run();
    run.walk_to(Stage::Deployed, 108).expect("walk to deployed");
    assert!(run.can_finish());
    for target in [Stage::Init, Stage::Executed, Stage::Verified] {
        assert!(run.transition(target, 109).is_err());
        assert_eq!(run.stage, Stage::Deployed);
    }
}

#[test]
fn walk_to_reaches_far_targets_through_legal_hops() {
    let mut run = sample_run();
    run.walk_to(Stage::Executed, 110).expect("walk");
    assert_eq!(run.stage, Stage::Executed);
    run.walk_to(Stage::Init, 111).expect("walk back");
    assert_eq!(run.stage, Stage::Init);
}

#[test]
fn regression_target_depends_on_executable_artifact() {
    let mut run = sample_run();
    run.checklist = Checklist::default();
    assert_eq!(run.next_stage_after_fail(), Stage::Designed);

    run.checklist.has_executable_artifact = true;
    assert_eq!(run.next_stage_after_fail(), Stage::Executed);
}

#[test]
fn can_finish_only_when_deployed() {
    let mut run = sample_run();
    assert!(!run.can_finish());
    run.walk_to(Stage::Verified, 112).expect("walk");
    assert!(!run.can_finish());
    run.transition(Stage::Deployed, 113).expect("deploy");
    assert!(run.can_finish());
}

#[test]
fn history_is_append_only_and_stamps_update_time() {
    let mut run = sample_run();
    run.push_history(TurnRole::User, "please build the totals column", 200);
    run.push_history(TurnRole::Model, "[STATE]...", 201);
    assert_eq!(run.history.len(), 2);
    assert_eq!(run.history[0].role, TurnRole::User);
    assert_eq!(run.history[1].at, 201);
    assert_eq!(run.updated_at, 201);
}

#[test]
fn stage_names_round_trip_through_parse() {
    for stage in [
        Stage::Init,
        Stage::Analyzed,
        Stage::Designed,
        Stage::Executed,
        Stage::Verified,
        Stage::Deployed,
    ] {
        assert_eq!(Stage::parse(stage.as_str()).expect("round trip"), stage);
    }
    assert!(Stage::parse("finished").is_err());
}
