use crate::config::EngineSettings;
use crate::engine::error::GateError;
use crate::engine::gate::CompletionGate;
use crate::engine::interceptors::{
    intercept_format, intercept_max_iterations, intercept_self_reference,
};
use crate::engine::parser::SubmissionParser;
use crate::engine::report::ValidationEngine;
use crate::engine::run::{Run, Stage, TurnRole};
use crate::shared::logging::{append_engine_log_line, engine_log_path};
use crate::shared::run_id::generate_run_id;
use crate::templates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const RUN_ID_MAX_GENERATION_ATTEMPTS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub allow_finish: bool,
    #[serde(default)]
    pub system_message: Option<String>,
    #[serde(default)]
    pub user_message: Option<String>,
}

impl TurnResult {
    fn retry(system_message: String) -> Self {
        Self {
            allow_finish: false,
            system_message: Some(system_message),
            user_message: None,
        }
    }

    fn hand_off(user_message: String) -> Self {
        Self {
            allow_finish: false,
            system_message: None,
            user_message: Some(user_message),
        }
    }

    fn finished(user_message: String) -> Self {
        Self {
            allow_finish: true,
            system_message: None,
            user_message: Some(user_message),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Controller {
    settings: EngineSettings,
    parser: SubmissionParser,
    validation_engine: ValidationEngine,
    gate: CompletionGate,
    issued_run_ids: BTreeSet<String>,
}

impl Controller {
    pub fn new(settings: EngineSettings) -> Self {
        let parser = SubmissionParser::new(settings.default_platform);
        let validation_engine = ValidationEngine::new(settings.min_acceptance_tests);
        let gate = CompletionGate::new(settings.min_acceptance_tests);
        Self {
            settings,
            parser,
            validation_engine,
            gate,
            issued_run_ids: BTreeSet::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn create_run(
        &mut self,
        user_id: &str,
        task_id: &str,
        now: i64,
    ) -> Result<Run, GateError> {
        for _ in 0..RUN_ID_MAX_GENERATION_ATTEMPTS {
            let run_id = generate_run_id(now).map_err(GateError::RunId)?;
            if self.issued_run_ids.insert(run_id.clone()) {
                return Ok(Run::new(
                    run_id,
                    user_id,
                    task_id,
                    self.settings.max_iterations,
                    now,
                ));
            }
        }
        Err(GateError::RunId(format!(
            "failed to allocate a unique run id after {RUN_ID_MAX_GENERATION_ATTEMPTS} attempts"
        )))
    }

    pub fn handle_user_message(&self, run: &mut Run, text: &str, now: i64) {
        run.push_history(TurnRole::User, text, now);
        run.iteration = run.iteration.saturating_add(1);
    }

    pub fn handle_model_output(
        &self,
        run: &mut Run,
        text: &str,
        now: i64,
    ) -> Result<TurnResult, GateError> {
        if run.stage.is_terminal() {
            return Err(GateError::RunFinished {
                run_id: run.run_id.clone(),
            });
        }

        run.push_history(TurnRole::Model, text, now);
        run.last_output = text.to_string();

        if let Some(user_message) = intercept_max_iterations(run) {
            self.log_decision(run, now, "iteration_budget_exhausted")?;
            run.push_history(TurnRole::Engine, &user_message, now);
            return Ok(TurnResult::hand_off(user_message));
        }

        let outcome = self.parser.parse(text, now);
        if let Some(system_message) = intercept_format(&outcome, self.settings.min_acceptance_tests)
        {
            self.log_decision(run, now, "format_retry")?;
            run.push_history(TurnRole::Engine, &system_message, now);
            return Ok(TurnResult::retry(system_message));
        }
        let Some(submission) = outcome.submission else {
            // Unreachable once the format interceptor passed; kept typed.
            let system_message = templates::format_retry_message(
                &outcome.missing_blocks,
                None,
                self.settings.min_acceptance_tests,
            );
            return Ok(TurnResult::retry(system_message));
        };

        let report = self.validation_engine.evaluate(&submission);
        if let Some(system_message) = intercept_self_reference(&report) {
            self.log_decision(run, now, "self_reference_redesign")?;
            run.push_history(TurnRole::Engine, &system_message, now);
            return Ok(TurnResult::retry(system_message));
        }

        let gate = self.gate.check(run, &submission, &report);
        run.artifacts = submission.artifacts.clone();
        run.checklist = gate.checklist;
        run.validations = report.validations().cloned().collect();
        run.validations.extend(gate.validations.iter().cloned());

        if gate.passed && report.all_passed {
            run.checklist.supports_auto_expand = true;
            run.checklist.avoids_self_reference = true;
            run.walk_to(Stage::Verified, now)?;
            run.transition(Stage::Deployed, now)?;
            let user_message = templates::success_summary(run, &submission);
            self.log_decision(run, now, "deployed")?;
            run.push_history(TurnRole::Engine, &user_message, now);
            return Ok(TurnResult::finished(user_message));
        }

        let target = run.next_stage_after_fail();
        run.walk_to(target, now)?;
        let system_message = templates::force_continue_message(&gate, &report, run.stage);
        self.log_decision(run, now, "force_continue")?;
        run.push_history(TurnRole::Engine, &system_message, now);
        Ok(TurnResult::retry(system_message))
    }

    pub fn run_summary(&self, run: &Run) -> String {
        let mut lines = vec![
            format!(
                "run {} task {} owner {}",
                run.run_id, run.task_id, run.user_id
            ),
            format!(
                "stage={} iteration={}/{}",
                run.stage, run.iteration, run.max_iterations
            ),
        ];
        for (label, done) in run.checklist.entries() {
            lines.push(format!("  [{}] {label}", if done { 'x' } else { ' ' }));
        }
        let mut passed = 0usize;
        let mut warned = 0usize;
        let mut failed = 0usize;
        for validation in &run.validations {
            match validation.status {
                crate::engine::rules::RuleStatus::Pass => passed += 1,
                crate::engine::rules::RuleStatus::Warn => warned += 1,
                crate::engine::rules::RuleStatus::Fail => failed += 1,
            }
        }
        lines.push(format!(
            "validations: {passed} passed, {warned} warned, {failed} failed"
        ));
        if let Some(last) = run.history.last() {
            lines.push(format!(
                "last message ({}) at {}",
                last.role,
                render_utc(last.at)
            ));
        }
        lines.join("\n")
    }

    fn log_decision(&self, run: &Run, now: i64, decision: &str) -> Result<(), GateError> {
        let Some(log_root) = self.settings.log_root.as_deref() else {
            return Ok(());
        };
        let line = format!(
            "ts={now} run_id={} stage={} iteration={} decision={decision}",
            run.run_id, run.stage, run.iteration
        );
        append_engine_log_line(log_root, &line).map_err(|source| GateError::Io {
            path: engine_log_path(log_root).display().to_string(),
            source,
        })
    }
}

fn render_utc(at: i64) -> String {
    chrono::DateTime::from_timestamp(at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%SZ").to_string())
        .unwrap_or_else(|| at.to_string())
}
