use crate::engine::checklist::Checklist;
use crate::engine::error::GateError;
use crate::engine::rules::Validation;
use crate::engine::submission::Artifact;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    Analyzed,
    Designed,
    Executed,
    Verified,
    Deployed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Analyzed => "analyzed",
            Self::Designed => "designed",
            Self::Executed => "executed",
            Self::Verified => "verified",
            Self::Deployed => "deployed",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "init" => Ok(Self::Init),
            "analyzed" => Ok(Self::Analyzed),
            "designed" => Ok(Self::Designed),
            "executed" => Ok(Self::Executed),
            "verified" => Ok(Self::Verified),
            "deployed" => Ok(Self::Deployed),
            _ => Err(
                "stage must be one of: init, analyzed, designed, executed, verified, deployed"
                    .to_string(),
            ),
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Stage::Init, Stage::Analyzed)
                | (Stage::Analyzed, Stage::Designed)
                | (Stage::Designed, Stage::Executed)
                | (Stage::Executed, Stage::Verified)
                | (Stage::Verified, Stage::Deployed)
                | (Stage::Analyzed, Stage::Init)
                | (Stage::Designed, Stage::Analyzed)
                | (Stage::Executed, Stage::Designed)
                | (Stage::Verified, Stage::Executed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Deployed)
    }

    fn order(self) -> u8 {
        match self {
            Self::Init => 0,
            Self::Analyzed => 1,
            Self::Designed => 2,
            Self::Executed => 3,
            Self::Verified => 4,
            Self::Deployed => 5,
        }
    }

    fn next_forward(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::Analyzed),
            Self::Analyzed => Some(Self::Designed),
            Self::Designed => Some(Self::Executed),
            Self::Executed => Some(Self::Verified),
            Self::Verified => Some(Self::Deployed),
            Self::Deployed => None,
        }
    }

    fn next_backward(self) -> Option<Self> {
        match self {
            Self::Init => None,
            Self::Analyzed => Some(Self::Init),
            Self::Designed => Some(Self::Analyzed),
            Self::Executed => Some(Self::Designed),
            Self::Verified => Some(Self::Executed),
            Self::Deployed => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Model,
    Engine,
}

impl TurnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
            Self::Engine => "engine",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMessage {
    pub role: TurnRole,
    pub content: String,
    pub at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub run_id: String,
    pub user_id: String,
    pub task_id: String,
    pub stage: Stage,
    pub iteration: u32,
    pub max_iterations: u32,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub checklist: Checklist,
    #[serde(default)]
    pub validations: Vec<Validation>,
    #[serde(default)]
    pub last_output: String,
    #[serde(default)]
    pub history: Vec<TurnMessage>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Run {
    pub fn new(
        run_id: impl Into<String>,
        user_id: impl Into<String>,
        task_id: impl Into<String>,
        max_iterations: u32,
        now: i64,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            user_id: user_id.into(),
            task_id: task_id.into(),
            stage: Stage::Init,
            iteration: 0,
            max_iterations,
            artifacts: Vec::new(),
            checklist: Checklist::default(),
            validations: Vec::new(),
            last_output: String::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push_history(&mut self, role: TurnRole, content: impl Into<String>, now: i64) {
        self.history.push(TurnMessage {
            role,
            content: content.into(),
            at: now,
        });
        self.updated_at = now;
    }

    pub fn transition(&mut self, target: Stage, now: i64) -> Result<(), GateError> {
        if !self.stage.can_transition_to(target) {
            return Err(GateError::InvalidStageTransition {
                from: self.stage,
                to: target,
            });
        }
        self.stage = target;
        self.updated_at = now;
        Ok(())
    }

    // Reaches `target` through single legal hops; never skips a stage.
    pub fn walk_to(&mut self, target: Stage, now: i64) -> Result<(), GateError> {
        while self.stage != target {
            let next = if self.stage.order() < target.order() {
                self.stage.next_forward()
            } else {
                self.stage.next_backward()
            };
            let Some(next) = next else {
                return Err(GateError::InvalidStageTransition {
                    from: self.stage,
                    to: target,
                });
            };
            self.transition(next, now)?;
        }
        Ok(())
    }

    pub fn next_stage_after_fail(&self) -> Stage {
        if !self.checklist.has_executable_artifact {
            Stage::Designed
        } else {
            Stage::Executed
        }
    }

    pub fn can_finish(&self) -> bool {
        self.stage == Stage::Deployed
    }
}
