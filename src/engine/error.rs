use crate::engine::run::Stage;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("stage transition `{from}` -> `{to}` is invalid")]
    InvalidStageTransition { from: Stage, to: Stage },
    #[error("run `{run_id}` is already deployed and accepts no further turns")]
    RunFinished { run_id: String },
    #[error("run id generation failed: {0}")]
    RunId(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
