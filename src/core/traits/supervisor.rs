use crate::core::domain::{RawCapture, RunRequest};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunFailure {
    #[error("failed to start {program}: {msg}")]
    SpawnError { program: String, msg: String },
    #[error("harness exited with status {code}")]
    NonZeroExit { code: i32, stderr: String },
    #[error("run exceeded its time limit of {limit_ms} ms")]
    Timeout { limit_ms: u64 },
    #[error("internal error: {msg}")]
    Internal { msg: String },
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait Supervisor: std::fmt::Debug + Send + Sync {
    async fn execute(&self, request: &RunRequest) -> Result<RawCapture, RunFailure>;
}
