use std::path::PathBuf;

use crate::core::domain::BuildConfig;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    #[error("no C sources found in {dir}")]
    NoSources { dir: PathBuf },
    #[error("compilation failed:\n{stderr}")]
    CompilationFailed { stderr: String },
    #[error("compiler exited successfully but {path} was not created")]
    ExecutableMissing { path: PathBuf },
    #[error("internal build error: {msg}")]
    Internal { msg: String },
}

#[async_trait::async_trait]
pub trait Builder: std::fmt::Debug + Send + Sync {
    async fn build(&self, config: &BuildConfig) -> Result<PathBuf, BuildError>;
}
