use std::path::{Path, PathBuf};

use crate::cli::ProfilerConfig;
use crate::core::traits::builder::BuildError;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("required tool '{tool}' not found, please install it")]
    MissingTool { tool: String },
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Replaces the harness, sampler and (when building) compiler with their
/// absolute paths. Fails on the first tool that cannot be found.
#[tracing::instrument(skip(config))]
pub fn resolve_tools(config: &mut ProfilerConfig) -> Result<(), SetupError> {
    config.harness.program = resolve_tool(&config.harness.program)?;
    config.sampler.program = resolve_tool(&config.sampler.program)?;
    if config.prebuilt_executable.is_none() {
        config.build.compiler = resolve_tool(&config.build.compiler)?;
    }
    Ok(())
}

/// Names are looked up in `PATH`, paths with a directory component must
/// exist as given.
fn resolve_tool(tool: &Path) -> Result<PathBuf, SetupError> {
    let resolved = which::which(tool).map_err(|_| SetupError::MissingTool {
        tool: tool.display().to_string(),
    })?;
    tracing::debug!("Found {} at {}", tool.display(), resolved.display());
    Ok(resolved)
}
