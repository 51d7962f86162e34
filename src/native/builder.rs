use std::path::PathBuf;
use std::process::Stdio;

use itertools::Itertools;
use tokio::{fs, process::Command};

use crate::core::{
    domain::BuildConfig,
    traits::builder::{BuildError, Builder},
};

/// Compiles every C source of the workload into a single executable.
#[derive(Clone, Debug, Default)]
pub struct GccBuilder;

impl GccBuilder {
    pub fn new() -> Self {
        GccBuilder
    }

    async fn collect_sources(&self, config: &BuildConfig) -> Result<Vec<PathBuf>, BuildError> {
        let mut entries = fs::read_dir(&config.source_dir)
            .await
            .map_err(|e| BuildError::Internal {
                msg: format!("Failed to read {}: {}", config.source_dir.display(), e),
            })?;

        let mut sources = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BuildError::Internal { msg: e.to_string() })?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "c") {
                sources.push(path);
            }
        }

        if sources.is_empty() {
            return Err(BuildError::NoSources {
                dir: config.source_dir.clone(),
            });
        }
        sources.sort();
        Ok(sources)
    }
}

#[async_trait::async_trait]
impl Builder for GccBuilder {
    #[tracing::instrument(skip(self))]
    async fn build(&self, config: &BuildConfig) -> Result<PathBuf, BuildError> {
        let sources = self.collect_sources(config).await?;
        let executable_path = config.build_dir.join(&config.executable_name);

        fs::create_dir_all(&config.build_dir)
            .await
            .map_err(|e| BuildError::Internal { msg: e.to_string() })?;

        let mut cmd = Command::new(&config.compiler);
        cmd.args(["-std=c89", "-g", "-O3", "-o"])
            .arg(&executable_path)
            .args(&sources)
            .arg("-lm");
        if config.parallel {
            cmd.arg("-fopenmp");
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        tracing::info!(
            "Compiling {} sources (parallel={}): {}",
            sources.len(),
            config.parallel,
            sources.iter().map(|p| p.display()).join(" ")
        );

        let out = cmd
            .output()
            .await
            .map_err(|e| BuildError::Internal {
                msg: format!("Failed to execute {}: {}", config.compiler.display(), e),
            })?;

        if !out.status.success() {
            return Err(BuildError::CompilationFailed {
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            });
        }

        if !fs::try_exists(&executable_path).await.unwrap_or(false) {
            return Err(BuildError::ExecutableMissing {
                path: executable_path,
            });
        }

        tracing::info!("Built {}", executable_path.display());
        Ok(executable_path)
    }
}
