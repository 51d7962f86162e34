use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::core::{
    discovery::discover,
    domain::{DiscoveryPolicy, HarnessConfig, RawCapture, RunRequest, SamplerConfig},
    traits::{
        process_tree::ProcessTree,
        supervisor::{RunFailure, Supervisor},
    },
};

type Drain = JoinHandle<std::io::Result<String>>;

/// Runs the workload under the timing harness with a CPU sampler attached
/// to the discovered worker process.
#[derive(Debug)]
pub struct TimedSupervisor {
    harness: HarnessConfig,
    sampler: SamplerConfig,
    discovery: DiscoveryPolicy,
    process_tree: Arc<dyn ProcessTree>,
}

impl TimedSupervisor {
    pub fn new(
        harness: HarnessConfig,
        sampler: SamplerConfig,
        discovery: DiscoveryPolicy,
        process_tree: Arc<dyn ProcessTree>,
    ) -> Self {
        TimedSupervisor {
            harness,
            sampler,
            discovery,
            process_tree,
        }
    }

    fn spawn_harness(&self, request: &RunRequest) -> Result<Child, RunFailure> {
        Command::new(&self.harness.program)
            .args(&self.harness.args)
            .arg(&request.executable_path)
            .arg(request.parameter.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.harness.program, e))
    }

    fn spawn_sampler(&self, worker_pid: u32) -> Result<Child, RunFailure> {
        Command::new(&self.sampler.program)
            .args(self.sampler.render_args(worker_pid))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.sampler.program, e))
    }

    /// Discovers the worker, attaches the sampler to it and waits for the run.
    async fn attach_and_collect(
        &self,
        run: &mut ActiveRun,
        harness_pid: u32,
    ) -> Result<RawCapture, RunFailure> {
        let harness = &mut run.harness;
        let worker_pid = discover(self.process_tree.as_ref(), harness_pid, &self.discovery, || {
            matches!(harness.try_wait(), Ok(None))
        })
        .await;
        tracing::debug!("Harness pid={}, worker pid={}", harness_pid, worker_pid);
        run.worker = WorkerGuard::new(self.process_tree.clone(), harness_pid, worker_pid);

        let mut sampler = self.spawn_sampler(worker_pid)?;
        run.sampler_stdout = Some(drain(sampler.stdout.take()));
        run.sampler = Some(sampler);

        run.collect(self.sampler.grace_period).await
    }
}

#[async_trait::async_trait]
impl Supervisor for TimedSupervisor {
    #[tracing::instrument(skip(self), fields(parameter = request.parameter))]
    async fn execute(&self, request: &RunRequest) -> Result<RawCapture, RunFailure> {
        if !request.executable_path.is_file() {
            return Err(RunFailure::SpawnError {
                program: request.executable_path.display().to_string(),
                msg: "workload executable not found".to_string(),
            });
        }

        let mut harness = self.spawn_harness(request)?;
        let Some(harness_pid) = harness.id() else {
            let _ = harness.kill().await;
            return Err(RunFailure::Internal {
                msg: "harness exited before its pid could be read".to_string(),
            });
        };
        // Drain before discovery so a chatty harness cannot block on a full pipe.
        let harness_stdout = drain(harness.stdout.take());
        let harness_stderr = drain(harness.stderr.take());

        let mut run = ActiveRun {
            harness,
            sampler: None,
            harness_stdout,
            harness_stderr,
            sampler_stdout: None,
            worker: WorkerGuard::new(self.process_tree.clone(), harness_pid, harness_pid),
            process_tree: self.process_tree.clone(),
        };

        let result = match request.timeout {
            Some(limit) => match timeout(limit, self.attach_and_collect(&mut run, harness_pid)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("Run exceeded {:?}, terminating", limit);
                    Err(RunFailure::Timeout {
                        limit_ms: limit.as_millis() as u64,
                    })
                }
            },
            None => self.attach_and_collect(&mut run, harness_pid).await,
        };

        if result.is_err() {
            run.shutdown().await;
        }
        result
    }
}

/// Processes and pipe readers belonging to one run in flight.
struct ActiveRun {
    harness: Child,
    sampler: Option<Child>,
    harness_stdout: Drain,
    harness_stderr: Drain,
    sampler_stdout: Option<Drain>,
    worker: WorkerGuard,
    process_tree: Arc<dyn ProcessTree>,
}

impl ActiveRun {
    async fn collect(&mut self, grace_period: Duration) -> Result<RawCapture, RunFailure> {
        let status = self.harness.wait().await.map_err(|e| RunFailure::Internal {
            msg: format!("failed to wait for harness: {}", e),
        })?;
        // The harness reaps its child before exiting.
        self.worker.disarm();
        let harness_exit_code = status.code().unwrap_or(-1);
        tracing::debug!("Harness exited: {}", status);

        if let Some(sampler) = self.sampler.as_mut() {
            stop_sampler(sampler, self.process_tree.as_ref(), grace_period).await;
        }

        let (harness_stdout, harness_stderr, sampler_output) = futures::try_join!(
            join_drain(&mut self.harness_stdout, "harness stdout"),
            join_drain(&mut self.harness_stderr, "harness stderr"),
            join_optional_drain(self.sampler_stdout.as_mut(), "sampler stdout"),
        )?;

        if harness_exit_code != 0 {
            return Err(RunFailure::NonZeroExit {
                code: harness_exit_code,
                stderr: harness_stderr,
            });
        }

        Ok(RawCapture {
            harness_stdout,
            harness_stderr,
            sampler_output,
            harness_exit_code,
        })
    }

    /// Kills and reaps everything still running and unblocks the readers.
    async fn shutdown(&mut self) {
        if let Err(e) = self.harness.kill().await {
            tracing::debug!("Harness already gone: {}", e);
        }
        self.worker.terminate();
        if let Some(sampler) = self.sampler.as_mut() {
            if let Err(e) = sampler.kill().await {
                tracing::debug!("Sampler already gone: {}", e);
            }
        }
        self.abort_drains();
    }

    fn abort_drains(&self) {
        self.harness_stdout.abort();
        self.harness_stderr.abort();
        if let Some(drain) = &self.sampler_stdout {
            drain.abort();
        }
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        // Children are kill_on_drop; the worker is handled by its guard.
        self.abort_drains();
    }
}

/// Kills the discovered worker unless the harness was seen to exit first.
/// The harness is killed through its `Child`, so the guard only covers a
/// worker that is a separate process.
struct WorkerGuard {
    process_tree: Arc<dyn ProcessTree>,
    worker_pid: u32,
    armed: bool,
}

impl WorkerGuard {
    fn new(process_tree: Arc<dyn ProcessTree>, harness_pid: u32, worker_pid: u32) -> Self {
        WorkerGuard {
            process_tree,
            worker_pid,
            armed: worker_pid != harness_pid,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    fn terminate(&mut self) {
        if self.armed {
            if !self.process_tree.terminate(self.worker_pid) {
                tracing::debug!("Worker {} already gone", self.worker_pid);
            }
            self.armed = false;
        }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn spawn_error(program: &Path, e: std::io::Error) -> RunFailure {
    RunFailure::SpawnError {
        program: program.display().to_string(),
        msg: e.to_string(),
    }
}

fn drain<R>(pipe: Option<R>) -> Drain
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

async fn join_drain(handle: &mut Drain, stream: &str) -> Result<String, RunFailure> {
    match handle.await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(RunFailure::Internal {
            msg: format!("failed to read {}: {}", stream, e),
        }),
        Err(e) => Err(RunFailure::Internal {
            msg: format!("{} reader stopped: {}", stream, e),
        }),
    }
}

async fn join_optional_drain(handle: Option<&mut Drain>, stream: &str) -> Result<String, RunFailure> {
    match handle {
        Some(handle) => join_drain(handle, stream).await,
        None => Ok(String::new()),
    }
}

/// Lets the sampler flush its last rows, then makes sure it is gone.
async fn stop_sampler(sampler: &mut Child, process_tree: &dyn ProcessTree, grace_period: Duration) {
    if let Some(pid) = sampler.id() {
        process_tree.interrupt(pid);
    }
    match timeout(grace_period, sampler.wait()).await {
        Ok(Ok(status)) => tracing::debug!("Sampler exited: {}", status),
        Ok(Err(e)) => tracing::warn!("Failed to wait for sampler: {}", e),
        Err(_) => {
            tracing::debug!("Sampler still running after {:?}, killing it", grace_period);
            if let Err(e) = sampler.kill().await {
                tracing::warn!("Failed to kill sampler: {}", e);
            }
        }
    }
}
