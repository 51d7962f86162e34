use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::{
    domain::{ResultSequence, RunRequest, SamplerLog},
    extractor::extract_run_result,
    traits::supervisor::{RunFailure, Supervisor},
};

#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkOutcome {
    pub results: ResultSequence,
    pub sampler_logs: Vec<SamplerLog>,
    /// The parameter that stopped the loop and why.
    pub failure: Option<(u32, RunFailure)>,
}

impl BenchmarkOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Runs the workload once per parameter, smallest first, and stops at the
/// first failed run.
///
/// Runs never overlap: the workload is expected to saturate the machine, so
/// timings from concurrent runs would be meaningless. Results collected
/// before a failure are kept and returned with it.
#[tracing::instrument(skip(supervisor, parameters))]
pub async fn run_all<I>(
    supervisor: &dyn Supervisor,
    executable_path: PathBuf,
    timeout: Option<Duration>,
    parameters: I,
) -> BenchmarkOutcome
where
    I: IntoIterator<Item = u32>,
{
    let parameters: BTreeSet<u32> = parameters.into_iter().collect();
    let mut outcome = BenchmarkOutcome {
        results: Vec::with_capacity(parameters.len()),
        sampler_logs: Vec::with_capacity(parameters.len()),
        failure: None,
    };

    for parameter in parameters {
        tracing::info!("Running benchmark for parameter {}", parameter);
        let request = RunRequest {
            parameter,
            executable_path: executable_path.clone(),
            timeout,
        };

        let extraction = match supervisor.execute(&request).await {
            Ok(raw) => extract_run_result(parameter, &raw).map(|extraction| (extraction, raw)),
            Err(failure) => Err(failure),
        };

        match extraction {
            Ok((extraction, raw)) => {
                for warning in &extraction.warnings {
                    tracing::warn!("Parameter {}: {}", parameter, warning);
                }
                tracing::info!(
                    "Parameter {}: time {:.2}s, peak RAM {:.2} MB",
                    parameter,
                    extraction.result.execution_time_sec,
                    extraction.result.peak_memory_mb
                );
                outcome.results.push(extraction.result);
                outcome.sampler_logs.push(SamplerLog {
                    parameter,
                    series: extraction.series,
                    raw: raw.sampler_output,
                });
            }
            Err(failure) => {
                tracing::error!("Benchmark failed for parameter {}: {}", parameter, failure);
                if let RunFailure::NonZeroExit { stderr, .. } = &failure {
                    tracing::error!("Harness stderr:\n{}", stderr);
                }
                outcome.failure = Some((parameter, failure));
                break;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{domain::RawCapture, traits::supervisor::MockSupervisor};

    fn capture(parameter: u32) -> RawCapture {
        RawCapture {
            harness_stdout: format!("Execution time: {}.5 seconds\n", parameter),
            harness_stderr: format!(
                "\tUser time (seconds): {}.25\n\tMaximum resident set size (kbytes): {}\n",
                parameter,
                parameter * 1024
            ),
            sampler_output: "10:00:00 UID PID %usr %system %guest %wait %CPU CPU Command\n\
                 10:00:01 1000 4242 99.00 1.00 0.00 0.00 100.00 1 qcs\n"
                .to_string(),
            harness_exit_code: 0,
        }
    }

    #[tokio::test]
    async fn test_parameters_run_in_ascending_order() {
        let mut supervisor = MockSupervisor::new();
        supervisor
            .expect_execute()
            .times(4)
            .returning(|request| Ok(capture(request.parameter)));

        let outcome = run_all(&supervisor, PathBuf::from("build/qcs"), None, [24, 18, 22, 20]).await;

        assert!(outcome.is_complete());
        let parameters: Vec<u32> = outcome.results.iter().map(|r| r.parameter).collect();
        assert_eq!(parameters, vec![18, 20, 22, 24]);

        assert_eq!(outcome.results[0].execution_time_sec, 18.5);
        assert_eq!(outcome.results[0].user_time_sec, 18.25);
        assert_eq!(outcome.results[0].peak_memory_mb, 18.0);
        assert_eq!(outcome.sampler_logs.len(), 4);
        assert_eq!(outcome.sampler_logs[3].parameter, 24);
        assert_eq!(outcome.sampler_logs[3].series.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_stops_loop_and_keeps_earlier_results() {
        let mut supervisor = MockSupervisor::new();
        supervisor
            .expect_execute()
            .withf(|request| request.parameter == 18)
            .times(1)
            .returning(|request| Ok(capture(request.parameter)));
        supervisor
            .expect_execute()
            .withf(|request| request.parameter == 20)
            .times(1)
            .returning(|_| {
                Err(RunFailure::NonZeroExit {
                    code: 137,
                    stderr: "Command terminated by signal 9".to_string(),
                })
            });
        supervisor
            .expect_execute()
            .withf(|request| request.parameter == 22)
            .never();

        let outcome = run_all(&supervisor, PathBuf::from("build/qcs"), None, vec![18, 20, 22]).await;

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].parameter, 18);
        assert!(matches!(
            outcome.failure,
            Some((20, RunFailure::NonZeroExit { code: 137, .. }))
        ));
    }

    #[tokio::test]
    async fn test_request_carries_executable_and_timeout() {
        let mut supervisor = MockSupervisor::new();
        supervisor
            .expect_execute()
            .withf(|request| {
                request.executable_path == PathBuf::from("/opt/qcs")
                    && request.timeout == Some(Duration::from_secs(60))
            })
            .times(1)
            .returning(|request| Ok(capture(request.parameter)));

        let outcome = run_all(
            &supervisor,
            PathBuf::from("/opt/qcs"),
            Some(Duration::from_secs(60)),
            [18],
        )
        .await;

        assert!(outcome.is_complete());
    }

    #[tokio::test]
    async fn test_duplicate_parameters_run_once() {
        let mut supervisor = MockSupervisor::new();
        supervisor
            .expect_execute()
            .times(2)
            .returning(|request| Ok(capture(request.parameter)));

        let outcome = run_all(&supervisor, PathBuf::from("build/qcs"), None, [20, 18, 20]).await;

        let parameters: Vec<u32> = outcome.results.iter().map(|r| r.parameter).collect();
        assert_eq!(parameters, vec![18, 20]);
    }

    #[tokio::test]
    async fn test_first_run_failure_yields_empty_results() {
        let mut supervisor = MockSupervisor::new();
        supervisor.expect_execute().times(1).returning(|_| {
            Err(RunFailure::Timeout { limit_ms: 1000 })
        });

        let outcome = run_all(&supervisor, PathBuf::from("build/qcs"), None, [18, 20]).await;

        assert!(outcome.results.is_empty());
        assert!(outcome.sampler_logs.is_empty());
        assert_eq!(outcome.failure, Some((18, RunFailure::Timeout { limit_ms: 1000 })));
    }

    #[tokio::test]
    async fn test_parse_warnings_do_not_fail_run() {
        let mut supervisor = MockSupervisor::new();
        supervisor.expect_execute().times(1).returning(|_| {
            Ok(RawCapture {
                harness_stdout: "no marker\n".to_string(),
                harness_stderr: "\tUser time (seconds): 0.75\n".to_string(),
                sampler_output: String::new(),
                harness_exit_code: 0,
            })
        });

        let outcome = run_all(&supervisor, PathBuf::from("build/qcs"), None, [18]).await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.results[0].peak_memory_mb, 0.0);
        assert_eq!(outcome.results[0].execution_time_sec, 0.75);
        assert!(outcome.sampler_logs[0].series.is_empty());
    }

    #[tokio::test]
    async fn test_non_zero_capture_is_not_recorded() {
        let mut supervisor = MockSupervisor::new();
        supervisor.expect_execute().times(1).returning(|request| {
            let mut raw = capture(request.parameter);
            raw.harness_exit_code = 2;
            Ok(raw)
        });

        let outcome = run_all(&supervisor, PathBuf::from("build/qcs"), None, [18, 20]).await;

        assert!(outcome.results.is_empty());
        assert!(matches!(
            outcome.failure,
            Some((18, RunFailure::NonZeroExit { code: 2, .. }))
        ));
    }
}
