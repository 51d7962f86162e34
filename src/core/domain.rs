use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct RunRequest {
    pub parameter: u32,
    pub executable_path: PathBuf,
    pub timeout: Option<Duration>,
}

/// Everything captured from one harness invocation, before parsing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawCapture {
    pub harness_stdout: String,
    pub harness_stderr: String,
    pub sampler_output: String,
    pub harness_exit_code: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    pub parameter: u32,
    pub peak_memory_mb: f64,
    pub user_time_sec: f64,
    pub execution_time_sec: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub sample_index: usize,
    pub cpu_percent: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleSeries {
    pub samples: Vec<Sample>,
}

impl SampleSeries {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn push(&mut self, cpu_percent: f64) {
        let sample_index = self.samples.len();
        self.samples.push(Sample {
            sample_index,
            cpu_percent,
        });
    }
}

pub type ResultSequence = Vec<RunResult>;

/// CPU samples of one successful run together with the sampler text they
/// were parsed from. The raw text is kept verbatim for the per-run log.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerLog {
    pub parameter: u32,
    pub series: SampleSeries,
    pub raw: String,
}

/// How the external timing harness is invoked. The workload executable and
/// its parameter are appended after `args`.
#[derive(Clone, Debug, PartialEq)]
pub struct HarnessConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// How the CPU sampler is invoked. `{pid}` and `{interval}` are substituted
/// in every argument.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub interval: Duration,
    pub grace_period: Duration,
}

impl SamplerConfig {
    pub fn render_args(&self, pid: u32) -> Vec<String> {
        let interval = self.interval.as_secs().max(1).to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{pid}", &pid.to_string())
                    .replace("{interval}", &interval)
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiscoveryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildConfig {
    pub compiler: PathBuf,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub executable_name: String,
    pub parallel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_series_indexes_in_push_order() {
        let mut series = SampleSeries::default();
        series.push(12.5);
        series.push(99.0);

        assert_eq!(series.len(), 2);
        assert_eq!(series.samples[0].sample_index, 0);
        assert_eq!(series.samples[1].sample_index, 1);
        assert_eq!(series.samples[1].cpu_percent, 99.0);
    }

    #[test]
    fn test_sampler_args_substitution() {
        let config = SamplerConfig {
            program: PathBuf::from("pidstat"),
            args: vec!["-p".to_string(), "{pid}".to_string(), "{interval}".to_string()],
            interval: Duration::from_secs(2),
            grace_period: Duration::from_secs(3),
        };

        assert_eq!(config.render_args(4242), vec!["-p", "4242", "2"]);
    }

    #[test]
    fn test_sampler_interval_never_renders_zero() {
        let config = SamplerConfig {
            program: PathBuf::from("pidstat"),
            args: vec!["{interval}".to_string()],
            interval: Duration::from_millis(200),
            grace_period: Duration::ZERO,
        };

        assert_eq!(config.render_args(1), vec!["1"]);
    }
}
