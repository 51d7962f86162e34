use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::constants::{
    DEFAULT_BUILD_DIR, DEFAULT_COMPILER, DEFAULT_EXECUTABLE_NAME, DEFAULT_HARNESS,
    DEFAULT_HARNESS_ARGS, DEFAULT_OUTPUT_DIR, DEFAULT_PARAMETERS, DEFAULT_SAMPLE_INTERVAL_SECS,
    DEFAULT_SAMPLER, DEFAULT_SAMPLER_ARGS, DEFAULT_SOURCE_DIR, DISCOVERY_ATTEMPTS,
    DISCOVERY_INTERVAL_MS,
};
use crate::core::domain::{BuildConfig, DiscoveryPolicy, HarnessConfig, SamplerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "workload-profiler",
    version,
    about = "Build, run and profile a parameterized workload",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub profile: ProfileArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the workload, run it for every parameter and write reports (default)
    Profile(ProfileArgs),
    /// Plot every cpu_usage_<N>.log found in a directory
    PlotCpu(PlotCpuArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Parameter values to run the workload with
    #[arg(
        long = "params",
        visible_alias = "qubits",
        num_args = 1..,
        value_parser = clap::value_parser!(u32).range(1..),
        default_values_t = DEFAULT_PARAMETERS
    )]
    pub parameters: Vec<u32>,

    /// Build the parallel (OpenMP) variant of the workload
    #[arg(long)]
    pub parallel: bool,

    /// Use an already built workload instead of compiling one
    #[arg(long, env = "PROFILER_EXECUTABLE")]
    pub executable: Option<PathBuf>,

    #[arg(long, env = "PROFILER_CC", default_value = DEFAULT_COMPILER)]
    pub compiler: PathBuf,

    #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
    pub source_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_BUILD_DIR)]
    pub build_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    #[arg(long, env = "PROFILER_HARNESS", default_value = DEFAULT_HARNESS)]
    pub harness: PathBuf,

    /// Arguments placed before the workload path, split on whitespace
    #[arg(long, allow_hyphen_values = true, default_value = DEFAULT_HARNESS_ARGS)]
    pub harness_args: String,

    #[arg(long, env = "PROFILER_SAMPLER", default_value = DEFAULT_SAMPLER)]
    pub sampler: PathBuf,

    /// Sampler arguments; {pid} and {interval} are substituted
    #[arg(long, allow_hyphen_values = true, default_value = DEFAULT_SAMPLER_ARGS)]
    pub sampler_args: String,

    /// Seconds between CPU samples
    #[arg(
        long,
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = DEFAULT_SAMPLE_INTERVAL_SECS
    )]
    pub sample_interval: u64,

    /// Abort a run after this many seconds
    #[arg(long, env = "PROFILER_TIMEOUT")]
    pub timeout: Option<u64>,

    #[arg(long, default_value_t = DISCOVERY_ATTEMPTS)]
    pub discovery_attempts: u32,

    #[arg(long, default_value_t = DISCOVERY_INTERVAL_MS)]
    pub discovery_interval_ms: u64,

    /// Write reports for the runs that finished even if a later one failed
    #[arg(long)]
    pub report_partial: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PlotCpuArgs {
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub dir: PathBuf,

    /// Seconds between CPU samples in the logs
    #[arg(
        long,
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = DEFAULT_SAMPLE_INTERVAL_SECS
    )]
    pub sample_interval: u64,
}

/// Everything a profiling session needs, resolved from the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfilerConfig {
    pub parameters: Vec<u32>,
    pub build: BuildConfig,
    pub prebuilt_executable: Option<PathBuf>,
    pub harness: HarnessConfig,
    pub sampler: SamplerConfig,
    pub discovery: DiscoveryPolicy,
    pub timeout: Option<Duration>,
    pub output_dir: PathBuf,
    pub report_partial: bool,
}

fn split_args(args: &str) -> Vec<String> {
    args.split_whitespace().map(str::to_string).collect()
}

impl From<ProfileArgs> for ProfilerConfig {
    fn from(args: ProfileArgs) -> Self {
        let interval = Duration::from_secs(args.sample_interval);
        ProfilerConfig {
            parameters: args.parameters,
            build: BuildConfig {
                compiler: args.compiler,
                source_dir: args.source_dir,
                build_dir: args.build_dir,
                executable_name: DEFAULT_EXECUTABLE_NAME.to_string(),
                parallel: args.parallel,
            },
            prebuilt_executable: args.executable,
            harness: HarnessConfig {
                program: args.harness,
                args: split_args(&args.harness_args),
            },
            sampler: SamplerConfig {
                program: args.sampler,
                args: split_args(&args.sampler_args),
                interval,
                grace_period: interval + Duration::from_secs(1),
            },
            discovery: DiscoveryPolicy {
                attempts: args.discovery_attempts,
                interval: Duration::from_millis(args.discovery_interval_ms),
            },
            timeout: args.timeout.map(Duration::from_secs),
            output_dir: args.output_dir,
            report_partial: args.report_partial,
        }
    }
}
